pub use crate::custom_data::{CustomData, Field};
pub use crate::erx::{Erx, Fault, ResultE, ResultEX};
pub use crate::resource::{Identity, Resource};
pub use crate::store::{HttpStore, MemoryStore, Properties, Removal, RemoteStore};
