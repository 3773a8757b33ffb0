//! Remote side of the custom data protocol.
//!
//! The proxy only ever talks to a [`RemoteStore`]: fetch a whole property bag,
//! upsert (server side partial merge) a bag, delete one reference. A reference is
//! either the custom data resource itself or one of its per-key children.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::erx::ResultE;

pub mod http;
pub mod memory;

pub use http::HttpStore;
pub use memory::{Call, MemoryStore};

/// Raw JSON property bag as sent and received over the wire.
pub type Properties = Map<String, Value>;

/// Outcome of a delete the server did not reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    NotFound,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// full property bag behind `href`
    async fn fetch(&self, href: &str) -> ResultE<Properties>;

    /// merge `properties` into the bag behind `href`, returns the merged bag
    async fn upsert(&self, href: &str, properties: &Properties) -> ResultE<Properties>;

    /// delete the resource or key addressed by `href`
    async fn delete(&self, href: &str) -> ResultE<Removal>;
}
