// Don't change this value, it will be replaced by the version
pub static VERSION: &'static str = "0.1.0";

pub mod conf;
pub mod custom_data;
pub mod erx;
pub mod log;
pub mod prelude;
pub mod resource;
pub mod store;
pub mod tools;

pub use prelude::*;
