pub mod datetime;
pub mod httpclient;
pub mod json;
pub mod strings;
pub mod tests;
pub mod url;
