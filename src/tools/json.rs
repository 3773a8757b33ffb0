use crate::erx::{Erx, Fault, ResultE};
use serde::Serialize;
use serde_json::{Map, Value};

pub struct Enc;
pub struct Dec;

impl Enc {
    /// lossy, for log lines
    pub fn ens<T: Serialize>(obj: &T) -> String {
        serde_json::to_string(obj).unwrap_or_default()
    }
}

impl Dec {
    /// decode a JSON object, an empty body is an empty object
    pub fn object(json: &str) -> ResultE<Map<String, Value>> {
        if json.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_json::from_str(json).map_err(|e| Erx::with_fault(Fault::Malformed, &format!("invalid json body : {}", e)))?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(Erx::with_fault(Fault::Malformed, &format!("expected a json object, got {}", Enc::ens(&other)))),
        }
    }
}
