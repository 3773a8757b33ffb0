use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;

use crate::tools::datetime::Format;

/// Value held by a custom data bag.
///
/// Server stamps are parsed into [`Field::Timestamp`], everything else keeps its
/// JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Json(Value),
    Timestamp(DateTime<FixedOffset>),
}

impl Field {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Field::Json(value) => Some(value),
            Field::Timestamp(_) => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Field::Timestamp(at) => Some(at),
            Field::Json(_) => None,
        }
    }

    /// wire form, stamps rendered the way the server sends them
    pub fn to_json(&self) -> Value {
        match self {
            Field::Json(value) => value.clone(),
            Field::Timestamp(at) => Value::String(Format::render(at)),
        }
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Json(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Json(Value::String(value.to_string()))
    }
}

impl From<DateTime<FixedOffset>> for Field {
    fn from(at: DateTime<FixedOffset>) -> Self {
        Field::Timestamp(at)
    }
}

impl PartialEq<Value> for Field {
    fn eq(&self, other: &Value) -> bool {
        self.as_json() == Some(other)
    }
}
