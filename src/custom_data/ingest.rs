//! Translation of raw property bags into bag and attribute slots.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::protected;
use crate::erx::{Erx, Fault, ResultE};
use crate::resource::Resource;
use crate::store::Properties;
use crate::tools::datetime::Format;

/// Where one ingested property lands.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// server stamp, canonical name, goes to the bag and the attributes
    Timestamp { key: String, at: DateTime<FixedOffset> },
    /// other server managed field, canonical name, attributes only
    Server { key: String, value: Value },
    /// caller data, name as sent, bag only and never over an existing key
    Ordinary { key: String, value: Value },
}

/// Translate every property, failing as a whole when one stamp does not parse.
pub fn translate<R: Resource + ?Sized>(resource: &R, properties: &Properties) -> ResultE<Vec<Slot>> {
    properties
        .iter()
        .map(|(key, value)| -> ResultE<Slot> {
            let canonical = resource.canonicalize(key);
            if !protected::is_readonly(&canonical) {
                return Ok(Slot::Ordinary { key: key.clone(), value: value.clone() });
            }

            if protected::is_timestamp(&canonical) {
                let raw = value
                    .as_str()
                    .ok_or_else(|| Erx::with_fault(Fault::Malformed, &format!("'{}' is not a timestamp string", key)))?;
                let at = Format::parse_any(raw).map_err(|e| e.extra_with("KEY", key))?;
                return Ok(Slot::Timestamp { key: canonical, at });
            }

            Ok(Slot::Server { key: canonical, value: value.clone() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Identity;
    use serde_json::json;

    #[test]
    fn test_translate_routes_by_canonical_form() {
        let properties = json!({
            "href": "https://api.example.com/v1/accounts/a1/customData",
            "createdAt": "2014-09-11T22:36:44.349Z",
            "spHttpStatus": 200,
            "favoriteColor": "red"
        });
        let slots = translate(&Identity::unsaved(), properties.as_object().unwrap()).unwrap();

        assert_eq!(slots.len(), 4);
        assert!(matches!(&slots[0], Slot::Server { key, .. } if key == "href"));
        assert!(matches!(&slots[1], Slot::Timestamp { key, .. } if key == "created_at"));
        assert!(matches!(&slots[2], Slot::Server { key, value } if key == "sp_http_status" && *value == json!(200)));
        assert!(matches!(&slots[3], Slot::Ordinary { key, .. } if key == "favoriteColor"));
    }

    #[test]
    fn test_translate_rejects_bad_stamp() {
        let properties = json!({"color": "red", "modifiedAt": 17});
        let err = translate(&Identity::unsaved(), properties.as_object().unwrap()).unwrap_err();
        assert_eq!(err.fault(), Fault::Malformed);

        let properties = json!({"modified_at": "not a date"});
        let err = translate(&Identity::unsaved(), properties.as_object().unwrap()).unwrap_err();
        assert_eq!(err.extra_val("KEY").as_deref(), Some("modified_at"));
    }
}
