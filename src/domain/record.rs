//! Record field access.
//!
//! Records are opaque to the tree. Everything the tree needs (primary key,
//! parent key, value and label fields) is read through [`Fields`].

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A scalar field value usable as a map key or a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl FieldValue {
    /// Parse a command line token: integers stay integers, anything else is a string.
    pub fn parse_key(raw: &str) -> Self {
        FieldValue::Str(raw.to_string()).into_key()
    }

    /// Form used for key matching: a string holding a canonical decimal
    /// integer (`"12"`, `"-3"`, not `"012"` or `"+3"`) becomes that integer.
    ///
    /// Record exports often mix `"id": "7"` with `"parent_id": 7`; both must
    /// resolve to the same node.
    pub fn into_key(self) -> Self {
        match self {
            FieldValue::Str(s) => match s.parse::<i64>() {
                Ok(i) if i.to_string() == s => FieldValue::Int(i),
                _ => FieldValue::Str(s),
            },
            other => other,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

/// Named field access on a record.
///
/// Returns `None` when the field is absent or null. Key and parent-key
/// values are passed through [`FieldValue::into_key`] before matching.
pub trait Fields {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl Fields for Map<String, Value> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).and_then(json_to_field)
    }
}

impl Fields for Value {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.as_object().and_then(|obj| obj.field(name))
    }
}

impl<S: BuildHasher> Fields for HashMap<String, FieldValue, S> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned()
    }
}

const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

fn json_to_field(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(FieldValue::Bool(*b)),
        Value::Number(n) => Some(match n.as_i64() {
            Some(i) => FieldValue::Int(i),
            // integral floats such as 3.0 are ids exported by loose serializers
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_F64 => {
                    FieldValue::Int(f as i64)
                }
                _ => FieldValue::Str(n.to_string()),
            },
        }),
        Value::String(s) => Some(FieldValue::Str(s.clone())),
        // nested structures are rendered, not interpreted
        other => Some(FieldValue::Str(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_json_object_when_reading_fields_then_maps_scalars() {
        let record = json!({"id": 7, "parent_id": null, "title": "Books", "flag": true, "w": 1.5});

        assert_eq!(record.field("id"), Some(FieldValue::Int(7)));
        assert_eq!(record.field("parent_id"), None);
        assert_eq!(record.field("missing"), None);
        assert_eq!(record.field("title"), Some(FieldValue::from("Books")));
        assert_eq!(record.field("flag"), Some(FieldValue::Bool(true)));
        assert_eq!(record.field("w"), Some(FieldValue::Str("1.5".into())));
    }

    #[test]
    fn given_integral_float_when_reading_fields_then_integer() {
        let record = json!({"id": 3.0, "big": 1e300});
        assert_eq!(record.field("id"), Some(FieldValue::Int(3)));
        assert_eq!(record.field("big"), Some(FieldValue::Str("1e300".into())));
    }

    #[test]
    fn given_numeric_strings_when_normalising_keys_then_only_canonical_become_integers() {
        assert_eq!(FieldValue::from("7").into_key(), FieldValue::Int(7));
        assert_eq!(FieldValue::from("-7").into_key(), FieldValue::Int(-7));
        assert_eq!(FieldValue::from("07").into_key(), FieldValue::from("07"));
        assert_eq!(FieldValue::from("+7").into_key(), FieldValue::from("+7"));
        assert_eq!(FieldValue::from("x").into_key(), FieldValue::from("x"));
        assert_eq!(FieldValue::Bool(true).into_key(), FieldValue::Bool(true));
    }

    #[test]
    fn given_non_object_json_when_reading_fields_then_none() {
        assert_eq!(json!([1, 2]).field("id"), None);
    }

    #[test]
    fn given_cli_token_when_parse_key_then_prefers_integer() {
        assert_eq!(FieldValue::parse_key("42"), FieldValue::Int(42));
        assert_eq!(FieldValue::parse_key("-3"), FieldValue::Int(-3));
        assert_eq!(FieldValue::parse_key("abc"), FieldValue::from("abc"));
    }

    #[test]
    fn given_field_value_when_serialized_then_untagged() {
        let out = serde_json::to_string(&vec![FieldValue::Int(1), FieldValue::from("x")]).unwrap();
        assert_eq!(out, r#"[1,"x"]"#);
    }
}
