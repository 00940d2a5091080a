//! Projection between the BSON value model and `serde_json::Value`.
//!
//! JSON cannot natively carry binary data, so bytes cross as
//! `data:application/octet-stream;base64,…` URI strings and come back as
//! binary when the prefix is recognized. The projection is lossy for the
//! sentinel types: `Undefined`, `MinKey` and `MaxKey` all project to JSON
//! null.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value as JsonValue};

use crate::values::{BsonBinary, BsonValue, BINARY_SUBTYPE_GENERIC};

const BIN_URI_START: &str = "data:application/octet-stream;base64,";

/// Converts a BSON value tree into JSON.
pub fn to_json(value: &BsonValue) -> JsonValue {
    match value {
        BsonValue::Float(f) => serde_json::json!(f),
        BsonValue::Str(s) => JsonValue::String(s.clone()),
        BsonValue::Document(fields) => {
            let mut map = Map::new();
            for (k, v) in fields {
                map.insert(k.clone(), to_json(v));
            }
            JsonValue::Object(map)
        }
        BsonValue::Array(items) => JsonValue::Array(items.iter().map(to_json).collect()),
        BsonValue::Binary(bin) => {
            JsonValue::String(format!("{BIN_URI_START}{}", BASE64.encode(&bin.data)))
        }
        BsonValue::Uuid(u) => JsonValue::String(u.to_string()),
        BsonValue::Boolean(b) => JsonValue::Bool(*b),
        BsonValue::DateTime(ms) => serde_json::json!(ms),
        BsonValue::Integer(v) | BsonValue::Int64(v) => serde_json::json!(v),
        BsonValue::Int32(v) => serde_json::json!(v),
        BsonValue::UInt64(v) => serde_json::json!(v),
        BsonValue::Null | BsonValue::Undefined | BsonValue::MinKey | BsonValue::MaxKey => {
            JsonValue::Null
        }
    }
}

/// Converts a JSON value tree into the BSON value model. Strings carrying
/// the binary data URI prefix are restored to generic-subtype binary.
pub fn from_json(value: &JsonValue) -> BsonValue {
    match value {
        JsonValue::Null => BsonValue::Null,
        JsonValue::Bool(b) => BsonValue::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                BsonValue::Integer(i)
            } else if let Some(u) = n.as_u64() {
                BsonValue::UInt64(u)
            } else {
                BsonValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        JsonValue::String(s) => match s.strip_prefix(BIN_URI_START) {
            Some(b64) => match BASE64.decode(b64) {
                Ok(data) => BsonValue::Binary(BsonBinary {
                    subtype: BINARY_SUBTYPE_GENERIC,
                    data,
                }),
                Err(_) => BsonValue::Str(s.clone()),
            },
            None => BsonValue::Str(s.clone()),
        },
        JsonValue::Array(items) => BsonValue::Array(items.iter().map(from_json).collect()),
        JsonValue::Object(map) => {
            BsonValue::Document(map.iter().map(|(k, v)| (k.clone(), from_json(v))).collect())
        }
    }
}
