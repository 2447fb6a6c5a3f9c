//! Firestore's typed JSON value encoding.
//!
//! Firestore REST bodies wrap every field in a one-key object naming its type
//! (`{"stringValue": "O+"}`, `{"integerValue": "1718000000000"}`). Domain
//! records go through plain `serde_json::Value` on the way in and out so the
//! same serde attributes define both the HTTP shape and the stored shape.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported Firestore value: {0}")]
    UnsupportedValue(String),

    #[error("invalid integer value: {0}")]
    InvalidInteger(String),

    #[error("record does not serialize to an object")]
    NotAnObject,

    #[error("failed to map document: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A document as returned by the Firestore REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreDocument {
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(rename = "createTime", default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(rename = "updateTime", default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl FirestoreDocument {
    /// Last path segment of the resource name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// Decode the fields into a record, filling its `id` from the resource name
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DocumentError> {
        let mut plain = decode_fields(&self.fields)?;
        plain.insert("id".to_string(), Value::String(self.id().to_string()));
        Ok(serde_json::from_value(Value::Object(plain))?)
    }
}

/// Encode a record into Firestore fields; the `id` key is dropped
pub fn encode_record<T: Serialize>(record: &T) -> Result<Map<String, Value>, DocumentError> {
    match serde_json::to_value(record)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(encode_fields(&map))
        }
        _ => Err(DocumentError::NotAnObject),
    }
}

pub fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, DocumentError> {
    fields
        .iter()
        .map(|(key, value)| Ok::<_, DocumentError>((key.clone(), decode_value(value)?)))
        .collect()
}

pub fn decode_value(value: &Value) -> Result<Value, DocumentError> {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Err(DocumentError::UnsupportedValue(value.to_string()));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or(false))),
        "integerValue" => decode_integer(inner),
        // NaN and infinities arrive as strings and have no JSON number form
        "doubleValue" => Ok(inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(json!({
            "lat": inner.get("latitude").cloned().unwrap_or(Value::Null),
            "lng": inner.get("longitude").cloned().unwrap_or(Value::Null),
        })),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields").and_then(Value::as_object) {
                Some(fields) => decode_fields(fields)?,
                None => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(DocumentError::UnsupportedValue(other.to_string())),
    }
}

fn decode_integer(inner: &Value) -> Result<Value, DocumentError> {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .map_err(|_| DocumentError::InvalidInteger(s.clone())),
        Value::Number(n) => Ok(Value::Number(n.clone())),
        other => Err(DocumentError::InvalidInteger(other.to_string())),
    }
}
