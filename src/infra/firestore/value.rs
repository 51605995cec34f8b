//! Typed values of the document store's REST representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// One field value. Exactly one key is present on the wire, e.g. `{"stringValue": "x"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "stringValue")]
    String(String),
    /// 64-bit integer transported as a decimal string.
    #[serde(rename = "integerValue")]
    Integer(String),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    #[serde(rename = "timestampValue")]
    Timestamp(String),
    #[serde(rename = "nullValue")]
    Null(()),
    #[serde(rename = "mapValue")]
    Map(MapValue),
    #[serde(rename = "arrayValue")]
    Array(ArrayValue),
    #[serde(rename = "bytesValue")]
    Bytes(String),
    #[serde(rename = "referenceValue")]
    Reference(String),
    #[serde(rename = "geoPointValue")]
    GeoPoint(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn integer(value: u64) -> Self {
        Self::Integer(value.to_string())
    }

    pub fn timestamp(at: OffsetDateTime) -> Self {
        // Formatting a UTC instant as RFC 3339 only fails for years outside 0..=9999.
        match at.format(&Rfc3339) {
            Ok(formatted) => Self::Timestamp(formatted),
            Err(_) => Self::Null(()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "stringValue",
            Value::Integer(_) => "integerValue",
            Value::Double(_) => "doubleValue",
            Value::Boolean(_) => "booleanValue",
            Value::Timestamp(_) => "timestampValue",
            Value::Null(()) => "nullValue",
            Value::Map(_) => "mapValue",
            Value::Array(_) => "arrayValue",
            Value::Bytes(_) => "bytesValue",
            Value::Reference(_) => "referenceValue",
            Value::GeoPoint(_) => "geoPointValue",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(()))
    }
}

/// A stored document as returned by reads and creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Last path segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

/// Body of create and patch requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentFields {
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// One element of a `:runQuery` response stream; empty results carry no document.
#[derive(Debug, Clone, Deserialize)]
pub struct RunQueryItem {
    #[serde(default)]
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteErrorBody {
    #[serde(default)]
    pub error: Option<RemoteError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}
