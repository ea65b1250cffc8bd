//! Opaque dynamically-typed payload tree.
//!
//! `AuditEntry.data`, receipt bodies, and anything else hashed by the
//! canonicalizer is modeled as a single recursive value type instead of
//! `serde_json::Value` directly, so the object variant can guarantee
//! recursively key-sorted iteration order regardless of how it was built.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A JSON-shaped value whose object variant is always key-sorted.
///
/// `CanonicalValue::Object` is backed by a `BTreeMap`, so any value built
/// through the public constructors already satisfies the canonicalization
/// invariant before it ever reaches the hasher.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<CanonicalValue>),
    Object(BTreeMap<String, CanonicalValue>),
}

impl CanonicalValue {
    pub fn object(fields: impl IntoIterator<Item = (&'static str, CanonicalValue)>) -> Self {
        CanonicalValue::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn string(s: impl Into<String>) -> Self {
        CanonicalValue::String(s.into())
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, CanonicalValue>> {
        match self {
            CanonicalValue::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CanonicalValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a key if this is an object, `None` otherwise.
    pub fn field(&self, key: &str) -> Option<&CanonicalValue> {
        self.as_object().and_then(|m| m.get(key))
    }
}

impl From<JsonValue> for CanonicalValue {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => CanonicalValue::Null,
            JsonValue::Bool(b) => CanonicalValue::Bool(b),
            JsonValue::Number(n) => CanonicalValue::Number(n),
            JsonValue::String(s) => CanonicalValue::String(s),
            JsonValue::Array(a) => CanonicalValue::Array(a.into_iter().map(Into::into).collect()),
            JsonValue::Object(o) => {
                CanonicalValue::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<CanonicalValue> for JsonValue {
    fn from(v: CanonicalValue) -> Self {
        match v {
            CanonicalValue::Null => JsonValue::Null,
            CanonicalValue::Bool(b) => JsonValue::Bool(b),
            CanonicalValue::Number(n) => JsonValue::Number(n),
            CanonicalValue::String(s) => JsonValue::String(s),
            CanonicalValue::Array(a) => JsonValue::Array(a.into_iter().map(Into::into).collect()),
            CanonicalValue::Object(o) => {
                JsonValue::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        JsonValue::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CanonicalValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(JsonValue::deserialize(deserializer)?.into())
    }
}

impl fmt::Display for CanonicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", JsonValue::from(self.clone()))
    }
}
