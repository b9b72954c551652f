//! # Published message payload.
//!
//! A [`Message`] is an immutable key/value mapping. Keys are unique and
//! insertion order is irrelevant (equality ignores it). Values are
//! [`serde_json::Value`]s, so any structured payload fits.
//!
//! Cloning is cheap: the map is shared behind an `Arc`, so fanning one
//! message out to many subscribers never copies the payload.
//!
//! ## Example
//! ```rust
//! use pubrelay::Message;
//! use serde_json::json;
//!
//! let msg = Message::new().with("type", "ping").with("seq", 1);
//! assert_eq!(msg.get("type"), Some(&json!("ping")));
//!
//! let same = Message::from_json(json!({"seq": 1, "type": "ping"})).unwrap();
//! assert_eq!(msg, same);
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::RelayError;

/// Immutable key/value payload.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Message {
    fields: Arc<Map<String, Value>>,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a message with `key` set to `value` (replacing any previous value).
    ///
    /// Only copies the map when it is already shared.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.fields).insert(key.into(), value.into());
        self
    }

    /// Converts a JSON object into a message.
    ///
    /// # Errors
    /// [`RelayError::NotAnObject`] when `value` is not a JSON object.
    pub fn from_json(value: Value) -> Result<Self, RelayError> {
        match value {
            Value::Object(map) => Ok(Self {
                fields: Arc::new(map),
            }),
            other => Err(RelayError::NotAnObject {
                found: json_type(&other),
            }),
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Iterates over the fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the payload as a JSON object value.
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.as_ref().clone())
    }
}

impl<K, V> FromIterator<(K, V)> for Message
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Map<String, Value>>();
        Self {
            fields: Arc::new(map),
        }
    }
}

impl TryFrom<Value> for Message {
    type Error = RelayError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.fields.as_ref().clone()))
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
