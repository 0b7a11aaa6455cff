//! Wire envelope exchanged over every connection.
//!
//! All frames in both directions are JSON objects of the form
//! `{"type": "<kind>", "data": <any JSON value>}`. The payload type is a
//! parameter so callers can work with typed data, and defaults to
//! [`serde_json::Value`] so unknown payloads still round-trip untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Message envelope with a string discriminator and an arbitrary payload.
///
/// Missing fields decode to their defaults (`""` and `null` for the
/// untyped form), so peers that omit `data` are still understood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message<T = serde_json::Value> {
    /// Application-defined message kind (serialized as `type`).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Message payload.
    #[serde(default)]
    pub data: T,
}

impl<T> Message<T> {
    /// Creates a message of the given kind carrying `data`.
    #[must_use]
    pub fn new(kind: impl Into<String>, data: T) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

impl<T: Serialize> Message<T> {
    /// Encodes the message as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the payload cannot be serialized
    /// (e.g. a map with non-string keys).
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<T: DeserializeOwned + Default> Message<T> {
    /// Decodes a message from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if `text` is not a JSON object with
    /// the expected shape.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Decodes a message from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if `bytes` is not valid JSON of the
    /// expected shape.
    pub fn decode_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl Message {
    /// Re-reads the untyped payload as `U`.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if `data` does not match `U`.
    pub fn into_typed<U: DeserializeOwned>(self) -> Result<Message<U>, serde_json::Error> {
        Ok(Message {
            kind: self.kind,
            data: serde_json::from_value(self.data)?,
        })
    }
}
