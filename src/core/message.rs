//! Input and output message values.
//!
//! Messages are immutable once constructed. An [`InputMessage`] is what
//! the caller hands to an executing algorithm; an [`OutputMessage`] is
//! what commands queue on the context's outbox for the caller to drain.
//! Attribute maps hold free-form JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A message handed to the automaton together with a step or run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    raw: String,
    #[serde(default)]
    attributes: HashMap<String, Value>,
}

impl InputMessage {
    pub fn new(raw: impl Into<String>, attributes: HashMap<String, Value>) -> Self {
        Self {
            raw: raw.into(),
            attributes,
        }
    }

    /// Message with only a raw payload.
    pub fn of(raw: impl Into<String>) -> Self {
        Self::new(raw, HashMap::new())
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// An output event produced by a command, e.g. `UI_CLICK` or `LOG`.
/// How it is handled is entirely up to the external caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: HashMap<String, Value>,
}

impl OutputMessage {
    pub fn new(kind: impl Into<String>, attributes: HashMap<String, Value>) -> Self {
        Self {
            kind: kind.into(),
            attributes,
        }
    }

    /// Message with a type and no attributes.
    pub fn of(kind: impl Into<String>) -> Self {
        Self::new(kind, HashMap::new())
    }

    /// Attach one attribute, consuming and returning the message.
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}
