//! Ordered document model produced by field aggregation.
//!
//! A [`Document`] is an insertion-ordered field map; field order is the
//! declaration order of the producers that built it, so serialized output
//! is stable across runs and suitable for golden-file comparison.

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Result;

/// A single field value inside a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Plain extracted text.
    Text(String),
    /// A parsed timestamp localized to the jurisdiction's UTC offset.
    DateTime(DateTime<FixedOffset>),
    /// A nested document.
    Document(Document),
    /// An ordered list of nested documents.
    List(Vec<Document>),
    /// Explicitly absent (the page does not render this field).
    Null,
}

impl Value {
    /// Wrap optional text, mapping `None` to [`Value::Null`].
    #[must_use]
    pub fn from_text(text: Option<String>) -> Self {
        match text {
            Some(t) => Value::Text(t),
            None => Value::Null,
        }
    }

    /// True for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// The unit of output: one bill, action, vote, person, or event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, keeping insertion order. Re-inserting an existing
    /// name overwrites its value in place without changing its position.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Text content of a field, if it is a text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(Value::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// List content of a field, if it is a list field.
    #[must_use]
    pub fn list(&self, name: &str) -> Option<&[Document]> {
        match self.fields.get(name) {
            Some(Value::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields have been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Fill in fields from `other` that this document has not set.
    /// Existing fields are never clobbered, whatever their value.
    pub fn merge_missing(&mut self, other: Document) {
        for (name, value) in other.fields {
            if !self.fields.contains_key(&name) {
                self.fields.insert(name, value);
            }
        }
    }

    /// Serialize to a single-line JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
