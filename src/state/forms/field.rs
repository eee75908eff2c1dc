//! Form field value objects

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved snapshot key for the signature payload
pub const SIGNATURE_KEY: &str = "signature";

/// A single persisted answer
///
/// Untagged so the fragment JSON stays compact: `"TEXT"`, `true`, `["A", "B"]`.
/// Dates and the signature payload are carried as `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    List(Vec<String>),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Best-effort string view used when a value lands on a control of another type
    pub fn coerce_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::List(items) => items.join(","),
        }
    }

    /// Best-effort boolean view for toggles
    pub fn coerce_bool(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "on" | "yes" | "1"
            ),
            FieldValue::List(items) => !items.is_empty(),
        }
    }

    /// Best-effort list view for multi-choice groups
    pub fn coerce_list(&self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items.clone(),
            FieldValue::Text(s) if s.is_empty() => Vec::new(),
            FieldValue::Text(s) => vec![s.clone()],
            FieldValue::Bool(_) => Vec::new(),
        }
    }

    /// Lenient conversion from arbitrary JSON
    ///
    /// Numbers become text and list items are stringified. `null` and nested
    /// objects carry no answer and yield `None`.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Bool(b) => Some(FieldValue::Bool(b)),
            Value::String(s) => Some(FieldValue::Text(s)),
            Value::Number(n) => Some(FieldValue::Text(n.to_string())),
            Value::Array(items) => Some(FieldValue::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        Value::Number(n) => Some(n.to_string()),
                        Value::Bool(b) => Some(b.to_string()),
                        _ => None,
                    })
                    .collect(),
            )),
            Value::Null | Value::Object(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Canonical key to value mapping of the current answers
///
/// Absence of a key means "nothing to persist", never "empty string".
/// Equality is key-wise; insertion order is kept for stable encodings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSnapshot {
    entries: IndexMap<String, FieldValue>,
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

impl FromIterator<(String, FieldValue)> for FormSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
