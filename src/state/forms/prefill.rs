//! Externally supplied prefill values
//!
//! Loaded once at start-up from JSON of the shape
//! `{ "field": { "value": "X", "readonly": true } }` and never mutated.

use super::codec::{self, normalize_text};
use super::document::{FieldDescriptor, FormDocument, OTHER_OPTION};
use super::field::{FieldValue, FormSnapshot};
use super::rules::RuleTable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One prefilled field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefillEntry {
    pub value: FieldValue,
    #[serde(default)]
    pub readonly: bool,
}

/// All prefill entries, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prefill {
    entries: IndexMap<String, PrefillEntry>,
}

impl Prefill {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with(mut self, name: &str, value: FieldValue, readonly: bool) -> Self {
        self.entries
            .insert(name.to_string(), PrefillEntry { value, readonly });
        self
    }

    pub fn get(&self, name: &str) -> Option<&PrefillEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Read-only entries, for the export snapshot
    pub fn readonly_values(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.readonly)
            .map(|(name, entry)| (name, &entry.value))
    }

    /// Apply the same reformatting and upper-casing as manual entry
    pub fn prepared(self, doc: &FormDocument, rules: &RuleTable) -> Self {
        let entries = self
            .entries
            .into_iter()
            .map(|(name, mut entry)| {
                if let Some(FieldDescriptor::Text | FieldDescriptor::Satellite { .. }) =
                    doc.descriptor(&name)
                {
                    let mut text = entry.value.coerce_text();
                    if let Some(format) = rules.format_for(&name) {
                        text = format.apply(&text);
                    }
                    entry.value = FieldValue::Text(normalize_text(&text));
                }
                (name, entry)
            })
            .collect();
        Self { entries }
    }

    /// Write entries into fields that the restored snapshot left untouched
    ///
    /// Read-only entries disable and lock their control. Listed satellites
    /// are locked as well when their read-only parent resolves to OTHER.
    /// Returns the names that received a value.
    pub fn apply(
        &self,
        doc: &mut FormDocument,
        restored: &FormSnapshot,
        locked_satellites: &[String],
    ) -> Vec<String> {
        let mut applied = Vec::new();
        for (name, entry) in &self.entries {
            if restored.contains_key(name) {
                tracing::debug!("Prefill for {name} superseded by restored value");
                continue;
            }
            if !codec::apply(doc, name, &entry.value) {
                continue;
            }
            if entry.readonly {
                doc.set_disabled(name, true);
                doc.set_locked(name, true);
            }
            applied.push(name.clone());
        }

        for satellite in locked_satellites {
            let Some(FieldDescriptor::Satellite { parent }) = doc.descriptor(satellite) else {
                continue;
            };
            let parent_readonly = self.get(&parent).is_some_and(|e| e.readonly);
            if parent_readonly && doc.is_locked(&parent) && doc.selects(&parent, OTHER_OPTION) {
                doc.set_disabled(satellite, true);
                doc.set_locked(satellite, true);
            }
        }

        applied
    }
}
