//! Whole-form serialization
//!
//! Walks every named, enabled control once and collects the canonical
//! snapshot; the reverse direction applies a snapshot key by key.

use super::codec::{self, ExtractContext};
use super::context::FormContext;
use super::document::FormDocument;
use super::field::{FieldValue, FormSnapshot, SIGNATURE_KEY};
use super::rules::RuleTable;
use std::collections::HashSet;

/// Collect the snapshot of the current document
///
/// `include_defaults` is for export only: it keeps the certification date
/// even when it reads today, reports every toggle explicitly, reads locked
/// controls despite their disabled state and merges read-only prefill values
/// that have no control.
pub fn serialize(
    doc: &FormDocument,
    ctx: &FormContext,
    rules: &RuleTable,
    include_defaults: bool,
) -> FormSnapshot {
    let extract_ctx = ExtractContext {
        today: ctx.today(),
        include_defaults,
        certification_date: rules.certification_date.as_deref(),
    };

    let mut snapshot = FormSnapshot::new();
    let mut done: HashSet<&str> = HashSet::new();
    for control in doc.controls() {
        let readable = !control.disabled || (include_defaults && control.locked);
        if !readable || !done.insert(control.name.as_str()) {
            continue;
        }
        if let Some(value) = codec::extract(doc, &control.name, &extract_ctx) {
            snapshot.insert(control.name.clone(), value);
        }
    }

    if !ctx.signature.is_empty() {
        if let Some(payload) = ctx.signature.serialize() {
            snapshot.insert(SIGNATURE_KEY, FieldValue::Text(payload));
        }
    }

    if include_defaults {
        for (name, value) in ctx.prefill.readonly_values() {
            if !snapshot.contains_key(name) {
                snapshot.insert(name.clone(), value.clone());
            }
        }
    }

    snapshot
}

/// Apply a snapshot to the document
///
/// Unknown keys are skipped. The signature key goes to the signature pad.
pub fn deserialize(doc: &mut FormDocument, ctx: &mut FormContext, snapshot: &FormSnapshot) {
    for (key, value) in snapshot.iter() {
        if key == SIGNATURE_KEY {
            ctx.signature
                .deserialize(value.as_text().map(str::to_string));
            continue;
        }
        if !codec::apply(doc, key, value) {
            tracing::debug!("Ignoring unknown snapshot key {key}");
        }
    }
}
