//! Per-field extraction and application rules
//!
//! `extract` turns the live controls of one field into a [`FieldValue`] (or
//! nothing), `apply` writes a value back. Applying and then extracting a value
//! yields the same value, so snapshots survive a restore unchanged.

use super::document::{FieldDescriptor, FieldHandle, FormDocument, OTHER_OPTION};
use super::field::FieldValue;
use chrono::NaiveDate;

/// ISO date format used by date controls
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inputs that change how a field is extracted
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub today: NaiveDate,
    /// Keep values that are normally suppressed because they equal a default
    pub include_defaults: bool,
    /// Date field dropped from the snapshot while it still reads "today"
    pub certification_date: Option<&'a str>,
}

/// Upper-case trimmed text, as stored for every text-like field
pub fn normalize_text(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Read one field's value from the document
pub fn extract(doc: &FormDocument, name: &str, ctx: &ExtractContext) -> Option<FieldValue> {
    let handle = doc.resolve(name)?;
    let descriptor = doc.descriptor(name)?;
    let enabled: Vec<_> = handle
        .indices()
        .into_iter()
        .filter_map(|i| doc.control(i))
        .filter(|c| !c.disabled || (ctx.include_defaults && c.locked))
        .collect();

    match descriptor {
        FieldDescriptor::Toggle => {
            let control = enabled.first()?;
            if ctx.include_defaults || control.checked != control.default_checked {
                Some(FieldValue::Bool(control.checked))
            } else {
                None
            }
        }
        FieldDescriptor::SingleChoice => enabled
            .iter()
            .find(|c| c.checked)
            .map(|c| FieldValue::text(c.value.clone())),
        FieldDescriptor::MultiChoice => {
            let mut values: Vec<String> = Vec::new();
            for control in enabled.iter().filter(|c| c.checked) {
                if !values.contains(&control.value) {
                    values.push(control.value.clone());
                }
            }
            (!values.is_empty()).then_some(FieldValue::List(values))
        }
        FieldDescriptor::Text => extract_text(enabled.first()?.value.as_str()),
        FieldDescriptor::Satellite { parent } => {
            if doc.selects(&parent, OTHER_OPTION) {
                extract_text(enabled.first()?.value.as_str())
            } else {
                None
            }
        }
        FieldDescriptor::Date => {
            let value = enabled.first()?.value.clone();
            if value.is_empty() {
                return None;
            }
            let is_certification = ctx.certification_date == Some(name);
            if is_certification
                && !ctx.include_defaults
                && value == ctx.today.format(DATE_FORMAT).to_string()
            {
                return None;
            }
            Some(FieldValue::Text(value))
        }
    }
}

fn extract_text(raw: &str) -> Option<FieldValue> {
    let normalized = normalize_text(raw);
    (!normalized.is_empty()).then_some(FieldValue::Text(normalized))
}

/// Write one value into the document
///
/// Returns `false` when no control carries `name`; that is not an error, the
/// document may lag behind the data model. Values of the wrong shape are
/// coerced on a best-effort basis.
pub fn apply(doc: &mut FormDocument, name: &str, value: &FieldValue) -> bool {
    let (Some(handle), Some(descriptor)) = (doc.resolve(name), doc.descriptor(name)) else {
        tracing::debug!("No control named {name}, skipping");
        return false;
    };

    match descriptor {
        FieldDescriptor::Toggle => {
            doc.set_checked(name, None, value.coerce_bool());
        }
        FieldDescriptor::SingleChoice => {
            let option = match value {
                FieldValue::List(items) => items.first().cloned().unwrap_or_default(),
                other => other.coerce_text(),
            };
            if !doc.select_option(name, Some(&option)) {
                tracing::debug!("Field {name} has no option {option:?}");
            }
        }
        FieldDescriptor::MultiChoice => {
            let wanted = value.coerce_list();
            if let FieldHandle::Group(members) = handle {
                for i in members {
                    if let Some(control) = doc.control_mut(i) {
                        control.checked = wanted.contains(&control.value);
                    }
                }
            }
        }
        FieldDescriptor::Text | FieldDescriptor::Satellite { .. } => {
            doc.set_text(name, &normalize_text(&value.coerce_text()));
        }
        FieldDescriptor::Date => {
            doc.set_text(name, &value.coerce_text());
        }
    }
    true
}
