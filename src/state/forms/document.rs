//! In-memory form document
//!
//! The document plays the role of the rendered form: an ordered list of named
//! controls, where several controls may share a name (radio groups and
//! multi-choice checkbox groups). Engine code never probes control shapes at
//! runtime; it resolves a name once into a [`FieldHandle`] and dispatches on it.

use indexmap::IndexMap;

/// Suffix marking a free-text satellite of a choice field
pub const SATELLITE_SUFFIX: &str = "_other";

/// Choice option that enables a satellite text field
pub const OTHER_OPTION: &str = "OTHER";

/// Kind of a single control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    Textarea,
    Email,
    Tel,
    Date,
    Checkbox,
    Radio,
}

impl ControlKind {
    pub fn is_choice(self) -> bool {
        matches!(self, ControlKind::Checkbox | ControlKind::Radio)
    }

    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            ControlKind::Text | ControlKind::Textarea | ControlKind::Email | ControlKind::Tel
        )
    }
}

/// One control of the form
#[derive(Debug, Clone)]
pub struct Control {
    pub name: String,
    pub kind: ControlKind,
    /// Current text for text-like and date controls, option value for choices
    pub value: String,
    pub checked: bool,
    pub default_value: String,
    pub default_checked: bool,
    pub disabled: bool,
    /// Read-only prefill marker
    pub locked: bool,
    /// Inline validation message
    pub invalid: Option<String>,
    /// Member of an option group, even when it is the only option
    pub grouped: bool,
}

impl Control {
    fn new(name: &str, kind: ControlKind, value: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value: value.to_string(),
            checked: false,
            default_value: value.to_string(),
            default_checked: false,
            disabled: false,
            locked: false,
            invalid: None,
            grouped: false,
        }
    }

    fn reset(&mut self) {
        self.value = self.default_value.clone();
        self.checked = self.default_checked;
        self.disabled = false;
        self.locked = false;
        self.invalid = None;
    }
}

/// All controls sharing one name, resolved once per lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldHandle {
    Single(usize),
    Group(Vec<usize>),
}

impl FieldHandle {
    pub fn indices(&self) -> Vec<usize> {
        match self {
            FieldHandle::Single(i) => vec![*i],
            FieldHandle::Group(members) => members.clone(),
        }
    }
}

/// Logical kind of a named field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDescriptor {
    Toggle,
    SingleChoice,
    MultiChoice,
    Text,
    Date,
    Satellite { parent: String },
}

/// The whole form
#[derive(Debug, Clone, Default)]
pub struct FormDocument {
    controls: Vec<Control>,
    captions: IndexMap<String, String>,
    focused: Option<String>,
    scrolled_to: Option<String>,
}

impl FormDocument {
    pub fn builder() -> FormDocumentBuilder {
        FormDocumentBuilder::default()
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn control(&self, index: usize) -> Option<&Control> {
        self.controls.get(index)
    }

    pub fn control_mut(&mut self, index: usize) -> Option<&mut Control> {
        self.controls.get_mut(index)
    }

    /// Resolve every control carrying `name`
    pub fn resolve(&self, name: &str) -> Option<FieldHandle> {
        let members: Vec<usize> = self
            .controls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name == name)
            .map(|(i, _)| i)
            .collect();

        match members.len() {
            0 => None,
            1 if !self.controls[members[0]].grouped => {
                Some(FieldHandle::Single(members[0]))
            }
            _ => Some(FieldHandle::Group(members)),
        }
    }

    /// Derive the logical kind of a field from its controls
    pub fn descriptor(&self, name: &str) -> Option<FieldDescriptor> {
        let handle = self.resolve(name)?;
        let first = &self.controls[handle.indices()[0]];
        let descriptor = match (first.kind, &handle) {
            (ControlKind::Radio, _) => FieldDescriptor::SingleChoice,
            (ControlKind::Checkbox, FieldHandle::Single(_)) => FieldDescriptor::Toggle,
            (ControlKind::Checkbox, FieldHandle::Group(_)) => FieldDescriptor::MultiChoice,
            (ControlKind::Date, _) => FieldDescriptor::Date,
            _ => match self.satellite_parent(name) {
                Some(parent) => FieldDescriptor::Satellite { parent },
                None => FieldDescriptor::Text,
            },
        };
        Some(descriptor)
    }

    fn satellite_parent(&self, name: &str) -> Option<String> {
        let parent = name.strip_suffix(SATELLITE_SUFFIX)?;
        let handle = self.resolve(parent)?;
        let is_choice = handle
            .indices()
            .iter()
            .all(|&i| self.controls[i].kind.is_choice());
        is_choice.then(|| parent.to_string())
    }

    /// Every satellite field with its governing parent, in document order
    pub fn satellites(&self) -> Vec<(String, String)> {
        self.field_names()
            .into_iter()
            .filter_map(|name| match self.descriptor(&name) {
                Some(FieldDescriptor::Satellite { parent }) => Some((parent, name)),
                _ => None,
            })
            .collect()
    }

    /// Logical field names in document order, each once
    pub fn field_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.controls
            .iter()
            .filter(|c| seen.insert(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn caption<'a>(&'a self, name: &'a str) -> &'a str {
        self.captions.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn focus(&mut self, name: &str) {
        self.focused = Some(name.to_string());
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Consume the pending focus request
    pub fn take_focus(&mut self) -> Option<String> {
        self.focused.take()
    }

    pub fn scroll_into_view(&mut self, name: &str) {
        self.scrolled_to = Some(name.to_string());
    }

    pub fn scrolled_to(&self) -> Option<&str> {
        self.scrolled_to.as_deref()
    }

    /// Current text of a single text-like or date control
    pub fn text_value(&self, name: &str) -> Option<&str> {
        match self.resolve(name)? {
            FieldHandle::Single(i) if !self.controls[i].kind.is_choice() => {
                Some(self.controls[i].value.as_str())
            }
            _ => None,
        }
    }

    /// Overwrite the raw text of a text-like or date control
    pub fn set_text(&mut self, name: &str, text: &str) -> bool {
        match self.resolve(name) {
            Some(FieldHandle::Single(i)) if !self.controls[i].kind.is_choice() => {
                self.controls[i].value = text.to_string();
                true
            }
            _ => false,
        }
    }

    /// Check exactly `option` in a radio group, or uncheck all when `None`
    pub fn select_option(&mut self, name: &str, option: Option<&str>) -> bool {
        let Some(handle) = self.resolve(name) else {
            return false;
        };
        let mut found = option.is_none();
        for i in handle.indices() {
            let control = &mut self.controls[i];
            control.checked = Some(control.value.as_str()) == option;
            found |= control.checked;
        }
        found
    }

    /// Set the checked state of a toggle or of one member of a checkbox group
    pub fn set_checked(&mut self, name: &str, option: Option<&str>, checked: bool) -> bool {
        let Some(handle) = self.resolve(name) else {
            return false;
        };
        match (handle, option) {
            (FieldHandle::Single(i), _) => {
                self.controls[i].checked = checked;
                true
            }
            (FieldHandle::Group(members), Some(option)) => {
                let mut found = false;
                for i in members {
                    if self.controls[i].value == option {
                        self.controls[i].checked = checked;
                        found = true;
                    }
                }
                found
            }
            (FieldHandle::Group(_), None) => false,
        }
    }

    /// Whether any member of `name` with value `option` is checked
    pub fn selects(&self, name: &str, option: &str) -> bool {
        self.resolve(name).is_some_and(|handle| {
            handle.indices().iter().any(|&i| {
                let c = &self.controls[i];
                c.checked && c.value == option
            })
        })
    }

    /// Checked option values of a choice field, in document order
    pub fn checked_options(&self, name: &str) -> Vec<&str> {
        self.resolve(name)
            .map(|handle| {
                handle
                    .indices()
                    .into_iter()
                    .map(|i| &self.controls[i])
                    .filter(|c| c.kind.is_choice() && c.checked)
                    .map(|c| c.value.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Option values of a choice field, in document order
    pub fn options(&self, name: &str) -> Vec<&str> {
        self.resolve(name)
            .map(|handle| {
                handle
                    .indices()
                    .into_iter()
                    .map(|i| &self.controls[i])
                    .filter(|c| c.kind.is_choice())
                    .map(|c| c.value.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A field is disabled when every one of its controls is
    pub fn is_disabled(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(|handle| {
            handle.indices().iter().all(|&i| self.controls[i].disabled)
        })
    }

    pub fn set_disabled(&mut self, name: &str, disabled: bool) {
        if let Some(handle) = self.resolve(name) {
            for i in handle.indices() {
                self.controls[i].disabled = disabled;
            }
        }
    }

    pub fn is_locked(&self, name: &str) -> bool {
        self.resolve(name)
            .is_some_and(|handle| handle.indices().iter().any(|&i| self.controls[i].locked))
    }

    pub fn set_locked(&mut self, name: &str, locked: bool) {
        if let Some(handle) = self.resolve(name) {
            for i in handle.indices() {
                self.controls[i].locked = locked;
            }
        }
    }

    pub fn invalid(&self, name: &str) -> Option<&str> {
        let handle = self.resolve(name)?;
        handle
            .indices()
            .into_iter()
            .find_map(|i| self.controls[i].invalid.as_deref())
    }

    pub fn set_invalid(&mut self, name: &str, message: Option<String>) {
        if let Some(handle) = self.resolve(name) {
            for i in handle.indices() {
                self.controls[i].invalid = message.clone();
            }
        }
    }

    /// Return every control to its initial state
    pub fn reset(&mut self) {
        for control in &mut self.controls {
            control.reset();
        }
        self.focused = None;
        self.scrolled_to = None;
    }
}

/// Builds a [`FormDocument`] control by control
#[derive(Debug, Default)]
pub struct FormDocumentBuilder {
    doc: FormDocument,
}

impl FormDocumentBuilder {
    fn caption(&mut self, name: &str, caption: &str) {
        self.doc
            .captions
            .insert(name.to_string(), caption.to_string());
    }

    fn single(mut self, name: &str, caption: &str, kind: ControlKind, initial: &str) -> Self {
        self.caption(name, caption);
        self.doc.controls.push(Control::new(name, kind, initial));
        self
    }

    pub fn text(self, name: &str, caption: &str) -> Self {
        self.single(name, caption, ControlKind::Text, "")
    }

    pub fn textarea(self, name: &str, caption: &str) -> Self {
        self.single(name, caption, ControlKind::Textarea, "")
    }

    pub fn email(self, name: &str, caption: &str) -> Self {
        self.single(name, caption, ControlKind::Email, "")
    }

    pub fn tel(self, name: &str, caption: &str) -> Self {
        self.single(name, caption, ControlKind::Tel, "")
    }

    pub fn date(self, name: &str, caption: &str, initial: &str) -> Self {
        self.single(name, caption, ControlKind::Date, initial)
    }

    pub fn toggle(mut self, name: &str, caption: &str, default_checked: bool) -> Self {
        self.caption(name, caption);
        let mut control = Control::new(name, ControlKind::Checkbox, "on");
        control.checked = default_checked;
        control.default_checked = default_checked;
        self.doc.controls.push(control);
        self
    }

    pub fn radio(self, name: &str, caption: &str, options: &[&str]) -> Self {
        self.choices(name, caption, ControlKind::Radio, options)
    }

    pub fn checkboxes(self, name: &str, caption: &str, options: &[&str]) -> Self {
        self.choices(name, caption, ControlKind::Checkbox, options)
    }

    fn choices(mut self, name: &str, caption: &str, kind: ControlKind, options: &[&str]) -> Self {
        self.caption(name, caption);
        for option in options {
            let mut control = Control::new(name, kind, option);
            control.grouped = true;
            self.doc.controls.push(control);
        }
        self
    }

    pub fn build(self) -> FormDocument {
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FormDocument {
        FormDocument::builder()
            .text("q3a_name", "Name")
            .toggle("q3b_mailing_same", "Same", true)
            .radio("q2_type", "Type", &["INDIVIDUAL", "OTHER"])
            .text("q2_type_other", "Other type")
            .checkboxes("q3k_race", "Race", &["ASIAN", "WHITE"])
            .checkboxes("q9_single", "Lone checkbox group", &["ONLY"])
            .date("q13_cert_date", "Date", "2026-10-19")
            .text("stray_other", "No parent")
            .build()
    }

    mod resolve {
        use super::*;

        #[test]
        fn test_single_and_group_handles() {
            let doc = sample();
            assert!(matches!(doc.resolve("q3a_name"), Some(FieldHandle::Single(0))));
            assert!(matches!(doc.resolve("q2_type"), Some(FieldHandle::Group(ref m)) if m.len() == 2));
            assert!(doc.resolve("missing").is_none());
        }

        #[test]
        fn test_descriptors() {
            let doc = sample();
            assert_eq!(doc.descriptor("q3a_name"), Some(FieldDescriptor::Text));
            assert_eq!(doc.descriptor("q3b_mailing_same"), Some(FieldDescriptor::Toggle));
            assert_eq!(doc.descriptor("q2_type"), Some(FieldDescriptor::SingleChoice));
            assert_eq!(doc.descriptor("q3k_race"), Some(FieldDescriptor::MultiChoice));
            assert_eq!(doc.descriptor("q13_cert_date"), Some(FieldDescriptor::Date));
            assert_eq!(
                doc.descriptor("q2_type_other"),
                Some(FieldDescriptor::Satellite {
                    parent: "q2_type".to_string()
                })
            );
            assert_eq!(doc.descriptor("stray_other"), Some(FieldDescriptor::Text));
        }

        #[test]
        fn test_caption_falls_back_to_name() {
            let doc = sample();
            assert_eq!(doc.caption("q3a_name"), "Name");
            let name = String::from("ghost");
            assert_eq!(doc.caption(&name), "ghost");
        }

        #[test]
        fn test_one_option_checkbox_group_stays_multi_choice() {
            let doc = sample();
            assert!(matches!(doc.resolve("q9_single"), Some(FieldHandle::Group(ref m)) if m.len() == 1));
            assert_eq!(doc.descriptor("q9_single"), Some(FieldDescriptor::MultiChoice));
        }

        #[test]
        fn test_satellites_listed_with_parent() {
            let doc = sample();
            assert_eq!(
                doc.satellites(),
                vec![("q2_type".to_string(), "q2_type_other".to_string())]
            );
        }
    }

    mod mutation {
        use super::*;

        #[test]
        fn test_field_names_dedupes_groups() {
            let doc = sample();
            assert_eq!(
                doc.field_names(),
                vec![
                    "q3a_name",
                    "q3b_mailing_same",
                    "q2_type",
                    "q2_type_other",
                    "q3k_race",
                    "q9_single",
                    "q13_cert_date",
                    "stray_other"
                ]
            );
        }

        #[test]
        fn test_select_option_is_exclusive() {
            let mut doc = sample();
            assert!(doc.select_option("q2_type", Some("INDIVIDUAL")));
            assert!(doc.select_option("q2_type", Some("OTHER")));
            assert_eq!(doc.checked_options("q2_type"), vec!["OTHER"]);
            assert!(!doc.select_option("q2_type", Some("BOGUS")));
            assert!(doc.checked_options("q2_type").is_empty());
        }

        #[test]
        fn test_set_checked_group_member() {
            let mut doc = sample();
            assert!(doc.set_checked("q3k_race", Some("WHITE"), true));
            assert!(doc.selects("q3k_race", "WHITE"));
            assert!(!doc.set_checked("q3k_race", None, true));
        }

        #[test]
        fn test_set_text_rejects_choices() {
            let mut doc = sample();
            assert!(doc.set_text("q3a_name", "jane"));
            assert!(!doc.set_text("q2_type", "OTHER"));
            assert_eq!(doc.text_value("q3a_name"), Some("jane"));
        }

        #[test]
        fn test_reset_restores_defaults() {
            let mut doc = sample();
            doc.set_text("q13_cert_date", "2020-01-01");
            doc.set_checked("q3b_mailing_same", None, false);
            doc.set_disabled("q3a_name", true);
            doc.set_invalid("q3a_name", Some("bad".into()));
            doc.reset();
            assert_eq!(doc.text_value("q13_cert_date"), Some("2026-10-19"));
            assert!(doc.selects("q3b_mailing_same", "on"));
            assert!(!doc.is_disabled("q3a_name"));
            assert!(doc.invalid("q3a_name").is_none());
        }
    }
}
