//! Format predicates, blur-time reformatting and inline validation markers

use super::codec::DATE_FORMAT;
use super::document::FormDocument;
use chrono::NaiveDate;

/// Format predicate attached to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck {
    /// Digits, parentheses, dashes and spaces only
    Phone,
    /// `local@domain` with both parts present
    Email,
    /// `DDD-DD-DDDD`, nine raw digits, or an eight character alternate id
    TaxId,
    /// ISO date not after today
    NotInFuture,
}

impl FieldCheck {
    pub fn accepts(self, value: &str, today: NaiveDate) -> bool {
        let value = value.trim();
        match self {
            FieldCheck::Phone => value
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '(' | ')' | '-' | ' ')),
            FieldCheck::Email => value
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty()),
            FieldCheck::TaxId => is_tax_id(value),
            FieldCheck::NotInFuture => NaiveDate::parse_from_str(value, DATE_FORMAT)
                .is_ok_and(|date| date <= today),
        }
    }
}

fn is_tax_id(value: &str) -> bool {
    let bytes = value.as_bytes();
    let dashed = bytes.len() == 11
        && bytes.iter().enumerate().all(|(i, b)| match i {
            3 | 6 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    let raw = bytes.len() == 9 && bytes.iter().all(u8::is_ascii_digit);
    let alternate = bytes.len() == 8 && bytes.iter().all(u8::is_ascii_alphanumeric);
    dashed || raw || alternate
}

/// Validation rule keyed by field name
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub field: String,
    pub check: FieldCheck,
    pub message: String,
}

impl ValidationRule {
    pub fn new(field: &str, check: FieldCheck, message: &str) -> Self {
        Self {
            field: field.to_string(),
            check,
            message: message.to_string(),
        }
    }
}

/// A field that failed its rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

/// Reformatting applied when a field loses focus and when prefilling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Phone,
    TaxId,
}

impl TextFormat {
    pub fn apply(self, raw: &str) -> String {
        match self {
            TextFormat::Phone => format_phone(raw),
            TextFormat::TaxId => format_tax_id(raw),
        }
    }
}

/// `1234567890` becomes `(123) 456-7890`; anything else is left as typed
pub fn format_phone(raw: &str) -> String {
    let mut digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits.remove(0);
    }
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        raw.to_string()
    }
}

/// `123456789` becomes `123-45-6789`; anything else is left as typed
pub fn format_tax_id(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !matches!(c, '-' | ' ')).collect();
    if compact.len() == 9 && compact.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &compact[..3], &compact[3..5], &compact[5..])
    } else {
        raw.to_string()
    }
}

/// Run the rules for one field and update its marker
pub fn validate_field(
    doc: &mut FormDocument,
    rules: &[ValidationRule],
    name: &str,
    today: NaiveDate,
) -> Option<ValidationFailure> {
    let value = doc.text_value(name)?.trim().to_string();
    let skip = value.is_empty() || doc.is_disabled(name);

    let failure = rules
        .iter()
        .filter(|rule| rule.field == name)
        .find(|rule| !skip && !rule.check.accepts(&value, today))
        .map(|rule| ValidationFailure {
            field: name.to_string(),
            message: rule.message.clone(),
        });

    doc.set_invalid(name, failure.as_ref().map(|f| f.message.clone()));
    failure
}

/// Run every rule, returning failures in document order
pub fn validate_all(
    doc: &mut FormDocument,
    rules: &[ValidationRule],
    today: NaiveDate,
) -> Vec<ValidationFailure> {
    let names: Vec<String> = doc
        .field_names()
        .into_iter()
        .filter(|name| rules.iter().any(|rule| &rule.field == name))
        .collect();

    names
        .iter()
        .filter_map(|name| validate_field(doc, rules, name, today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    mod predicates {
        use super::*;

        #[test]
        fn test_phone() {
            assert!(FieldCheck::Phone.accepts("(123) 456-7890", today()));
            assert!(FieldCheck::Phone.accepts("1234567890", today()));
            assert!(!FieldCheck::Phone.accepts("123.456.7890", today()));
            assert!(!FieldCheck::Phone.accepts("CALL ME", today()));
        }

        #[test]
        fn test_email() {
            assert!(FieldCheck::Email.accepts("JANE@EXAMPLE.GOV", today()));
            assert!(!FieldCheck::Email.accepts("@EXAMPLE.GOV", today()));
            assert!(!FieldCheck::Email.accepts("JANE@", today()));
            assert!(!FieldCheck::Email.accepts("JANE", today()));
        }

        #[test]
        fn test_tax_id() {
            assert!(FieldCheck::TaxId.accepts("123-45-6789", today()));
            assert!(FieldCheck::TaxId.accepts("123456789", today()));
            assert!(FieldCheck::TaxId.accepts("AB12CD34", today()));
            assert!(!FieldCheck::TaxId.accepts("12-345-6789", today()));
            assert!(!FieldCheck::TaxId.accepts("12345678901", today()));
            assert!(!FieldCheck::TaxId.accepts("AB12-D34", today()));
        }

        #[test]
        fn test_not_in_future() {
            assert!(FieldCheck::NotInFuture.accepts("1990-01-01", today()));
            assert!(FieldCheck::NotInFuture.accepts("2026-10-19", today()));
            assert!(!FieldCheck::NotInFuture.accepts("2999-01-01", today()));
            assert!(!FieldCheck::NotInFuture.accepts("01/01/1990", today()));
        }
    }

    mod formatting {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_format_phone() {
            assert_eq!(format_phone("1234567890"), "(123) 456-7890");
            assert_eq!(format_phone("1-123-456-7890"), "(123) 456-7890");
            assert_eq!(format_phone("(123) 456-7890"), "(123) 456-7890");
            assert_eq!(format_phone("12345"), "12345");
        }

        #[test]
        fn test_format_tax_id() {
            assert_eq!(format_tax_id("123456789"), "123-45-6789");
            assert_eq!(format_tax_id("123 45 6789"), "123-45-6789");
            assert_eq!(format_tax_id("AB12CD34"), "AB12CD34");
            assert_eq!(format_tax_id("1234"), "1234");
        }
    }

    mod markers {
        use super::*;
        use pretty_assertions::assert_eq;

        fn doc() -> FormDocument {
            FormDocument::builder()
                .tel("q3d_phone", "Phone")
                .date("q3g_dob", "DOB", "")
                .email("q3e_email", "Email")
                .build()
        }

        fn rules() -> Vec<ValidationRule> {
            vec![
                ValidationRule::new("q3d_phone", FieldCheck::Phone, "Invalid phone"),
                ValidationRule::new("q3g_dob", FieldCheck::NotInFuture, "Date is in the future"),
                ValidationRule::new("q3e_email", FieldCheck::Email, "Invalid email"),
            ]
        }

        #[test]
        fn test_empty_fields_pass() {
            let mut d = doc();
            assert!(validate_all(&mut d, &rules(), today()).is_empty());
        }

        #[test]
        fn test_failure_sets_and_clears_marker() {
            let mut d = doc();
            d.set_text("q3g_dob", "2999-01-01");
            let failure = validate_field(&mut d, &rules(), "q3g_dob", today());
            assert_eq!(
                failure,
                Some(ValidationFailure {
                    field: "q3g_dob".into(),
                    message: "Date is in the future".into()
                })
            );
            assert_eq!(d.invalid("q3g_dob"), Some("Date is in the future"));

            d.set_text("q3g_dob", "1999-01-01");
            assert!(validate_field(&mut d, &rules(), "q3g_dob", today()).is_none());
            assert!(d.invalid("q3g_dob").is_none());
        }

        #[test]
        fn test_validate_all_in_document_order() {
            let mut d = doc();
            d.set_text("q3e_email", "nobody");
            d.set_text("q3d_phone", "abc");
            let fields: Vec<String> = validate_all(&mut d, &rules(), today())
                .into_iter()
                .map(|f| f.field)
                .collect();
            assert_eq!(fields, vec!["q3d_phone", "q3e_email"]);
        }

        #[test]
        fn test_disabled_fields_are_not_flagged() {
            let mut d = doc();
            d.set_text("q3d_phone", "abc");
            d.set_disabled("q3d_phone", true);
            assert!(validate_all(&mut d, &rules(), today()).is_empty());
        }
    }
}
