//! Built-in layout of the transfer application form and its rule table

use super::codec::DATE_FORMAT;
use super::document::FormDocument;
use super::rules::{BulkDefault, MirrorRule, RuleTable, ThreeStateRule};
use super::validation::{FieldCheck, TextFormat, ValidationRule};
use chrono::NaiveDate;

/// Button that answers every prohibitor question with its default
pub const ALL_NO_BUTTON: &str = "q11_all_no";

pub const YES: &str = "YES";
pub const NO: &str = "NO";
pub const NOT_APPLICABLE: &str = "N/A";

const YES_NO: &[&str] = &[YES, NO];

/// Prohibitor questions answered "NO" by the bulk action
pub const PROHIBITORS: &[(&str, &str)] = &[
    ("q11a_indicted", "11a. Under indictment for a felony?"),
    ("q11b_convicted", "11b. Convicted of a felony?"),
    ("q11c_fugitive", "11c. Fugitive from justice?"),
    ("q11d_controlled_substance", "11d. Unlawful user of a controlled substance?"),
    ("q11e_mental", "11e. Adjudicated mentally defective or committed?"),
    ("q11f_discharged", "11f. Discharged under dishonorable conditions?"),
    ("q11g_restraining_order", "11g. Subject to a restraining order?"),
    ("q11h_domestic_violence", "11h. Convicted of misdemeanor domestic violence?"),
    ("q11i_renounced", "11i. Renounced United States citizenship?"),
    ("q11j_illegal_alien", "11j. Alien illegally or unlawfully in the United States?"),
];

pub const NONIMMIGRANT: &str = "q11k_nonimmigrant";
pub const NONIMMIGRANT_EXCEPTION: &str = "q11l_exception";

/// A document together with the rules that govern it
#[derive(Debug, Clone)]
pub struct FormLayout {
    pub document: FormDocument,
    pub rules: RuleTable,
}

/// Application for tax paid transfer and registration of a firearm
pub fn transfer_application(today: NaiveDate) -> FormLayout {
    let today = today.format(DATE_FORMAT).to_string();

    let mut builder = FormDocument::builder()
        .text("q1_form_name", "1. Form")
        .radio(
            "q2_transferee_type",
            "2. Transferee type",
            &["INDIVIDUAL", "TRUST", "LEGAL ENTITY", "OTHER"],
        )
        .text("q2_transferee_type_other", "2. Other transferee type")
        .text("q3a_name", "3a. Full legal name")
        .textarea("q3b_residence_address", "3b. Residence address")
        .toggle(
            "q3b_mailing_same",
            "3b. Mailing address same as residence",
            true,
        )
        .textarea("q3c_mailing_address", "3c. Mailing address")
        .tel("q3d_phone", "3d. Telephone")
        .email("q3e_email", "3e. Email")
        .text("q3f_ssn", "3f. Social security number or UPIN")
        .date("q3g_dob", "3g. Date of birth", "")
        .text("q3h_birthplace", "3h. Place of birth")
        .radio("q3i_sex", "3i. Sex", &["MALE", "FEMALE"])
        .radio(
            "q3j_ethnicity",
            "3j. Ethnicity",
            &["HISPANIC OR LATINO", "NOT HISPANIC OR LATINO"],
        )
        .checkboxes(
            "q3k_race",
            "3k. Race",
            &[
                "AMERICAN INDIAN OR ALASKA NATIVE",
                "ASIAN",
                "BLACK OR AFRICAN AMERICAN",
                "NATIVE HAWAIIAN OR OTHER PACIFIC ISLANDER",
                "WHITE",
            ],
        )
        .checkboxes(
            "q3l_citizenship",
            "3l. Country of citizenship",
            &["UNITED STATES OF AMERICA", "OTHER"],
        )
        .text("q3l_citizenship_other", "3l. Other country of citizenship")
        .radio(
            "q4a_firearm_type",
            "4a. Type of firearm",
            &[
                "SUPPRESSOR",
                "SHORT-BARRELED RIFLE",
                "SHORT-BARRELED SHOTGUN",
                "MACHINEGUN",
                "ANY OTHER WEAPON",
                "DESTRUCTIVE DEVICE",
                "OTHER",
            ],
        )
        .text("q4a_firearm_type_other", "4a. Other firearm type")
        .text("q4b_make", "4b. Name and address of maker")
        .text("q4c_model", "4c. Model")
        .text("q4d_caliber", "4d. Caliber or gauge")
        .text("q4e_serial", "4e. Serial number")
        .textarea("q5_reason", "5. Reason for acquiring");

    for (name, caption) in PROHIBITORS {
        builder = builder.radio(name, caption, YES_NO);
    }

    let document = builder
        .radio(
            NONIMMIGRANT,
            "11k. Admitted under a nonimmigrant visa?",
            YES_NO,
        )
        .radio(
            NONIMMIGRANT_EXCEPTION,
            "11l. If yes, do you fall within an exception?",
            &[YES, NO, NOT_APPLICABLE],
        )
        .textarea("q12_remarks", "12. Remarks")
        .date("q13_cert_date", "13. Date of certification", &today)
        .build();

    FormLayout {
        document,
        rules: rule_table(),
    }
}

fn rule_table() -> RuleTable {
    let mut answers: Vec<(String, String)> = PROHIBITORS
        .iter()
        .map(|(name, _)| (name.to_string(), NO.to_string()))
        .collect();
    answers.push((NONIMMIGRANT.to_string(), NO.to_string()));

    RuleTable {
        mirrors: vec![MirrorRule {
            toggle: "q3b_mailing_same".into(),
            source: "q3b_residence_address".into(),
            destination: "q3c_mailing_address".into(),
        }],
        three_state: vec![ThreeStateRule {
            governing: NONIMMIGRANT.into(),
            dependent: NONIMMIGRANT_EXCEPTION.into(),
            enabling_answer: YES.into(),
            not_applicable: NOT_APPLICABLE.into(),
        }],
        bulk_defaults: vec![BulkDefault {
            button: ALL_NO_BUTTON.into(),
            answers,
            constrained: Some((
                NONIMMIGRANT_EXCEPTION.to_string(),
                NOT_APPLICABLE.to_string(),
            )),
        }],
        validations: vec![
            ValidationRule::new(
                "q3d_phone",
                FieldCheck::Phone,
                "Use digits, parentheses, dashes and spaces only",
            ),
            ValidationRule::new("q3e_email", FieldCheck::Email, "Enter a valid email address"),
            ValidationRule::new(
                "q3f_ssn",
                FieldCheck::TaxId,
                "Use 123-45-6789, nine digits, or an 8 character UPIN",
            ),
            ValidationRule::new(
                "q3g_dob",
                FieldCheck::NotInFuture,
                "Date of birth cannot be in the future",
            ),
        ],
        formats: vec![
            ("q3d_phone".into(), TextFormat::Phone),
            ("q3f_ssn".into(), TextFormat::TaxId),
        ],
        locked_satellites: vec![
            "q2_transferee_type_other".into(),
            "q4a_firearm_type_other".into(),
        ],
        certification_date: Some("q13_cert_date".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::document::FieldDescriptor;
    use crate::state::forms::rules::DependencyEngine;

    fn layout() -> FormLayout {
        transfer_application(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
    }

    #[test]
    fn test_certification_date_defaults_to_today() {
        let layout = layout();
        assert_eq!(
            layout.document.text_value("q13_cert_date"),
            Some("2026-10-19")
        );
    }

    #[test]
    fn test_satellites_are_discovered() {
        let layout = layout();
        let satellites: Vec<String> = layout
            .document
            .satellites()
            .into_iter()
            .map(|(_, s)| s)
            .collect();
        assert_eq!(
            satellites,
            vec![
                "q2_transferee_type_other",
                "q3l_citizenship_other",
                "q4a_firearm_type_other"
            ]
        );
    }

    #[test]
    fn test_rule_table_builds_acyclic_engine() {
        let layout = layout();
        let engine = DependencyEngine::for_document(&layout.rules, &layout.document).unwrap();
        assert_eq!(engine.rules().len(), 5);
    }

    #[test]
    fn test_every_rule_field_exists() {
        let layout = layout();
        let doc = &layout.document;
        for rule in &layout.rules.validations {
            assert!(doc.resolve(&rule.field).is_some(), "{}", rule.field);
        }
        for (field, answer) in &layout.rules.bulk_defaults[0].answers {
            assert!(doc.options(field).contains(&answer.as_str()), "{field}");
        }
        for satellite in &layout.rules.locked_satellites {
            assert!(matches!(
                doc.descriptor(satellite),
                Some(FieldDescriptor::Satellite { .. })
            ));
        }
    }

    #[test]
    fn test_mailing_toggle_defaults_on() {
        let layout = layout();
        assert_eq!(
            layout.document.descriptor("q3b_mailing_same"),
            Some(FieldDescriptor::Toggle)
        );
        assert!(layout.document.selects("q3b_mailing_same", "on"));
    }
}
