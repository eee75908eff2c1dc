//! Field dependency rules and the reconciliation pass
//!
//! Every rule names the fields that trigger it and the fields it writes. The
//! engine orders rules so that a writer always runs before any rule it can
//! trigger, then a single pass over that order settles one user action.
//! Missing controls turn a rule into a no-op; the table tolerates forms that
//! lack optional sections.

use super::document::{FormDocument, OTHER_OPTION};
use super::validation::{TextFormat, ValidationRule};
use std::collections::HashSet;
use thiserror::Error;

/// Errors building a dependency engine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("dependency rules form a cycle through: {}", .fields.join(", "))]
    Cycle { fields: Vec<String> },
}

/// "Same as" toggle copying `source` into `destination`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRule {
    pub toggle: String,
    pub source: String,
    pub destination: String,
}

/// A dependent choice with three reachable configurations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreeStateRule {
    pub governing: String,
    pub dependent: String,
    /// Governing answer under which the dependent is a real question
    pub enabling_answer: String,
    /// Dependent option forced for every other governing answer
    pub not_applicable: String,
}

/// "Set all to default" action bound to a button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDefault {
    pub button: String,
    pub answers: Vec<(String, String)>,
    pub constrained: Option<(String, String)>,
}

/// Static rule table of one form
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    pub mirrors: Vec<MirrorRule>,
    pub three_state: Vec<ThreeStateRule>,
    pub bulk_defaults: Vec<BulkDefault>,
    pub validations: Vec<ValidationRule>,
    pub formats: Vec<(String, TextFormat)>,
    /// Satellites locked along with a read-only prefilled parent set to OTHER
    pub locked_satellites: Vec<String>,
    /// Date field suppressed from persistence while it equals today
    pub certification_date: Option<String>,
}

impl RuleTable {
    pub fn format_for(&self, name: &str) -> Option<TextFormat> {
        self.formats
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, format)| *format)
    }

    pub fn bulk_default(&self, button: &str) -> Option<&BulkDefault> {
        self.bulk_defaults.iter().find(|b| b.button == button)
    }
}

/// Why a reconciliation pass runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileCause {
    User,
    Load,
}

/// One edge of the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyRule {
    Mirror(MirrorRule),
    Satellite { parent: String, satellite: String },
    ThreeState(ThreeStateRule),
}

impl DependencyRule {
    pub fn triggers(&self) -> Vec<&str> {
        match self {
            DependencyRule::Mirror(m) => vec![m.toggle.as_str(), m.source.as_str()],
            DependencyRule::Satellite { parent, .. } => vec![parent.as_str()],
            DependencyRule::ThreeState(t) => vec![t.governing.as_str()],
        }
    }

    pub fn affects(&self) -> Vec<&str> {
        match self {
            DependencyRule::Mirror(m) => vec![m.destination.as_str()],
            DependencyRule::Satellite { satellite, .. } => vec![satellite.as_str()],
            DependencyRule::ThreeState(t) => vec![t.dependent.as_str()],
        }
    }

    fn apply(&self, doc: &mut FormDocument, cause: ReconcileCause) {
        match self {
            DependencyRule::Mirror(rule) => apply_mirror(doc, rule),
            DependencyRule::Satellite { parent, satellite } => {
                apply_satellite(doc, parent, satellite, cause)
            }
            DependencyRule::ThreeState(rule) => apply_three_state(doc, rule),
        }
    }
}

fn apply_mirror(doc: &mut FormDocument, rule: &MirrorRule) {
    if doc.resolve(&rule.toggle).is_none() || doc.resolve(&rule.destination).is_none() {
        tracing::debug!("Mirror {} -> {} missing controls", rule.source, rule.destination);
        return;
    }
    if doc.is_locked(&rule.destination) {
        return;
    }

    let mirroring = !doc.checked_options(&rule.toggle).is_empty();
    if mirroring {
        let value = doc.text_value(&rule.source).unwrap_or_default().to_string();
        doc.set_text(&rule.destination, &value);
        doc.set_invalid(&rule.destination, None);
        doc.set_disabled(&rule.destination, true);
    } else {
        doc.set_disabled(&rule.destination, false);
    }
}

fn apply_satellite(doc: &mut FormDocument, parent: &str, satellite: &str, cause: ReconcileCause) {
    if doc.resolve(satellite).is_none() || doc.is_locked(satellite) {
        return;
    }

    let was_disabled = doc.is_disabled(satellite);
    if doc.selects(parent, OTHER_OPTION) {
        doc.set_disabled(satellite, false);
        if was_disabled && cause == ReconcileCause::User {
            doc.focus(satellite);
        }
    } else {
        doc.set_text(satellite, "");
        doc.set_invalid(satellite, None);
        doc.set_disabled(satellite, true);
    }
}

fn apply_three_state(doc: &mut FormDocument, rule: &ThreeStateRule) {
    let Some(handle) = doc.resolve(&rule.dependent) else {
        tracing::debug!("Three-state dependent {} missing", rule.dependent);
        return;
    };
    if doc.is_locked(&rule.dependent) {
        return;
    }

    let answer = doc
        .checked_options(&rule.governing)
        .first()
        .map(|s| s.to_string());

    for i in handle.indices() {
        let Some(control) = doc.control_mut(i) else {
            continue;
        };
        let is_na = control.value == rule.not_applicable;
        match answer.as_deref() {
            None => {
                control.disabled = true;
                control.checked = false;
            }
            Some(a) if a == rule.enabling_answer => {
                control.disabled = is_na;
                if is_na {
                    control.checked = false;
                }
            }
            Some(_) => {
                control.disabled = !is_na;
                control.checked = is_na;
            }
        }
    }
}

/// Topologically ordered rule set
#[derive(Debug, Clone, Default)]
pub struct DependencyEngine {
    order: Vec<DependencyRule>,
}

impl DependencyEngine {
    /// Order `rules` so writers run before the rules they trigger
    pub fn new(rules: Vec<DependencyRule>) -> Result<Self, RuleError> {
        let n = rules.len();
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut indegree = vec![0usize; n];

        for (i, writer) in rules.iter().enumerate() {
            let written: HashSet<&str> = writer.affects().into_iter().collect();
            for (j, reader) in rules.iter().enumerate() {
                if reader.triggers().iter().any(|t| written.contains(t)) {
                    edges[i].push(j);
                    indegree[j] += 1;
                }
            }
        }

        let mut order = Vec::with_capacity(n);
        let mut placed = vec![false; n];
        while order.len() < n {
            // Lowest ready index first keeps the order stable across runs
            let Some(next) = (0..n).find(|&i| !placed[i] && indegree[i] == 0) else {
                let fields = (0..n)
                    .filter(|&i| !placed[i])
                    .flat_map(|i| rules[i].affects())
                    .map(str::to_string)
                    .collect();
                return Err(RuleError::Cycle { fields });
            };
            placed[next] = true;
            for &j in &edges[next] {
                indegree[j] -= 1;
            }
            order.push(next);
        }

        let mut slots: Vec<Option<DependencyRule>> = rules.into_iter().map(Some).collect();
        Ok(Self {
            order: order.into_iter().filter_map(|i| slots[i].take()).collect(),
        })
    }

    /// Rules of `table` plus one satellite rule per satellite in `doc`
    pub fn for_document(table: &RuleTable, doc: &FormDocument) -> Result<Self, RuleError> {
        let mut rules: Vec<DependencyRule> = table
            .mirrors
            .iter()
            .cloned()
            .map(DependencyRule::Mirror)
            .collect();
        rules.extend(
            doc.satellites()
                .into_iter()
                .map(|(parent, satellite)| DependencyRule::Satellite { parent, satellite }),
        );
        rules.extend(table.three_state.iter().cloned().map(DependencyRule::ThreeState));
        Self::new(rules)
    }

    pub fn rules(&self) -> &[DependencyRule] {
        &self.order
    }

    /// Settle every rule reachable from `changed`
    pub fn reconcile(&self, doc: &mut FormDocument, changed: &[&str], cause: ReconcileCause) {
        let mut dirty: HashSet<String> = changed.iter().map(|s| s.to_string()).collect();
        for rule in &self.order {
            if rule.triggers().iter().any(|t| dirty.contains(*t)) {
                rule.apply(doc, cause);
                dirty.extend(rule.affects().into_iter().map(str::to_string));
            }
        }
    }

    /// Settle every rule, as after a load
    pub fn reconcile_all(&self, doc: &mut FormDocument, cause: ReconcileCause) {
        for rule in &self.order {
            rule.apply(doc, cause);
        }
    }

    /// Force every answer of `bulk` to its default, cascading after each one
    pub fn apply_bulk_default(&self, doc: &mut FormDocument, bulk: &BulkDefault) {
        for (field, answer) in bulk.answers.iter().chain(bulk.constrained.iter()) {
            if doc.resolve(field).is_none() || doc.is_locked(field) {
                continue;
            }
            doc.select_option(field, Some(answer.as_str()));
            self.reconcile(doc, &[field.as_str()], ReconcileCause::User);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror() -> MirrorRule {
        MirrorRule {
            toggle: "q3b_mailing_same".into(),
            source: "q3b_residence".into(),
            destination: "q3c_mailing".into(),
        }
    }

    fn exception_rule() -> ThreeStateRule {
        ThreeStateRule {
            governing: "q11l_nonimmigrant".into(),
            dependent: "q11m_exception".into(),
            enabling_answer: "YES".into(),
            not_applicable: "NA".into(),
        }
    }

    fn doc() -> FormDocument {
        FormDocument::builder()
            .textarea("q3b_residence", "Residence")
            .toggle("q3b_mailing_same", "Mailing same", false)
            .textarea("q3c_mailing", "Mailing")
            .radio("q2_type", "Type", &["INDIVIDUAL", "OTHER"])
            .text("q2_type_other", "Other type")
            .radio("q11a_felony", "Felony", &["YES", "NO"])
            .radio("q11l_nonimmigrant", "Nonimmigrant", &["YES", "NO"])
            .radio("q11m_exception", "Exception", &["YES", "NO", "NA"])
            .build()
    }

    fn table() -> RuleTable {
        RuleTable {
            mirrors: vec![mirror()],
            three_state: vec![exception_rule()],
            bulk_defaults: vec![BulkDefault {
                button: "all_no".into(),
                answers: vec![
                    ("q11a_felony".into(), "NO".into()),
                    ("q11l_nonimmigrant".into(), "NO".into()),
                ],
                constrained: Some(("q11m_exception".into(), "NA".into())),
            }],
            ..Default::default()
        }
    }

    fn engine(d: &FormDocument) -> DependencyEngine {
        DependencyEngine::for_document(&table(), d).unwrap()
    }

    fn enabled_options<'a>(d: &'a FormDocument, name: &str) -> Vec<&'a str> {
        d.resolve(name)
            .unwrap()
            .indices()
            .into_iter()
            .filter_map(|i| d.control(i))
            .filter(|c| !c.disabled)
            .map(|c| c.value.as_str())
            .collect()
    }

    mod ordering {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_writer_runs_before_reader() {
            let chained = vec![
                DependencyRule::Satellite {
                    parent: "b".into(),
                    satellite: "c".into(),
                },
                DependencyRule::Satellite {
                    parent: "a".into(),
                    satellite: "b".into(),
                },
            ];
            let engine = DependencyEngine::new(chained).unwrap();
            assert_eq!(engine.rules()[0].affects(), vec!["b"]);
            assert_eq!(engine.rules()[1].affects(), vec!["c"]);
        }

        #[test]
        fn test_cycle_is_rejected() {
            let cyclic = vec![
                DependencyRule::Satellite {
                    parent: "a".into(),
                    satellite: "b".into(),
                },
                DependencyRule::Satellite {
                    parent: "b".into(),
                    satellite: "a".into(),
                },
            ];
            let err = DependencyEngine::new(cyclic).unwrap_err();
            assert!(matches!(err, RuleError::Cycle { ref fields } if fields.len() == 2));
        }

        #[test]
        fn test_satellites_discovered_from_document() {
            let d = doc();
            let e = engine(&d);
            assert!(e.rules().contains(&DependencyRule::Satellite {
                parent: "q2_type".into(),
                satellite: "q2_type_other".into()
            }));
        }
    }

    mod mirroring {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_toggle_on_copies_and_disables() {
            let mut d = doc();
            let e = engine(&d);
            d.set_text("q3b_residence", "123 MAIN ST");
            d.set_checked("q3b_mailing_same", None, true);
            e.reconcile(&mut d, &["q3b_mailing_same"], ReconcileCause::User);
            assert_eq!(d.text_value("q3c_mailing"), Some("123 MAIN ST"));
            assert!(d.is_disabled("q3c_mailing"));
        }

        #[test]
        fn test_source_input_keeps_copying() {
            let mut d = doc();
            let e = engine(&d);
            d.set_checked("q3b_mailing_same", None, true);
            e.reconcile(&mut d, &["q3b_mailing_same"], ReconcileCause::User);
            d.set_text("q3b_residence", "9 ELM");
            e.reconcile(&mut d, &["q3b_residence"], ReconcileCause::User);
            assert_eq!(d.text_value("q3c_mailing"), Some("9 ELM"));
        }

        #[test]
        fn test_toggle_off_reenables_without_clearing() {
            let mut d = doc();
            let e = engine(&d);
            d.set_text("q3b_residence", "123 MAIN ST");
            d.set_checked("q3b_mailing_same", None, true);
            e.reconcile(&mut d, &["q3b_mailing_same"], ReconcileCause::User);
            d.set_checked("q3b_mailing_same", None, false);
            e.reconcile(&mut d, &["q3b_mailing_same"], ReconcileCause::User);
            assert!(!d.is_disabled("q3c_mailing"));
            assert_eq!(d.text_value("q3c_mailing"), Some("123 MAIN ST"));
        }

        #[test]
        fn test_locked_destination_is_left_alone() {
            let mut d = doc();
            let e = engine(&d);
            d.set_text("q3c_mailing", "PO BOX 1");
            d.set_disabled("q3c_mailing", true);
            d.set_locked("q3c_mailing", true);
            d.set_checked("q3b_mailing_same", None, true);
            e.reconcile(&mut d, &["q3b_mailing_same"], ReconcileCause::User);
            assert_eq!(d.text_value("q3c_mailing"), Some("PO BOX 1"));
        }
    }

    mod satellites {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_other_enables_and_focuses() {
            let mut d = doc();
            let e = engine(&d);
            e.reconcile_all(&mut d, ReconcileCause::Load);
            assert!(d.is_disabled("q2_type_other"));

            d.select_option("q2_type", Some("OTHER"));
            e.reconcile(&mut d, &["q2_type"], ReconcileCause::User);
            assert!(!d.is_disabled("q2_type_other"));
            assert_eq!(d.focused(), Some("q2_type_other"));
        }

        #[test]
        fn test_leaving_other_clears_value() {
            let mut d = doc();
            let e = engine(&d);
            d.select_option("q2_type", Some("OTHER"));
            d.set_text("q2_type_other", "LLC");
            d.select_option("q2_type", Some("INDIVIDUAL"));
            e.reconcile(&mut d, &["q2_type"], ReconcileCause::User);
            assert!(d.is_disabled("q2_type_other"));
            assert_eq!(d.text_value("q2_type_other"), Some(""));
        }

        #[test]
        fn test_load_does_not_steal_focus() {
            let mut d = doc();
            let e = engine(&d);
            d.set_disabled("q2_type_other", true);
            d.select_option("q2_type", Some("OTHER"));
            e.reconcile_all(&mut d, ReconcileCause::Load);
            assert!(!d.is_disabled("q2_type_other"));
            assert!(d.focused().is_none());
        }
    }

    mod three_state {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_unanswered_governing_disables_and_clears() {
            let mut d = doc();
            let e = engine(&d);
            d.select_option("q11m_exception", Some("YES"));
            e.reconcile_all(&mut d, ReconcileCause::Load);
            assert!(d.is_disabled("q11m_exception"));
            assert!(d.checked_options("q11m_exception").is_empty());
        }

        #[test]
        fn test_enabling_answer_opens_real_options() {
            let mut d = doc();
            let e = engine(&d);
            d.select_option("q11l_nonimmigrant", Some("YES"));
            e.reconcile(&mut d, &["q11l_nonimmigrant"], ReconcileCause::User);
            assert_eq!(enabled_options(&d, "q11m_exception"), vec!["YES", "NO"]);
            assert!(d.checked_options("q11m_exception").is_empty());
        }

        #[test]
        fn test_other_answer_forces_not_applicable() {
            let mut d = doc();
            let e = engine(&d);
            d.select_option("q11l_nonimmigrant", Some("YES"));
            e.reconcile(&mut d, &["q11l_nonimmigrant"], ReconcileCause::User);
            d.select_option("q11m_exception", Some("YES"));
            d.select_option("q11l_nonimmigrant", Some("NO"));
            e.reconcile(&mut d, &["q11l_nonimmigrant"], ReconcileCause::User);
            assert_eq!(enabled_options(&d, "q11m_exception"), vec!["NA"]);
            assert_eq!(d.checked_options("q11m_exception"), vec!["NA"]);
        }
    }

    mod bulk_default {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_sets_every_answer_and_constrained_default() {
            let mut d = doc();
            let e = engine(&d);
            e.reconcile_all(&mut d, ReconcileCause::Load);
            d.select_option("q11a_felony", Some("YES"));
            let t = table();
            e.apply_bulk_default(&mut d, t.bulk_default("all_no").unwrap());

            assert_eq!(d.checked_options("q11a_felony"), vec!["NO"]);
            assert_eq!(d.checked_options("q11l_nonimmigrant"), vec!["NO"]);
            assert_eq!(d.checked_options("q11m_exception"), vec!["NA"]);
            assert_eq!(enabled_options(&d, "q11m_exception"), vec!["NA"]);
        }

        #[test]
        fn test_missing_fields_are_skipped() {
            let mut d = FormDocument::builder()
                .radio("q11a_felony", "Felony", &["YES", "NO"])
                .build();
            let e = DependencyEngine::for_document(&table(), &d).unwrap();
            let t = table();
            e.apply_bulk_default(&mut d, t.bulk_default("all_no").unwrap());
            assert_eq!(d.checked_options("q11a_felony"), vec!["NO"]);
        }
    }
}
