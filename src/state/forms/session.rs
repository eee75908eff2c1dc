//! Form session: routes user events through the engine
//!
//! Every event is settled synchronously: the document is updated, dependent
//! fields are reconciled and the snapshot is written to the address fragment.
//! Keystrokes only schedule the write; the caller drives the schedule with
//! [`FormEvent::Tick`]. Export is the single asynchronous step.

use super::codec::normalize_text;
use super::context::FormContext;
use super::debounce::PersistScheduler;
use super::document::{ControlKind, FieldDescriptor, FormDocument};
use super::field::FormSnapshot;
use super::fragment::{self, Location};
use super::layout::FormLayout;
use super::rules::{DependencyEngine, ReconcileCause, RuleError, RuleTable};
use super::snapshot;
use super::validation::{self, ValidationFailure};
use crate::export::{ExportReceipt, PdfFiller};
use std::time::{Duration, Instant};
use thiserror::Error;

/// A user action on the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// Keystroke-level edit of a text field
    Input { name: String, text: String },
    /// Pick one option of a radio group
    Select { name: String, option: String },
    /// Flip a toggle, or one member of a checkbox group
    Toggle { name: String, option: Option<String> },
    SetDate { name: String, date: String },
    /// Focus left a field
    Blur { name: String },
    Click { button: String },
    /// Time passed; flushes a due write
    Tick,
}

/// Why an export did not produce a document
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{} field(s) need attention: {}", .failures.len(), first_message(.failures))]
    Invalid { failures: Vec<ValidationFailure> },
    #[error("failed to fill document: {0:#}")]
    Filler(anyhow::Error),
}

fn first_message(failures: &[ValidationFailure]) -> &str {
    failures.first().map(|f| f.message.as_str()).unwrap_or_default()
}

pub struct FormSession {
    doc: FormDocument,
    ctx: FormContext,
    rules: RuleTable,
    engine: DependencyEngine,
    location: Box<dyn Location>,
    scheduler: PersistScheduler,
}

impl FormSession {
    pub fn new(
        layout: FormLayout,
        mut ctx: FormContext,
        location: Box<dyn Location>,
        persist_delay: Duration,
    ) -> Result<Self, RuleError> {
        let FormLayout {
            document: doc,
            rules,
        } = layout;
        let engine = DependencyEngine::for_document(&rules, &doc)?;
        ctx.prefill = std::mem::take(&mut ctx.prefill).prepared(&doc, &rules);

        Ok(Self {
            doc,
            ctx,
            rules,
            engine,
            location,
            scheduler: PersistScheduler::new(persist_delay),
        })
    }

    pub fn document(&self) -> &FormDocument {
        &self.doc
    }

    pub fn location(&self) -> &dyn Location {
        self.location.as_ref()
    }

    /// Restore the fragment, apply prefill and settle every rule
    pub fn load(&mut self) {
        let restored = fragment::restore(self.location.as_ref());
        snapshot::deserialize(&mut self.doc, &mut self.ctx, &restored);
        self.apply_prefill(&restored);
        self.engine.reconcile_all(&mut self.doc, ReconcileCause::Load);

        let today = self.ctx.today();
        for name in restored.keys() {
            validation::validate_field(&mut self.doc, &self.rules.validations, name, today);
        }
        tracing::debug!("Loaded {} field(s) from the address", restored.len());
    }

    fn apply_prefill(&mut self, restored: &FormSnapshot) {
        let applied =
            self.ctx
                .prefill
                .apply(&mut self.doc, restored, &self.rules.locked_satellites);
        if !applied.is_empty() {
            tracing::debug!("Prefilled {}", applied.join(", "));
        }
    }

    /// Settle one event at instant `now`
    pub fn handle(&mut self, event: FormEvent, now: Instant) {
        match event {
            FormEvent::Input { name, text } => {
                if !self.accepts_text(&name) {
                    return;
                }
                self.doc.set_text(&name, &text);
                self.engine
                    .reconcile(&mut self.doc, &[name.as_str()], ReconcileCause::User);
                self.scheduler.schedule(now);
            }
            FormEvent::Select { name, option } => {
                if !self.option_enabled(&name, &option) {
                    return;
                }
                self.doc.select_option(&name, Some(&option));
                self.changed(&name);
            }
            FormEvent::Toggle { name, option } => {
                let enabled = match option.as_deref() {
                    Some(option) => self.option_enabled(&name, option),
                    None => self.field_editable(&name),
                };
                if !enabled {
                    return;
                }
                let checked = match option.as_deref() {
                    Some(option) => self.doc.selects(&name, option),
                    None => !self.doc.checked_options(&name).is_empty(),
                };
                self.doc.set_checked(&name, option.as_deref(), !checked);
                self.changed(&name);
            }
            FormEvent::SetDate { name, date } => {
                if self.doc.descriptor(&name) != Some(FieldDescriptor::Date)
                    || !self.field_editable(&name)
                {
                    return;
                }
                self.doc.set_text(&name, date.trim());
                self.validate(&name);
                self.changed(&name);
            }
            FormEvent::Blur { name } => self.blur(&name),
            FormEvent::Click { button } => {
                let Some(bulk) = self.rules.bulk_default(&button) else {
                    tracing::debug!("No action bound to {button}");
                    return;
                };
                self.engine.apply_bulk_default(&mut self.doc, bulk);
                self.persist_now();
            }
            FormEvent::Tick => {
                if self.scheduler.poll(now) {
                    self.write_fragment();
                }
            }
        }
    }

    /// Reformat, validate and persist a field that lost focus
    fn blur(&mut self, name: &str) {
        if self.accepts_text(name) {
            let raw = self.doc.text_value(name).unwrap_or_default();
            let formatted = match self.rules.format_for(name) {
                Some(format) => format.apply(raw),
                None => raw.to_string(),
            };
            let normalized = normalize_text(&formatted);
            if normalized != raw {
                self.doc.set_text(name, &normalized);
                self.engine
                    .reconcile(&mut self.doc, &[name], ReconcileCause::User);
            }
        }
        self.validate(name);
        self.persist_now();
    }

    fn changed(&mut self, name: &str) {
        self.engine
            .reconcile(&mut self.doc, &[name], ReconcileCause::User);
        self.persist_now();
    }

    fn validate(&mut self, name: &str) {
        let today = self.ctx.today();
        validation::validate_field(&mut self.doc, &self.rules.validations, name, today);
    }

    fn field_editable(&self, name: &str) -> bool {
        let editable = self.doc.resolve(name).is_some()
            && !self.doc.is_disabled(name)
            && !self.doc.is_locked(name);
        if !editable {
            tracing::debug!("Ignoring edit of unavailable field {name}");
        }
        editable
    }

    fn accepts_text(&self, name: &str) -> bool {
        let text_like = self.doc.resolve(name).is_some_and(|handle| {
            handle
                .indices()
                .iter()
                .filter_map(|&i| self.doc.control(i))
                .all(|c| c.kind.is_text_like())
        });
        text_like && self.field_editable(name)
    }

    fn option_enabled(&self, name: &str, option: &str) -> bool {
        if self.doc.is_locked(name) {
            return false;
        }
        self.doc.resolve(name).is_some_and(|handle| {
            handle
                .indices()
                .iter()
                .filter_map(|&i| self.doc.control(i))
                .any(|c| c.kind.is_choice() && c.value == option && !c.disabled)
        })
    }

    /// Time until the pending write is due, if one is pending
    pub fn persist_due_in(&self, now: Instant) -> Option<Duration> {
        self.scheduler.time_until_due(now)
    }

    /// Write immediately, superseding any pending write
    pub fn persist_now(&mut self) {
        self.scheduler.cancel();
        self.write_fragment();
    }

    fn write_fragment(&mut self) {
        let snapshot = snapshot::serialize(&self.doc, &self.ctx, &self.rules, false);
        fragment::persist(self.location.as_mut(), &snapshot);
    }

    /// Snapshot as persisted in the fragment
    pub fn snapshot(&self) -> FormSnapshot {
        snapshot::serialize(&self.doc, &self.ctx, &self.rules, false)
    }

    /// Complete view of every answerable field, for document generation
    pub fn export_snapshot(&self) -> FormSnapshot {
        snapshot::serialize(&self.doc, &self.ctx, &self.rules, true)
    }

    /// Validate everything and hand the full snapshot to `filler`
    pub async fn export(&mut self, filler: &dyn PdfFiller) -> Result<ExportReceipt, ExportError> {
        if self.scheduler.flush() {
            self.write_fragment();
        }

        let today = self.ctx.today();
        let failures = validation::validate_all(&mut self.doc, &self.rules.validations, today);
        if let Some(first) = failures.first() {
            self.doc.scroll_into_view(&first.field);
            tracing::info!("Export blocked by {} invalid field(s)", failures.len());
            return Err(ExportError::Invalid { failures });
        }

        let snapshot = self.export_snapshot();
        let receipt = filler.fill(&snapshot).await.map_err(ExportError::Filler)?;
        tracing::info!("Exported {} field(s) to {}", snapshot.len(), receipt.location);
        Ok(receipt)
    }

    /// Address carrying the current state
    pub fn share_url(&mut self) -> String {
        if self.scheduler.flush() {
            self.write_fragment();
        }
        self.location.href()
    }

    /// Current signature payload
    pub fn signature(&self) -> Option<String> {
        if self.ctx.signature.is_empty() {
            None
        } else {
            self.ctx.signature.serialize()
        }
    }

    /// Replace the signature and persist
    pub fn sign(&mut self, payload: Option<String>) {
        self.ctx.signature.deserialize(payload);
        self.persist_now();
    }

    pub fn clear_signature(&mut self) {
        self.ctx.signature.clear();
        self.persist_now();
    }

    /// Start over from the layout defaults and prefill
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.doc.reset();
        self.ctx.signature.clear();
        self.location.replace_fragment(None);
        self.apply_prefill(&FormSnapshot::new());
        self.engine.reconcile_all(&mut self.doc, ReconcileCause::Load);
        tracing::info!("Form reset");
    }

    /// Field that asked for input focus since the last call
    pub fn take_focus(&mut self) -> Option<String> {
        self.doc.take_focus()
    }

    /// Kind of the first control of `name`, for the frontend
    pub fn control_kind(&self, name: &str) -> Option<ControlKind> {
        let handle = self.doc.resolve(name)?;
        let first = *handle.indices().first()?;
        self.doc.control(first).map(|c| c.kind)
    }
}
