//! Application state and core logic

use crate::config::AppConfig;
use crate::export::{FieldSheetFiller, PdfFiller, TypedSignature};
use crate::platform;
use crate::state::{
    form_rows, transfer_application, AppState, ControlKind, ExportError, FieldDescriptor,
    FormContext, FormEvent, FormRow, FormSession, Prefill, SessionLocation, SystemClock,
    ALL_NO_BUTTON,
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::time::{Duration, Instant};

/// Window in which a second Ctrl+C quits
const QUIT_WINDOW: Duration = Duration::from_secs(1);

/// Longest the event loop waits for input
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    /// Form being filled in
    pub session: FormSession,
    /// Document generation backend
    filler: Box<dyn PdfFiller>,
    /// Whether the app should quit
    quit: bool,
    /// Copy/export feedback message
    pub copy_message: Option<String>,
    /// Timestamp of last Ctrl+C press for double-tap quit
    pub last_ctrl_c: Option<Instant>,
}

impl App {
    /// Create a new App instance
    pub fn new(config: &AppConfig, address: Option<String>) -> Result<Self> {
        let (prefill, prefill_error) = match config.load_prefill() {
            Ok(prefill) => (prefill, None),
            Err(err) => {
                tracing::warn!("Continuing without prefill: {err:#}");
                (Prefill::default(), Some(format!("{err:#}")))
            }
        };

        let ctx = FormContext::new(
            Box::new(TypedSignature::new()),
            prefill,
            Box::new(SystemClock),
        );
        let layout = transfer_application(ctx.today());
        let location = SessionLocation::open(
            AppConfig::session_path(),
            config.base_url(),
            address.as_deref(),
        );
        tracing::info!("Session address stored in {}", location.path().display());

        let mut session =
            FormSession::new(layout, ctx, Box::new(location), config.persist_delay())?;
        session.load();

        let filler = FieldSheetFiller::new(config.export_dir());
        let mut app = Self::with_session(session, Box::new(filler));
        if let Some(message) = prefill_error {
            app.push_error(format!("Prefill ignored: {message}"));
        }
        Ok(app)
    }

    /// Wrap an already loaded session
    pub fn with_session(session: FormSession, filler: Box<dyn PdfFiller>) -> Self {
        let mut app = Self {
            state: AppState::default(),
            session,
            filler,
            quit: false,
            copy_message: None,
            last_ctrl_c: None,
        };
        app.select_row(0);
        app
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.state.push_error(message.into());
    }

    pub fn rows(&self) -> Vec<FormRow> {
        form_rows(self.session.document())
    }

    pub fn selected_row(&self) -> Option<FormRow> {
        self.rows().into_iter().nth(self.state.selected_index)
    }

    /// How long the event loop may block before the next tick is needed
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.session
            .persist_due_in(now)
            .map_or(IDLE_POLL, |due| due.min(IDLE_POLL))
    }

    /// Flush a due fragment write
    pub fn tick(&mut self, now: Instant) {
        self.session.handle(FormEvent::Tick, now);
    }

    /// Handle Ctrl+C; the second press within the window quits
    pub fn handle_ctrl_c(&mut self, now: Instant) {
        match self.last_ctrl_c {
            Some(previous) if now.duration_since(previous) <= QUIT_WINDOW => {
                self.session.persist_now();
                self.quit = true;
            }
            _ => {
                self.last_ctrl_c = Some(now);
                self.copy_message = Some("Press Ctrl+C again to quit".to_string());
            }
        }
    }

    /// Handle a key event
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle alert dismissal first (modal)
        if self.state.has_errors() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_error();
            }
            return Ok(());
        }

        // Clear any status messages on key press
        self.copy_message = None;
        self.state.status_message = None;
        let now = Instant::now();

        if platform::is_command(key.modifiers) {
            match key.code {
                KeyCode::Char('e') => self.export().await,
                KeyCode::Char('y') => self.copy_link(),
                KeyCode::Char('n') => self.dispatch(
                    FormEvent::Click {
                        button: ALL_NO_BUTTON.to_string(),
                    },
                    now,
                ),
                KeyCode::Char('k') => {
                    self.session.clear_signature();
                    self.copy_message = Some("Signature cleared".to_string());
                }
                KeyCode::Char('r') => {
                    self.session.reset();
                    self.select_row(0);
                    self.copy_message = Some("Form reset".to_string());
                }
                _ => {}
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Up | KeyCode::BackTab => {
                if self.state.selected_index > 0 {
                    self.leave_row(now);
                    self.select_row(self.state.selected_index - 1);
                }
            }
            KeyCode::Down | KeyCode::Tab => {
                if self.state.selected_index + 1 < self.rows().len() {
                    self.leave_row(now);
                    self.select_row(self.state.selected_index + 1);
                }
            }
            code => self.edit_selected(code, now),
        }
        Ok(())
    }

    fn select_row(&mut self, index: usize) {
        self.state.select(index);
        if let Some(FormRow::Field(name)) = self.selected_row() {
            let doc = self.session.document();
            let checked = doc.checked_options(&name);
            if let Some(position) = doc.options(&name).iter().position(|o| checked.contains(o)) {
                self.state.option_cursor = position;
            }
        }
    }

    fn select_field(&mut self, name: &str) {
        if let Some(index) = self
            .rows()
            .iter()
            .position(|row| row.field_name() == Some(name))
        {
            self.select_row(index);
        }
    }

    /// Commit a date draft and blur the field being left
    fn leave_row(&mut self, now: Instant) {
        let Some(FormRow::Field(name)) = self.selected_row() else {
            return;
        };
        if let Some(date) = self.state.date_draft.take() {
            self.dispatch(
                FormEvent::SetDate {
                    name: name.clone(),
                    date,
                },
                now,
            );
        }
        self.dispatch(FormEvent::Blur { name }, now);
    }

    /// Hand an event to the session and follow any focus request it makes
    fn dispatch(&mut self, event: FormEvent, now: Instant) {
        self.session.handle(event, now);
        if let Some(name) = self.session.take_focus() {
            self.select_field(&name);
        }
    }

    fn edit_selected(&mut self, code: KeyCode, now: Instant) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let name = match row {
            FormRow::Signature => {
                self.edit_signature(code);
                return;
            }
            FormRow::Field(name) => name,
        };
        if !self.check_editable(&name) {
            return;
        }

        match self.session.document().descriptor(&name) {
            Some(FieldDescriptor::Text | FieldDescriptor::Satellite { .. }) => {
                self.edit_text(&name, code, now)
            }
            Some(FieldDescriptor::Date) => self.edit_date(&name, code, now),
            Some(FieldDescriptor::Toggle) => {
                if matches!(code, KeyCode::Char(' ') | KeyCode::Enter) {
                    self.dispatch(FormEvent::Toggle { name, option: None }, now);
                }
            }
            Some(FieldDescriptor::SingleChoice) => {
                if let Some(option) = self.choice_key(&name, code) {
                    self.dispatch(FormEvent::Select { name, option }, now);
                }
            }
            Some(FieldDescriptor::MultiChoice) => {
                if let Some(option) = self.choice_key(&name, code) {
                    self.dispatch(
                        FormEvent::Toggle {
                            name,
                            option: Some(option),
                        },
                        now,
                    );
                }
            }
            None => {}
        }
    }

    /// Explain why a field cannot be edited
    fn check_editable(&mut self, name: &str) -> bool {
        let doc = self.session.document();
        let reason = if doc.is_locked(name) {
            Some("is read-only")
        } else if doc.is_disabled(name) {
            Some("does not apply right now")
        } else {
            None
        };
        match reason {
            Some(reason) => {
                self.state.status_message = Some(format!("{} {reason}", doc.caption(name)));
                false
            }
            None => true,
        }
    }

    fn edit_text(&mut self, name: &str, code: KeyCode, now: Instant) {
        let mut text = self
            .session
            .document()
            .text_value(name)
            .unwrap_or_default()
            .to_string();
        match code {
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Enter if self.session.control_kind(name) == Some(ControlKind::Textarea) => {
                text.push('\n')
            }
            KeyCode::Enter => {
                self.dispatch(
                    FormEvent::Blur {
                        name: name.to_string(),
                    },
                    now,
                );
                return;
            }
            _ => return,
        }
        self.dispatch(
            FormEvent::Input {
                name: name.to_string(),
                text,
            },
            now,
        );
    }

    fn edit_date(&mut self, name: &str, code: KeyCode, now: Instant) {
        let current = self.session.document().text_value(name).unwrap_or_default();
        let draft = self
            .state
            .date_draft
            .get_or_insert_with(|| current.to_string());
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => draft.push(c),
            KeyCode::Backspace => {
                draft.pop();
            }
            KeyCode::Enter => {
                if let Some(date) = self.state.date_draft.take() {
                    self.dispatch(
                        FormEvent::SetDate {
                            name: name.to_string(),
                            date,
                        },
                        now,
                    );
                }
            }
            _ => {}
        }
    }

    /// Move the option cursor, or return the option to act on
    fn choice_key(&mut self, name: &str, code: KeyCode) -> Option<String> {
        let options: Vec<String> = self
            .session
            .document()
            .options(name)
            .into_iter()
            .map(str::to_string)
            .collect();
        match code {
            KeyCode::Left => self.state.cursor_left(),
            KeyCode::Right => self.state.cursor_right(options.len()),
            KeyCode::Char(' ') | KeyCode::Enter => {
                return options.get(self.state.option_cursor).cloned();
            }
            _ => {}
        }
        None
    }

    fn edit_signature(&mut self, code: KeyCode) {
        let mut text = self.session.signature().unwrap_or_default();
        match code {
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => return,
        }
        self.session.sign((!text.is_empty()).then_some(text));
    }

    async fn export(&mut self) {
        match self.session.export(self.filler.as_ref()).await {
            Ok(receipt) => {
                self.copy_message = Some(format!("Exported to {}", receipt.location));
            }
            Err(ExportError::Invalid { failures }) => {
                if let Some(target) = self.session.document().scrolled_to().map(str::to_string) {
                    self.select_field(&target);
                }
                let doc = self.session.document();
                let details: Vec<String> = failures
                    .iter()
                    .map(|f| format!("{}: {}", doc.caption(&f.field), f.message))
                    .collect();
                self.push_error(format!(
                    "Correct these fields before exporting:\n{}",
                    details.join("\n")
                ));
            }
            Err(err) => {
                tracing::error!("Export failed: {err}");
                self.push_error(format!("Export failed: {err}"));
            }
        }
    }

    fn copy_link(&mut self) {
        let url = self.session.share_url();
        match self.copy_to_clipboard(&url) {
            Ok(()) => self.copy_message = Some("Link copied".to_string()),
            Err(err) => {
                tracing::warn!("Clipboard unavailable: {err}");
                self.push_error(format!("Failed to copy link: {err}\n\n{url}"));
            }
        }
    }

    fn copy_to_clipboard(&self, text: &str) -> Result<()> {
        use arboard::Clipboard;
        let mut clipboard = Clipboard::new()?;
        clipboard.set_text(text)?;
        Ok(())
    }
}
