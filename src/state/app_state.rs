//! Application state definitions

use super::forms::FormDocument;
use std::collections::VecDeque;

/// One selectable row of the form view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormRow {
    Field(String),
    Signature,
}

impl FormRow {
    pub fn field_name(&self) -> Option<&str> {
        match self {
            FormRow::Field(name) => Some(name),
            FormRow::Signature => None,
        }
    }
}

/// Rows for `doc`: every logical field in document order, then the signature
pub fn form_rows(doc: &FormDocument) -> Vec<FormRow> {
    doc.field_names()
        .into_iter()
        .map(FormRow::Field)
        .chain(std::iter::once(FormRow::Signature))
        .collect()
}

/// Main application state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Selected row index
    pub selected_index: usize,
    /// Highlighted option within the selected choice field
    pub option_cursor: usize,
    /// Date being typed into the selected date field, committed on Enter or leave
    pub date_draft: Option<String>,
    /// Queue of alerts to show the user
    error_queue: VecDeque<String>,
    /// Transient status message
    pub status_message: Option<String>,
}

impl AppState {
    /// Select a row, resetting per-row editing state
    pub fn select(&mut self, index: usize) {
        self.selected_index = index;
        self.option_cursor = 0;
        self.date_draft = None;
    }

    pub fn cursor_left(&mut self) {
        self.option_cursor = self.option_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self, options: usize) {
        if self.option_cursor + 1 < options {
            self.option_cursor += 1;
        }
    }

    /// Queue an alert
    pub fn push_error(&mut self, message: String) {
        self.error_queue.push_back(message);
    }

    /// Alert currently on screen
    pub fn current_error(&self) -> Option<&str> {
        self.error_queue.front().map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.error_queue.is_empty()
    }

    /// Dismiss the alert on screen, revealing the next one
    pub fn dismiss_error(&mut self) {
        self.error_queue.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod selection {
        use super::*;

        #[test]
        fn test_select_resets_row_state() {
            let mut state = AppState::default();
            state.cursor_right(3);
            state.date_draft = Some("2026".into());
            state.select(4);
            assert_eq!(state.selected_index, 4);
            assert_eq!(state.option_cursor, 0);
            assert!(state.date_draft.is_none());
        }

        #[test]
        fn test_option_cursor_bounds() {
            let mut state = AppState::default();
            state.cursor_left();
            assert_eq!(state.option_cursor, 0);
            state.cursor_right(2);
            state.cursor_right(2);
            assert_eq!(state.option_cursor, 1);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn test_errors_are_shown_in_order() {
            let mut state = AppState::default();
            assert!(!state.has_errors());
            state.push_error("first".into());
            state.push_error("second".into());
            assert_eq!(state.current_error(), Some("first"));
            state.dismiss_error();
            assert_eq!(state.current_error(), Some("second"));
            state.dismiss_error();
            assert!(!state.has_errors());
        }
    }

    #[test]
    fn test_form_rows_end_with_signature() {
        let doc = FormDocument::builder()
            .text("q3a_name", "Name")
            .radio("q3i_sex", "Sex", &["MALE", "FEMALE"])
            .build();
        assert_eq!(
            form_rows(&doc),
            vec![
                FormRow::Field("q3a_name".into()),
                FormRow::Field("q3i_sex".into()),
                FormRow::Signature
            ]
        );
    }
}
