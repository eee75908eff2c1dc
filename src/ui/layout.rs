//! Layout components (content area, status bar)

use crate::app::App;
use crate::platform::{COPY_LINK_SHORTCUT, EXPORT_SHORTCUT};
use crate::state::{FieldDescriptor, FormRow};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Instant;

/// Split the screen into content and a one-line status bar
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    (chunks[0], chunks[1])
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];

    // Persistence status
    let saved = if app.session.persist_due_in(Instant::now()).is_some() {
        Span::styled(" ○ ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" ● ", Style::default().fg(Color::Green))
    };
    spans.push(saved);

    // Row-specific hints
    let descriptor = app
        .selected_row()
        .and_then(|row| match row {
            FormRow::Field(name) => app.session.document().descriptor(&name),
            FormRow::Signature => None,
        });
    spans.push(Span::styled(
        get_row_hints(descriptor.as_ref()),
        Style::default().fg(Color::DarkGray),
    ));

    if let Some(msg) = &app.state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Yellow)));
    }

    // Copy message
    if let Some(msg) = &app.copy_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Green)));
    }

    // Quit hint on the right (double Ctrl+C to quit)
    let quit_hint = " ^C^C:quit ";

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);

    let quit_area = Rect {
        x: area.x + area.width.saturating_sub(quit_hint.len() as u16),
        y: area.y,
        width: (quit_hint.len() as u16).min(area.width),
        height: 1,
    };
    let quit_widget =
        Paragraph::new(quit_hint).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
    frame.render_widget(quit_widget, quit_area);
}

/// Get keyboard hints for the selected row
fn get_row_hints(descriptor: Option<&FieldDescriptor>) -> String {
    let edit = match descriptor {
        Some(FieldDescriptor::Toggle) => "Space:toggle",
        Some(FieldDescriptor::SingleChoice) => "←/→:option  Space:select",
        Some(FieldDescriptor::MultiChoice) => "←/→:option  Space:check",
        Some(FieldDescriptor::Date) => "YYYY-MM-DD  Enter:set",
        Some(FieldDescriptor::Text | FieldDescriptor::Satellite { .. }) => "type to edit",
        None => "type to sign  ^K:clear",
    };
    format!(
        "↑/↓:field  {edit}  ^N:all NO  {EXPORT_SHORTCUT}:export  {COPY_LINK_SHORTCUT}:copy link  ^R:reset"
    )
}
