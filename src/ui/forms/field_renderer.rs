//! Field rendering utilities for the form list

use crate::state::{ControlKind, FieldDescriptor, FormDocument};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::ListItem,
};

const CURSOR: &str = "▌";

/// Editing state of the row being drawn
#[derive(Debug, Clone, Copy, Default)]
pub struct RowFocus<'a> {
    pub is_active: bool,
    pub option_cursor: usize,
    pub date_draft: Option<&'a str>,
}

fn caption_line<'a>(caption: &str, is_active: bool, markers: Vec<Span<'a>>) -> Line<'a> {
    let style = if is_active {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let mut spans = vec![Span::styled(caption.to_string(), style)];
    spans.extend(markers);
    Line::from(spans)
}

fn text_lines<'a>(value: &str, placeholder: &str, editable: bool, is_active: bool) -> Vec<Line<'a>> {
    let style = if editable {
        Style::default().fg(Color::Gray)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let cursor = if is_active && editable { CURSOR } else { "" };

    if value.is_empty() {
        return vec![Line::from(vec![
            Span::raw("  "),
            Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray)),
            Span::styled(cursor, Style::default().fg(Color::Cyan)),
        ])];
    }

    let mut lines: Vec<Line> = value
        .split('\n')
        .map(|l| Line::from(vec![Span::raw("  "), Span::styled(l.to_string(), style)]))
        .collect();
    if let Some(last) = lines.last_mut() {
        last.spans
            .push(Span::styled(cursor, Style::default().fg(Color::Cyan)));
    }
    lines
}

fn choice_line<'a>(doc: &FormDocument, name: &str, focus: RowFocus) -> Line<'a> {
    let mut spans = vec![Span::raw("  ")];
    let Some(handle) = doc.resolve(name) else {
        return Line::from(spans);
    };

    for (position, control) in handle
        .indices()
        .into_iter()
        .filter_map(|i| doc.control(i))
        .enumerate()
    {
        let mark = match (control.kind, control.checked) {
            (ControlKind::Radio, true) => "(•)",
            (ControlKind::Radio, false) => "( )",
            (_, true) => "[x]",
            (_, false) => "[ ]",
        };
        let mut style = if control.disabled {
            Style::default().fg(Color::DarkGray)
        } else if control.checked {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        };
        if focus.is_active && position == focus.option_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(format!("{mark} {}", control.value), style));
        spans.push(Span::raw("  "));
    }
    Line::from(spans)
}

fn toggle_line<'a>(doc: &FormDocument, name: &str, is_active: bool) -> Line<'a> {
    let checked = !doc.checked_options(name).is_empty();
    let label = if checked { "[x] yes" } else { "[ ] no" };
    let mut style = Style::default().fg(if checked { Color::Green } else { Color::Gray });
    if is_active {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Line::from(vec![Span::raw("  "), Span::styled(label, style)])
}

/// List item for one logical field: caption, value and inline message
pub fn field_item<'a>(doc: &FormDocument, name: &str, focus: RowFocus) -> ListItem<'a> {
    let locked = doc.is_locked(name);
    let disabled = doc.is_disabled(name);

    let mut markers = Vec::new();
    if locked {
        markers.push(Span::styled(
            " [LOCKED]",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    } else if disabled {
        markers.push(Span::styled(" (n/a)", Style::default().fg(Color::DarkGray)));
    }

    let mut lines = vec![caption_line(doc.caption(name), focus.is_active, markers)];
    let editable = !locked && !disabled;

    match doc.descriptor(name) {
        Some(FieldDescriptor::SingleChoice | FieldDescriptor::MultiChoice) => {
            lines.push(choice_line(doc, name, focus));
        }
        Some(FieldDescriptor::Toggle) => lines.push(toggle_line(doc, name, focus.is_active)),
        Some(FieldDescriptor::Date) => {
            let value = focus
                .date_draft
                .filter(|_| focus.is_active)
                .or_else(|| doc.text_value(name))
                .unwrap_or_default();
            lines.extend(text_lines(value, "YYYY-MM-DD", editable, focus.is_active));
        }
        Some(FieldDescriptor::Text | FieldDescriptor::Satellite { .. }) => {
            let value = doc.text_value(name).unwrap_or_default();
            lines.extend(text_lines(value, "(empty)", editable, focus.is_active));
        }
        None => {}
    }

    if let Some(message) = doc.invalid(name) {
        lines.push(Line::from(Span::styled(
            format!("  ⚠ {message}"),
            Style::default().fg(Color::Red),
        )));
    }

    ListItem::new(lines)
}

/// List item for the signature row
pub fn signature_item<'a>(signature: Option<&str>, is_active: bool) -> ListItem<'a> {
    let mut lines = vec![caption_line("Signature of transferee", is_active, Vec::new())];
    lines.extend(text_lines(
        signature.unwrap_or_default(),
        "(unsigned)",
        true,
        is_active,
    ));
    ListItem::new(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> FormDocument {
        let mut doc = FormDocument::builder()
            .text("q1_form_name", "1. Form")
            .textarea("q5_reason", "5. Reason")
            .radio("q3i_sex", "3i. Sex", &["MALE", "FEMALE"])
            .date("q3g_dob", "3g. Date of birth", "")
            .build();
        doc.set_text("q5_reason", "LINE ONE\nLINE TWO");
        doc
    }

    #[test]
    fn test_textarea_spans_lines() {
        let item = field_item(&doc(), "q5_reason", RowFocus::default());
        // caption + two value lines
        assert_eq!(item.height(), 3);
    }

    #[test]
    fn test_invalid_adds_message_line() {
        let mut d = doc();
        d.set_invalid("q1_form_name", Some("bad".into()));
        assert_eq!(field_item(&d, "q1_form_name", RowFocus::default()).height(), 3);
    }

    #[test]
    fn test_choice_is_one_line() {
        let focus = RowFocus {
            is_active: true,
            option_cursor: 1,
            date_draft: None,
        };
        assert_eq!(field_item(&doc(), "q3i_sex", focus).height(), 2);
    }

    #[test]
    fn test_signature_row() {
        assert_eq!(signature_item(Some("JANE"), false).height(), 2);
        assert_eq!(signature_item(None, true).height(), 2);
    }
}
