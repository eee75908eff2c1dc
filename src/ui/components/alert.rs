//! Modal alert overlay

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const MAX_WIDTH: u16 = 64;
const PADDING: u16 = 4;

/// Render a centered alert with the message and a dismiss hint
pub fn render_alert_dialog(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let inner_width = MAX_WIDTH.min(area.width).saturating_sub(PADDING + 2).max(1) as usize;
    let wrapped = wrap_text(message, inner_width);

    let dialog_area = centered(area, &wrapped);
    frame.render_widget(Clear, dialog_area);

    let mut content = vec![
        Line::from(Span::styled(
            "Alert",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    content.extend(wrapped.into_iter().map(|l| Line::from(format!("  {l}"))));
    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled("Enter", Style::default().fg(Color::Cyan)),
        Span::raw("/"),
        Span::styled("Esc", Style::default().fg(Color::Cyan)),
        Span::styled(" dismiss", Style::default().fg(Color::DarkGray)),
    ]));

    let dialog = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .style(Style::default().bg(Color::Black));
    frame.render_widget(dialog, dialog_area);
}

/// Area for `lines`: title, blank, body, blank, hint, plus borders
fn centered(area: Rect, lines: &[String]) -> Rect {
    let widest = lines
        .iter()
        .map(|l| l.chars().count() as u16 + 2)
        .max()
        .unwrap_or(0)
        .max("Enter/Esc dismiss".len() as u16);
    let width = (widest + PADDING + 2).min(MAX_WIDTH).min(area.width);
    let height = (lines.len() as u16 + 6).min(area.height);

    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

/// Greedy word wrap by character count; words longer than a line are split
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();
            while chars.len() > max_width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                lines.push(chars.drain(..max_width).collect());
            }
            if chars.is_empty() {
                continue;
            }

            if current_len > 0 && current_len + 1 + chars.len() > max_width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += chars.len();
            current.extend(chars);
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wrap_breaks_on_words() {
        assert_eq!(
            wrap_text("Phone number must look like 555-555-5555", 16),
            vec!["Phone number", "must look like", "555-555-5555"]
        );
    }

    #[test]
    fn test_wrap_keeps_explicit_lines() {
        assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_wrap_counts_chars_not_bytes() {
        assert_eq!(wrap_text("ééé ééé", 7), vec!["ééé ééé"]);
    }

    #[test]
    fn test_centered_fits_small_terminal() {
        let area = Rect::new(0, 0, 20, 5);
        let rect = centered(area, &["x".repeat(40)]);
        assert!(rect.width <= 20);
        assert!(rect.height <= 5);
    }
}
