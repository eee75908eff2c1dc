//! Application form view

use super::field_renderer::{field_item, signature_item, RowFocus};
use crate::app::App;
use crate::state::FormRow;
use crate::ui::widgets::render_scrollable_list;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Draw the whole form with the current address underneath
pub fn draw_application(frame: &mut Frame, area: Rect, app: &App) {
    let doc = app.session.document();
    let title = match doc.text_value("q1_form_name") {
        Some(name) if !name.trim().is_empty() => format!(" {} ", name.trim()),
        _ => " Application to Transfer ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Fields
            Constraint::Length(1), // Address
        ])
        .split(inner);

    let signature = app.session.signature();
    let items: Vec<ListItem> = app
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let is_active = i == app.state.selected_index;
            match row {
                FormRow::Field(name) => field_item(
                    doc,
                    name,
                    RowFocus {
                        is_active,
                        option_cursor: app.state.option_cursor,
                        date_draft: app.state.date_draft.as_deref(),
                    },
                ),
                FormRow::Signature => signature_item(signature.as_deref(), is_active),
            }
        })
        .collect();

    let list = List::new(items).highlight_symbol("▶ ");
    render_scrollable_list(frame, chunks[0], list, app.state.selected_index);

    let address = Paragraph::new(Line::from(vec![
        Span::styled("link: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.session.location().href(),
            Style::default().fg(Color::Blue),
        ),
    ]));
    frame.render_widget(address, chunks[1]);
}
