use crate::app::App;
use cosmic::form::FormField;
use cosmic::util::strip_control_chars;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the create/edit form
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 10 || area.height < 12 {
        return;
    }

    let draft = app.controller.draft();
    let heading = match draft.editing_post_id() {
        Some(id) => format!("Edit post {}", id),
        None => "New post".to_string(),
    };

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(heading);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(inner);

    for (field, chunk) in FormField::ALL.iter().zip(chunks.iter()) {
        let focused = *field == app.compose_field;
        let value = strip_control_chars(draft.fields.field(*field));
        let text = if focused {
            format!("{}_", value)
        } else {
            value.into_owned()
        };

        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let mut paragraph = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(field.label()),
        );
        if field.is_multiline() {
            paragraph = paragraph.wrap(Wrap { trim: false });
        }
        f.render_widget(paragraph, *chunk);
    }
}
