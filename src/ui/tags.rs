use crate::app::App;
use cosmic::util::{single_line, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the top tags list; Enter filters the home feed by the selected tag
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let tags = app.controller.top_tags();
    let width = (area.width as usize).saturating_sub(12);

    let items: Vec<ListItem> = if tags.is_empty() {
        vec![ListItem::new("No tags")]
    } else {
        tags.iter()
            .enumerate()
            .map(|(i, t)| {
                let style = if i == app.selected_tag {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else {
                    Style::default()
                };
                let name = single_line(&t.tag);
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>6}  ", t.count), Style::default().fg(Color::DarkGray)),
                    Span::styled(format!("#{}", truncate_to_width(&name, width)), style),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Top tags"),
    );

    let mut state = ListState::default();
    if !tags.is_empty() {
        state.select(Some(app.selected_tag));
    }
    f.render_stateful_widget(list, area, &mut state);
}
