use crate::app::App;
use chrono::Utc;
use cosmic::feed::FeedKind;
use cosmic::util::{display_width, format_relative_time, single_line, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render one feed as a post list
pub fn render(f: &mut Frame, app: &App, kind: FeedKind, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let feed = app.controller.feed(kind);
    let selected = app.selected_index(kind);
    let now = Utc::now();

    let items: Vec<ListItem> = if feed.is_empty() {
        let hint = if !feed.is_loaded() {
            "Loading..."
        } else if kind == FeedKind::Search && feed.filters().is_empty() {
            "Press / to search"
        } else {
            "No posts"
        };
        vec![ListItem::new(hint)]
    } else {
        feed.items()
            .iter()
            .enumerate()
            .map(|(i, post)| {
                let age = format_relative_time(post.created_at.as_deref(), now);
                let meta = format!("  {} · {} views  {}", single_line(&post.author_id), post.views, age);

                let title_style = if i == selected {
                    Style::default().bg(Color::DarkGray).fg(Color::White)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };

                // Leave room for borders and the metadata suffix
                let max_title = (area.width as usize)
                    .saturating_sub(2)
                    .saturating_sub(display_width(&meta));
                let title = single_line(&post.display_title());
                let title = truncate_to_width(&title, max_title.max(8)).into_owned();

                let mut spans = vec![Span::styled(title, title_style)];
                spans.push(Span::styled(meta, Style::default().fg(Color::DarkGray)));

                let mut lines = vec![Line::from(spans)];
                if !post.tags.is_empty() {
                    let tags = post
                        .tags
                        .iter()
                        .map(|t| format!("#{}", single_line(t)))
                        .collect::<Vec<_>>()
                        .join(" ");
                    let tags = truncate_to_width(&tags, (area.width as usize).saturating_sub(4));
                    lines.push(Line::from(Span::styled(
                        format!("  {}", tags),
                        Style::default().fg(Color::Cyan),
                    )));
                }
                ListItem::new(lines)
            })
            .collect()
    };

    let mut title = format!("{} ({})", kind.label(), feed.len());
    if !feed.filters().is_empty() {
        title.push_str(&format!(" {}", single_line(&feed.filters().describe())));
    }

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );

    let mut state = ListState::default();
    if !feed.is_empty() {
        state.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}
