use crate::app::App;
use chrono::Utc;
use cosmic::api::ReactionKind;
use cosmic::detail::{DetailState, Panel};
use cosmic::util::{format_relative_time, single_line, strip_control_chars};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the open post with its reactions and comments
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let open = match app.controller.detail().state() {
        DetailState::Closed => {
            let paragraph = Paragraph::new("No post open")
                .block(Block::default().borders(Borders::ALL).title("Post"));
            f.render_widget(paragraph, area);
            return;
        }
        DetailState::Loading { .. } => {
            let paragraph = Paragraph::new("Loading post...")
                .block(Block::default().borders(Borders::ALL).title("Post"));
            f.render_widget(paragraph, area);
            return;
        }
        DetailState::Open(open) => open,
    };

    let post = &open.post;
    let now = Utc::now();
    let dim = Style::default().fg(Color::DarkGray);
    let heading = Style::default().add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(single_line(&post.display_title()), heading)),
        Line::from(Span::styled(
            format!(
                "{} • {} • {} views • {}",
                single_line(&post.author_id),
                single_line(post.category_id.as_deref().unwrap_or("general")),
                post.views,
                format_relative_time(post.created_at.as_deref(), now),
            ),
            dim,
        )),
    ];
    if !post.tags.is_empty() {
        let tags = post
            .tags
            .iter()
            .map(|t| format!("#{}", single_line(t)))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(Line::from(Span::styled(tags, Style::default().fg(Color::Cyan))));
    }
    if let Some(media) = post.media_url() {
        lines.push(Line::from(Span::styled(
            format!("Media: {} (o to open)", single_line(media)),
            Style::default().fg(Color::Blue),
        )));
    }
    lines.push(Line::from(""));

    for line in strip_control_chars(&post.content).lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::from(""));

    // Reactions
    lines.push(Line::from(Span::styled("Reactions", heading)));
    match &open.reactions {
        Panel::Loading => lines.push(Line::from(Span::styled("Loading...", dim))),
        Panel::Failed(e) => lines.push(Line::from(Span::styled(
            format!("Failed to load reactions: {}", single_line(e)),
            Style::default().fg(Color::Red),
        ))),
        Panel::Loaded(_) => {
            let counts = ReactionKind::ALL
                .iter()
                .map(|kind| format!("{} {}", kind, open.reaction_count(kind.as_str())))
                .collect::<Vec<_>>()
                .join("   ");
            lines.push(Line::from(counts));
        }
    }
    lines.push(Line::from(""));

    // Comments
    match &open.comments {
        Panel::Loading => {
            lines.push(Line::from(Span::styled("Comments", heading)));
            lines.push(Line::from(Span::styled("Loading...", dim)));
        }
        Panel::Failed(e) => {
            lines.push(Line::from(Span::styled("Comments", heading)));
            lines.push(Line::from(Span::styled(
                format!("Failed to load comments: {}", single_line(e)),
                Style::default().fg(Color::Red),
            )));
        }
        Panel::Loaded(comments) => {
            lines.push(Line::from(Span::styled(
                format!("Comments ({})", comments.len()),
                heading,
            )));
            if comments.is_empty() {
                lines.push(Line::from(Span::styled("No comments yet", dim)));
            }
            for comment in comments {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{} ", single_line(&comment.user_id)),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        format_relative_time(comment.created_at.as_deref(), now),
                        dim,
                    ),
                ]));
                for line in strip_control_chars(&comment.content).lines() {
                    lines.push(Line::from(format!("  {}", line)));
                }
            }
        }
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title("Post"),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));

    f.render_widget(paragraph, area);
}
