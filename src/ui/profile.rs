use crate::app::App;
use cosmic::util::single_line;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the session and server panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = Vec::new();

    match app.controller.session().user() {
        Some(user) => {
            lines.push(Line::from(vec![
                Span::styled("Signed in as ", label),
                Span::styled(
                    single_line(&user.username),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Email        ", label),
                Span::raw(single_line(&user.email)),
            ]));
            lines.push(Line::from(""));
            lines.push(Line::from("[L] sign out"));
        }
        None => {
            lines.push(Line::from("Not signed in."));
            lines.push(Line::from(""));
            lines.push(Line::from("[R] register a new account"));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Server       ", label),
        Span::raw(app.controller.api().base_url().to_string()),
    ]));
    let (status, style) = match app.controller.online() {
        Some(true) => ("online", Style::default().fg(Color::Green)),
        Some(false) => ("offline", Style::default().fg(Color::Red)),
        None => ("unknown (press h)", label),
    };
    lines.push(Line::from(vec![
        Span::styled("Status       ", label),
        Span::styled(status, style),
    ]));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Profile"),
    );
    f.render_widget(paragraph, area);
}
