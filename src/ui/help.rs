//! Help overlay: static keybinding table grouped by view.

use super::render::centered;
use ratatui::{
    layout::Constraint,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "General",
        &[
            ("1-5", "Switch tab"),
            ("j/k", "Move / scroll"),
            ("r", "Reload current view"),
            ("h", "Check server health"),
            ("?", "Toggle help"),
            ("q / Ctrl+C", "Quit"),
        ],
    ),
    (
        "Post lists",
        &[
            ("Enter", "Open post"),
            ("m", "Load more"),
            ("/", "Search"),
            ("t", "Filter by tag"),
            ("n", "New post"),
            ("e", "Edit selected post"),
            ("d", "Delete selected post"),
        ],
    ),
    (
        "Post",
        &[
            ("b / Esc", "Back"),
            ("l / x / v", "React like / dislike / love"),
            ("u", "Remove reaction"),
            ("a", "Add comment"),
            ("e / d", "Edit / delete"),
            ("o", "Open media link"),
        ],
    ),
    (
        "Compose",
        &[
            ("Tab / S-Tab", "Next / previous field"),
            ("Ctrl+S", "Save"),
            ("Esc", "Cancel"),
        ],
    ),
    (
        "Profile",
        &[("R", "Register"), ("L", "Sign out")],
    ),
];

/// Render the help overlay on top of the current view.
pub fn render(f: &mut Frame) {
    let rows_needed: usize = SECTIONS.iter().map(|(_, keys)| keys.len() + 2).sum();
    let overlay = centered(f.area(), 60, (rows_needed as u16).saturating_add(3));
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    let mut rows: Vec<Row> = Vec::new();
    for (label, keys) in SECTIONS {
        rows.push(Row::new(vec![
            Line::from(Span::styled(
                format!("-- {} --", label),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ]));
        for (key, action) in keys.iter() {
            rows.push(Row::new(vec![format!("  {}", key), action.to_string()]));
        }
        rows.push(Row::new(vec![String::new(), String::new()]));
    }
    rows.pop();

    let widths = [Constraint::Length(16), Constraint::Min(20)];
    let table = Table::new(rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help (? to close) "),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                )
                .bottom_margin(1),
        );

    f.render_widget(table, overlay);
}
