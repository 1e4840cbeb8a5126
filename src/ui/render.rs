//! Render functions for the TUI.
//!
//! This module handles all rendering logic, dispatching to the appropriate
//! view based on application state.

use crate::app::{App, ConfirmAction, InputMode};
use cosmic::controller::View;
use cosmic::util::truncate_to_width;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::{compose, help, post_view, posts, profile, status, tags};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
///
/// Routes to the appropriate view renderer based on current application state.
/// Handles terminal size validation before rendering.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    // Three rows: tab bar, main view, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_tabs(f, app, chunks[0]);

    match app.view() {
        View::Home | View::Mine | View::Search => {
            if let Some(kind) = app.view().feed() {
                posts::render(f, app, kind, chunks[1]);
            }
        }
        View::Detail => post_view::render(f, app, chunks[1]),
        View::Compose => compose::render(f, app, chunks[1]),
        View::Profile => profile::render(f, app, chunks[1]),
        View::Tags => tags::render(f, app, chunks[1]),
    }

    status::render(f, app, chunks[2]);

    if app.input_mode != InputMode::Normal {
        render_prompt_overlay(f, app);
    }

    if app.show_help {
        help::render(f);
    }

    if let Some(ref confirm) = app.pending_confirm {
        render_confirm_overlay(f, confirm);
    }
}

/// Render the tab bar with the active view highlighted.
fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let current = app.view();
    let mut spans = Vec::new();
    for (i, view) in View::TABS.iter().enumerate() {
        let style = if *view == current {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, view.label()), style));
        spans.push(Span::raw(" "));
    }
    if matches!(current, View::Detail | View::Compose) {
        spans.push(Span::styled(
            format!(" {} ", current.label()),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
    }

    let user = match app.controller.session().username() {
        Some(name) => format!("@{}", name),
        None => "signed out".to_string(),
    };
    let used: usize = spans.iter().map(|s| s.width()).sum();
    let room = (area.width as usize).saturating_sub(used + 1);
    if room > 2 {
        let user = truncate_to_width(&user, room).into_owned();
        let pad = room.saturating_sub(cosmic::util::display_width(&user));
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled(user, Style::default().fg(Color::DarkGray)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Center a `width` x `height` rectangle in `area`.
pub(super) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Render the single-line prompt overlay (search, tag, comment, register).
fn render_prompt_overlay(f: &mut Frame, app: &App) {
    let overlay = centered(f.area(), 60, 5);
    if overlay.width < 20 || overlay.height < 3 {
        return;
    }

    // Keep the tail of long input visible.
    let room = overlay.width.saturating_sub(6) as usize;
    let input: String = {
        let chars: Vec<char> = app.input.chars().collect();
        let start = chars.len().saturating_sub(room);
        chars[start..].iter().collect()
    };

    f.render_widget(Clear, overlay);
    let paragraph = Paragraph::new(format!("> {}_\n\n(Enter) Submit  (Esc) Cancel", input)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", app.input_mode.prompt())),
    );
    f.render_widget(paragraph, overlay);
}

/// Render a confirmation dialog overlay centered on screen.
fn render_confirm_overlay(f: &mut Frame, confirm: &ConfirmAction) {
    let text = match confirm {
        ConfirmAction::DeletePost { title, .. } => {
            let title = truncate_to_width(title, 40);
            format!(
                "Delete \"{}\"?\n\nThis cannot be undone.\n\n(y) Confirm  (n/Esc) Cancel",
                title
            )
        }
        ConfirmAction::Logout => {
            "Sign out?\n\nThe stored token will be removed.\n\n(y) Confirm  (n/Esc) Cancel"
                .to_string()
        }
    };

    let overlay = centered(f.area(), 50, 8);
    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Confirm "),
        )
        .alignment(Alignment::Center);

    f.render_widget(paragraph, overlay);
}
