use crate::app::App;
use cosmic::controller::{NoticeLevel, View};
use cosmic::util::single_line;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const SPINNER: [char; super::loop_runner::SPINNER_FRAMES] =
    ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let mut style = Style::default().bg(Color::DarkGray).fg(Color::White);

    let text: Cow<'_, str> = if let Some(notice) = app.controller.notice() {
        if notice.level == NoticeLevel::Error {
            style = Style::default().bg(Color::Red).fg(Color::White);
        }
        Cow::Owned(single_line(&notice.message))
    } else if app.in_flight > 0 {
        let frame = SPINNER[app.spinner_frame % SPINNER.len()];
        Cow::Owned(format!("{} Loading...", frame))
    } else {
        Cow::Borrowed(hints(app.view()))
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}

fn hints(view: View) -> &'static str {
    match view {
        View::Home | View::Mine => {
            "[Enter]open [m]ore [t]ag [n]ew [e]dit [d]elete [r]eload [?]help [q]uit"
        }
        View::Search => "[/]search [t]ag [Enter]open [m]ore [r]eload [?]help [q]uit",
        View::Detail => "[b]ack [l]ike [x]dislike [v]love [u]nreact [a]comment [e]dit [o]pen media",
        View::Compose => "[Tab]next field [Ctrl+S]save [Esc]cancel",
        View::Tags => "[Enter]filter home [j/k]move [r]eload",
        View::Profile => "[R]egister [L]ogout [h]ealth",
    }
}
