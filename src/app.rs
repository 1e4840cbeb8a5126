//! Terminal front-end state.
//!
//! Everything the engine owns lives in [`Controller`]; `App` only adds what
//! the terminal needs on top: list selections, prompt input, the pending
//! confirmation and redraw bookkeeping.

use std::time::Duration;

use cosmic::api::Post;
use cosmic::controller::{ActionError, Controller, Outcome, View};
use cosmic::feed::FeedKind;
use cosmic::form::FormField;

/// How long a notice stays in the status bar.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

// ============================================================================
// Events
// ============================================================================

/// Events from background tasks
pub enum AppEvent {
    /// A controller task finished; apply it.
    TaskFinished(Outcome),
    /// A background task panicked.
    ///
    /// Fields:
    /// - `task`: Name of the task that panicked (e.g., "load page", "save post")
    /// - `error`: The panic message extracted from the panic payload
    TaskPanicked { task: &'static str, error: String },
    /// The system opener failed for a media link.
    OpenFailed { error: String },
}

// ============================================================================
// Prompts and Dialogs
// ============================================================================

/// What the single-line prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Tag,
    Comment,
    RegisterUsername,
    RegisterEmail,
}

impl InputMode {
    pub fn prompt(self) -> &'static str {
        match self {
            InputMode::Normal => "",
            InputMode::Search => "Search",
            InputMode::Tag => "Tag (empty clears)",
            InputMode::Comment => "Comment",
            InputMode::RegisterUsername => "Username",
            InputMode::RegisterEmail => "Email",
        }
    }
}

/// Pending confirmation action for destructive operations.
pub enum ConfirmAction {
    DeletePost { post_id: String, title: String },
    Logout,
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    pub controller: Controller,

    /// Selected row per feed, indexed by [`feed_slot`].
    selected_post: [usize; 3],
    pub selected_tag: usize,
    pub detail_scroll: u16,

    pub input_mode: InputMode,
    pub input: String,
    /// Username held while the email prompt is shown.
    pub pending_username: Option<String>,

    pub compose_field: FormField,
    pub pending_confirm: Option<ConfirmAction>,
    pub show_help: bool,

    /// Tasks spawned and not yet applied.
    pub in_flight: usize,
    pub spinner_frame: usize,
    pub needs_redraw: bool,
}

fn feed_slot(kind: FeedKind) -> usize {
    match kind {
        FeedKind::Home => 0,
        FeedKind::Mine => 1,
        FeedKind::Search => 2,
    }
}

impl App {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller,
            selected_post: [0; 3],
            selected_tag: 0,
            detail_scroll: 0,
            input_mode: InputMode::Normal,
            input: String::new(),
            pending_username: None,
            compose_field: FormField::Title,
            pending_confirm: None,
            show_help: false,
            in_flight: 0,
            spinner_frame: 0,
            needs_redraw: true,
        }
    }

    pub fn view(&self) -> View {
        self.controller.view()
    }

    pub fn selected_index(&self, kind: FeedKind) -> usize {
        self.selected_post[feed_slot(kind)]
    }

    /// Post under the cursor in the current feed view.
    pub fn selected_post(&self) -> Option<&Post> {
        let kind = self.view().feed()?;
        self.controller.feed(kind).get(self.selected_index(kind))
    }

    pub fn nav_up(&mut self) {
        match self.view() {
            View::Home | View::Mine | View::Search => {
                if let Some(kind) = self.view().feed() {
                    let slot = &mut self.selected_post[feed_slot(kind)];
                    *slot = slot.saturating_sub(1);
                }
            }
            View::Tags => self.selected_tag = self.selected_tag.saturating_sub(1),
            View::Detail => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            View::Compose => self.compose_field = self.compose_field.prev(),
            View::Profile => {}
        }
    }

    pub fn nav_down(&mut self) {
        match self.view() {
            View::Home | View::Mine | View::Search => {
                if let Some(kind) = self.view().feed() {
                    let len = self.controller.feed(kind).len();
                    let slot = &mut self.selected_post[feed_slot(kind)];
                    if *slot + 1 < len {
                        *slot += 1;
                    }
                }
            }
            View::Tags => {
                if self.selected_tag + 1 < self.controller.top_tags().len() {
                    self.selected_tag += 1;
                }
            }
            View::Detail => self.detail_scroll = self.detail_scroll.saturating_add(1),
            View::Compose => self.compose_field = self.compose_field.next(),
            View::Profile => {}
        }
    }

    /// Keep selections inside their lists after a reload shrank them.
    pub fn clamp_selections(&mut self) {
        for kind in FeedKind::ALL {
            let len = self.controller.feed(kind).len();
            let slot = &mut self.selected_post[feed_slot(kind)];
            *slot = (*slot).min(len.saturating_sub(1));
        }
        let tags = self.controller.top_tags().len();
        self.selected_tag = self.selected_tag.min(tags.saturating_sub(1));
    }

    pub fn begin_input(&mut self, mode: InputMode) {
        self.input_mode = mode;
        self.input.clear();
    }

    pub fn end_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
        self.pending_username = None;
    }

    /// Surface a validation failure.
    pub fn reject(&mut self, e: ActionError) {
        tracing::debug!(error = %e, "Action rejected");
        self.controller.error(e.to_string());
    }

    /// Set status message (cleared after [`NOTICE_TTL`]).
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.controller.info(msg);
    }

    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        self.controller.clear_expired_notice(NOTICE_TTL)
    }
}
