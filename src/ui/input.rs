//! Input handling for the TUI.
//!
//! This module processes keyboard input and dispatches to the appropriate
//! handler based on the current view and mode. Handlers only call controller
//! operations and spawn the tasks they return.

use crate::app::{App, AppEvent, ConfirmAction, InputMode};
use anyhow::Result;
use cosmic::api::ReactionKind;
use cosmic::controller::{ActionError, Task, View};
use cosmic::feed::FeedKind;
use cosmic::form::FormField;
use cosmic::util::{single_line, MAX_FILTER_LENGTH};
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{open_media, spawn_tasks};
use super::Action;

/// Longest comment accepted from the prompt.
const MAX_COMMENT_LENGTH: usize = 2000;

/// Main input dispatch function.
///
/// Routes input to the appropriate handler based on current mode and view.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Help overlay captures all keys when visible
    if app.show_help {
        if matches!(code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            app.show_help = false;
        }
        return Ok(Action::Continue);
    }

    if app.pending_confirm.is_some() {
        return handle_confirm_input(app, code, event_tx).await;
    }

    if app.input_mode != InputMode::Normal {
        handle_prompt_input(app, code, event_tx);
        return Ok(Action::Continue);
    }

    // Ctrl+C quits from anywhere, including the editor
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    if app.view() == View::Compose {
        handle_compose_input(app, code, modifiers, event_tx);
        return Ok(Action::Continue);
    }

    // Global keys
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Char('?') => {
            app.show_help = true;
            return Ok(Action::Continue);
        }
        KeyCode::Char(c @ '1'..='5') => {
            let idx = (c as usize) - ('1' as usize);
            let tasks = app.controller.activate(View::TABS[idx]);
            spawn_tasks(app, tasks, event_tx);
            return Ok(Action::Continue);
        }
        KeyCode::Char('r') => {
            let tasks = app.controller.reload();
            spawn_tasks(app, tasks, event_tx);
            return Ok(Action::Continue);
        }
        KeyCode::Char('h') => {
            app.set_status("Checking server...");
            let tasks = app.controller.check_health();
            spawn_tasks(app, tasks, event_tx);
            return Ok(Action::Continue);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.nav_down();
            return Ok(Action::Continue);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.nav_up();
            return Ok(Action::Continue);
        }
        _ => {}
    }

    match app.view() {
        View::Home | View::Mine | View::Search => handle_feed_input(app, code, event_tx),
        View::Detail => handle_detail_input(app, code, event_tx),
        View::Tags => handle_tags_input(app, code, event_tx),
        View::Profile => handle_profile_input(app, code),
        View::Compose => {}
    }
    Ok(Action::Continue)
}

/// Spawn the tasks of a validated action, or show why it was rejected.
fn dispatch(
    app: &mut App,
    result: Result<Vec<Task>, ActionError>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match result {
        Ok(tasks) => spawn_tasks(app, tasks, event_tx),
        Err(e) => app.reject(e),
    }
}

// ============================================================================
// Feed views
// ============================================================================

fn handle_feed_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Enter => {
            if let Some(post_id) = app.selected_post().map(|p| p.id.clone()) {
                app.detail_scroll = 0;
                let tasks = app.controller.open_post(&post_id);
                spawn_tasks(app, tasks, event_tx);
            }
        }
        KeyCode::Char('m') => {
            let tasks = app.controller.load_more();
            spawn_tasks(app, tasks, event_tx);
        }
        KeyCode::Char('/') => app.begin_input(InputMode::Search),
        KeyCode::Char('t') => app.begin_input(InputMode::Tag),
        KeyCode::Char('n') => {
            if let Err(e) = app.controller.new_draft() {
                app.reject(e);
            } else {
                app.compose_field = FormField::Title;
            }
        }
        KeyCode::Char('e') => {
            if let Some(post) = app.selected_post().cloned() {
                if let Err(e) = app.controller.edit_post(&post) {
                    app.reject(e);
                } else {
                    app.compose_field = FormField::Title;
                }
            }
        }
        KeyCode::Char('d') => {
            if let Some(post) = app.selected_post() {
                let confirm = ConfirmAction::DeletePost {
                    post_id: post.id.clone(),
                    title: single_line(&post.display_title()),
                };
                request_delete(app, confirm);
            }
        }
        _ => {}
    }
}

/// Ask for confirmation, unless the action would be rejected anyway.
fn request_delete(app: &mut App, confirm: ConfirmAction) {
    if !app.controller.session().has_token() {
        app.reject(ActionError::SignInRequired);
        return;
    }
    app.pending_confirm = Some(confirm);
}

// ============================================================================
// Detail view
// ============================================================================

fn handle_detail_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc | KeyCode::Char('b') => {
            app.controller.close_detail();
        }
        KeyCode::Char('l') => {
            let result = app.controller.add_reaction(ReactionKind::Like);
            dispatch(app, result, event_tx);
        }
        KeyCode::Char('x') => {
            let result = app.controller.add_reaction(ReactionKind::Dislike);
            dispatch(app, result, event_tx);
        }
        KeyCode::Char('v') => {
            let result = app.controller.add_reaction(ReactionKind::Love);
            dispatch(app, result, event_tx);
        }
        KeyCode::Char('u') => {
            let result = app.controller.remove_reaction();
            dispatch(app, result, event_tx);
        }
        KeyCode::Char('a') => {
            if app.controller.session().has_token() {
                app.begin_input(InputMode::Comment);
            } else {
                app.reject(ActionError::SignInRequired);
            }
        }
        KeyCode::Char('e') => {
            if let Err(e) = app.controller.edit_open_post() {
                app.reject(e);
            } else {
                app.compose_field = FormField::Title;
            }
        }
        KeyCode::Char('d') => {
            if let Some(open) = app.controller.detail().open_post() {
                let confirm = ConfirmAction::DeletePost {
                    post_id: open.post.id.clone(),
                    title: single_line(&open.post.display_title()),
                };
                request_delete(app, confirm);
            }
        }
        KeyCode::Char('o') => open_media(app, event_tx),
        _ => {}
    }
}

// ============================================================================
// Compose view
// ============================================================================

fn handle_compose_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    if modifiers.contains(KeyModifiers::CONTROL) {
        if code == KeyCode::Char('s') {
            let result = app.controller.save_draft();
            if result.is_ok() {
                app.set_status("Saving...");
            }
            dispatch(app, result, event_tx);
        }
        return;
    }

    let field = app.compose_field;
    match code {
        KeyCode::Esc => {
            app.controller.cancel_draft();
            app.set_status("Draft discarded");
        }
        KeyCode::Tab => app.compose_field = field.next(),
        KeyCode::BackTab => app.compose_field = field.prev(),
        KeyCode::Enter if field.is_multiline() => {
            app.controller.draft_mut().fields.field_mut(field).push('\n');
        }
        KeyCode::Enter => app.compose_field = field.next(),
        KeyCode::Backspace => {
            app.controller.draft_mut().fields.field_mut(field).pop();
        }
        KeyCode::Char(c) => {
            app.controller.draft_mut().fields.field_mut(field).push(c);
        }
        _ => {}
    }
}

// ============================================================================
// Tags and profile
// ============================================================================

fn handle_tags_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    if code == KeyCode::Enter {
        if let Some(tag) = app
            .controller
            .top_tags()
            .get(app.selected_tag)
            .map(|t| t.tag.clone())
        {
            let tasks = app.controller.filter_by_tag(&tag);
            spawn_tasks(app, tasks, event_tx);
        }
    }
}

fn handle_profile_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('R') => app.begin_input(InputMode::RegisterUsername),
        KeyCode::Char('L') => {
            if app.controller.session().has_token() {
                app.pending_confirm = Some(ConfirmAction::Logout);
            } else {
                app.set_status("Not signed in");
            }
        }
        _ => {}
    }
}

// ============================================================================
// Prompt and confirmation
// ============================================================================

fn prompt_limit(mode: InputMode) -> usize {
    match mode {
        InputMode::Comment => MAX_COMMENT_LENGTH,
        _ => MAX_FILTER_LENGTH,
    }
}

fn handle_prompt_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc => app.end_input(),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => {
            if app.input.chars().count() < prompt_limit(app.input_mode) {
                app.input.push(c);
            }
        }
        KeyCode::Enter => submit_prompt(app, event_tx),
        _ => {}
    }
}

fn submit_prompt(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let input = std::mem::take(&mut app.input);
    match app.input_mode {
        InputMode::Normal => {}
        InputMode::Search => {
            app.end_input();
            let tag = app
                .controller
                .feed(FeedKind::Search)
                .filters()
                .tag()
                .map(str::to_string);
            let tasks = app.controller.search(&input, tag.as_deref());
            spawn_tasks(app, tasks, event_tx);
        }
        InputMode::Tag => {
            app.end_input();
            let tasks = app.controller.filter_by_tag(&input);
            spawn_tasks(app, tasks, event_tx);
        }
        InputMode::Comment => {
            app.end_input();
            let result = app.controller.add_comment(&input);
            dispatch(app, result, event_tx);
        }
        InputMode::RegisterUsername => {
            if input.trim().is_empty() {
                app.end_input();
                app.reject(ActionError::MissingRegistration);
                return;
            }
            app.pending_username = Some(input);
            app.input_mode = InputMode::RegisterEmail;
        }
        InputMode::RegisterEmail => {
            let username = app.pending_username.take().unwrap_or_default();
            app.end_input();
            let result = app.controller.register(&username, &input);
            if result.is_ok() {
                app.set_status("Registering...");
            }
            dispatch(app, result, event_tx);
        }
    }
}

async fn handle_confirm_input(
    app: &mut App,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => match app.pending_confirm.take() {
            Some(ConfirmAction::DeletePost { post_id, title }) => {
                app.set_status(format!("Deleting {}...", title));
                let result = app.controller.delete_post(&post_id, true);
                dispatch(app, result, event_tx);
            }
            Some(ConfirmAction::Logout) => {
                app.controller.logout().await?;
                app.clamp_selections();
            }
            None => {}
        },
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_confirm = None;
        }
        _ => {}
    }
    Ok(Action::Continue)
}
