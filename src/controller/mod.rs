//! The view-state engine.
//!
//! [`Controller`] owns every piece of client state: the three feeds, the
//! detail view, the live draft, the active view and the latest notice. It is
//! created once per process and handed to the front-end by reference.
//!
//! Operations never touch the network themselves. They validate, update
//! local state and return [`Task`]s. Running a task yields an [`Outcome`],
//! and [`Controller::apply`] folds it back into state, possibly returning
//! follow-up tasks (the reloads that keep feeds consistent after a
//! mutation). The terminal UI spawns tasks and applies outcomes as they
//! arrive; [`Controller::run`] does the same sequentially for the CLI and
//! tests.
//!
//! Reconciliation after a mutation is always a full reload of the affected
//! feeds from offset 0, never a local patch.

mod task;

pub use task::{Outcome, Task};

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Result;
use thiserror::Error;

use crate::api::{ApiClient, ApiError, Post, ReactionKind, RegisterResponse, TagCount, User};
use crate::detail::PostDetail;
use crate::feed::{FeedFilters, FeedKind, FeedState, PageOutcome};
use crate::form::{Draft, FormError};
use crate::session::SessionStore;

/// Notice shown when a gated action is attempted without a session, and
/// for 401 responses.
pub const SIGN_IN_PROMPT: &str = "Please sign in (register from the Profile view)";
pub const NO_MORE_POSTS: &str = "No more posts";
pub const NO_TOKEN_RETURNED: &str = "No token returned";

/// Validation failures. All are raised before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Please sign in (register from the Profile view)")]
    SignInRequired,
    #[error("No post is open")]
    NoOpenPost,
    #[error("Deletion not confirmed")]
    NotConfirmed,
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("Comment cannot be empty")]
    EmptyComment,
    #[error("Username and email are required")]
    MissingRegistration,
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Mine,
    Search,
    Detail,
    Compose,
    Profile,
    Tags,
}

impl View {
    /// Views reachable directly from the tab bar.
    pub const TABS: [View; 5] = [View::Home, View::Mine, View::Search, View::Tags, View::Profile];

    pub fn label(self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Mine => "My posts",
            View::Search => "Search",
            View::Detail => "Post",
            View::Compose => "Compose",
            View::Profile => "Profile",
            View::Tags => "Top tags",
        }
    }

    pub fn feed(self) -> Option<FeedKind> {
        match self {
            View::Home => Some(FeedKind::Home),
            View::Mine => Some(FeedKind::Mine),
            View::Search => Some(FeedKind::Search),
            _ => None,
        }
    }

    /// Detail and Compose sit on top of another view and return to it.
    fn is_overlay(self) -> bool {
        matches!(self, View::Detail | View::Compose)
    }
}

// ============================================================================
// Notices
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Latest user-visible message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: Instant,
}

impl Notice {
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.raised_at.elapsed() >= ttl
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Tunables taken from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub page_size: usize,
    pub top_tags_limit: usize,
    pub increment_views_on_open: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: 10,
            top_tags_limit: 10,
            increment_views_on_open: true,
        }
    }
}

pub struct Controller {
    api: ApiClient,
    session: SessionStore,
    settings: Settings,
    view: View,
    previous_view: View,
    home: FeedState,
    mine: FeedState,
    search: FeedState,
    detail: PostDetail,
    draft: Draft,
    top_tags: Vec<TagCount>,
    online: Option<bool>,
    notice: Option<Notice>,
}

impl Controller {
    pub fn new(api: ApiClient, settings: Settings) -> Self {
        let session = api.session().clone();
        Self {
            home: FeedState::new(FeedKind::Home, settings.page_size),
            mine: FeedState::new(FeedKind::Mine, settings.page_size),
            search: FeedState::new(FeedKind::Search, settings.page_size),
            api,
            session,
            settings,
            view: View::Home,
            previous_view: View::Home,
            detail: PostDetail::default(),
            draft: Draft::default(),
            top_tags: Vec::new(),
            online: None,
            notice: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn feed(&self, kind: FeedKind) -> &FeedState {
        match kind {
            FeedKind::Home => &self.home,
            FeedKind::Mine => &self.mine,
            FeedKind::Search => &self.search,
        }
    }

    fn feed_mut(&mut self, kind: FeedKind) -> &mut FeedState {
        match kind {
            FeedKind::Home => &mut self.home,
            FeedKind::Mine => &mut self.mine,
            FeedKind::Search => &mut self.search,
        }
    }

    pub fn detail(&self) -> &PostDetail {
        &self.detail
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn top_tags(&self) -> &[TagCount] {
        &self.top_tags
    }

    /// Result of the last health probe, `None` before the first one.
    pub fn online(&self) -> Option<bool> {
        self.online
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Drop the notice if it is older than `ttl`. Returns true if one was dropped.
    pub fn clear_expired_notice(&mut self, ttl: Duration) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(ttl)) {
            self.notice = None;
            return true;
        }
        false
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn raise(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?level, %message, "Notice");
        self.notice = Some(Notice {
            level,
            message,
            raised_at: Instant::now(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.raise(NoticeLevel::Info, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.raise(NoticeLevel::Error, message);
    }

    /// Surface a failed call. 401s become a sign-in prompt.
    fn report(&mut self, what: &str, e: &ApiError) {
        tracing::warn!(action = what, error = %e, "Request failed");
        if e.is_unauthorized() {
            self.error(SIGN_IN_PROMPT);
        } else {
            self.error(e.to_string());
        }
    }

    /// Username of the signed-in user, or `SignInRequired`.
    fn require_session(&self) -> Result<String, ActionError> {
        if !self.session.has_token() {
            return Err(ActionError::SignInRequired);
        }
        self.session.username().ok_or(ActionError::SignInRequired)
    }

    /// Id of the loaded post. A post still loading does not count.
    fn require_open_post(&self) -> Result<String, ActionError> {
        self.detail
            .open_post()
            .map(|open| open.post.id.clone())
            .ok_or(ActionError::NoOpenPost)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    fn enter(&mut self, view: View) {
        if !self.view.is_overlay() {
            self.previous_view = self.view;
        }
        self.view = view;
    }

    /// Show `view` and start whatever load it needs.
    ///
    /// Leaving the detail view closes it. Feed views always reload with their
    /// current filters.
    pub fn activate(&mut self, view: View) -> Vec<Task> {
        if view != View::Detail && !self.detail.is_closed() {
            self.detail.close();
        }
        self.enter(view);

        match view {
            View::Home | View::Mine | View::Search => {
                let kind = view.feed().unwrap_or(FeedKind::Home);
                self.refresh_feed(kind).into_iter().collect()
            }
            View::Tags => self.load_top_tags(),
            View::Detail | View::Compose | View::Profile => Vec::new(),
        }
    }

    /// Reload whatever the current view shows.
    pub fn reload(&mut self) -> Vec<Task> {
        match self.view {
            View::Home | View::Mine | View::Search => {
                let kind = self.view.feed().unwrap_or(FeedKind::Home);
                self.refresh_feed(kind).into_iter().collect()
            }
            View::Detail => self.refresh_detail(),
            View::Tags => self.load_top_tags(),
            View::Profile => self.check_health(),
            View::Compose => Vec::new(),
        }
    }

    /// Reload `kind` from offset 0 with its current filters.
    ///
    /// The caller's own feed is cleared instead when there is no session.
    pub fn refresh_feed(&mut self, kind: FeedKind) -> Option<Task> {
        if kind.requires_auth() && !self.session.has_token() {
            self.mine.clear();
            if self.view == View::Mine {
                self.info(SIGN_IN_PROMPT);
            }
            return None;
        }
        Some(Task::LoadPage(self.feed(kind).refresh_request()))
    }

    /// Fetch the next page of the current feed.
    pub fn load_more(&mut self) -> Vec<Task> {
        let Some(kind) = self.view.feed() else {
            return Vec::new();
        };
        if kind.requires_auth() && !self.session.has_token() {
            self.info(SIGN_IN_PROMPT);
            return Vec::new();
        }
        let feed = self.feed(kind);
        let request = if feed.is_loaded() {
            feed.load_more_request()
        } else {
            feed.refresh_request()
        };
        vec![Task::LoadPage(request)]
    }

    /// Show search results for `q`, optionally narrowed by `tag`.
    pub fn search(&mut self, q: &str, tag: Option<&str>) -> Vec<Task> {
        if !self.detail.is_closed() {
            self.detail.close();
        }
        self.enter(View::Search);
        let request = self.search.reload_request(FeedFilters::new(tag, Some(q)));
        vec![Task::LoadPage(request)]
    }

    /// Constrain a feed by tag; a blank tag clears the constraint.
    ///
    /// In the search view the tag combines with the current query; anywhere
    /// else it applies to the home feed.
    pub fn filter_by_tag(&mut self, tag: &str) -> Vec<Task> {
        if self.view == View::Search {
            let q = self.search.filters().q().map(str::to_string);
            let request = self
                .search
                .reload_request(FeedFilters::new(Some(tag), q.as_deref()));
            return vec![Task::LoadPage(request)];
        }
        if !self.detail.is_closed() {
            self.detail.close();
        }
        self.enter(View::Home);
        let request = self.home.reload_request(FeedFilters::new(Some(tag), None));
        vec![Task::LoadPage(request)]
    }

    // ========================================================================
    // Detail
    // ========================================================================

    pub fn open_post(&mut self, post_id: &str) -> Vec<Task> {
        self.detail.begin_open(post_id);
        self.enter(View::Detail);
        vec![Task::OpenPost {
            post_id: post_id.to_string(),
            increment_view: self.settings.increment_views_on_open,
        }]
    }

    /// Re-fetch the open post without counting a view. No-op when closed.
    pub fn refresh_detail(&mut self) -> Vec<Task> {
        match self.detail.open_id() {
            Some(post_id) => vec![Task::OpenPost {
                post_id: post_id.to_string(),
                increment_view: false,
            }],
            None => Vec::new(),
        }
    }

    pub fn close_detail(&mut self) {
        self.detail.close();
        if self.view == View::Detail {
            self.view = self.previous_view;
        }
    }

    // ========================================================================
    // Drafts
    // ========================================================================

    /// Start an empty create-mode draft.
    pub fn new_draft(&mut self) -> Result<(), ActionError> {
        self.require_session()?;
        self.draft.reset();
        self.enter(View::Compose);
        Ok(())
    }

    /// Load `post` into the draft; the next save updates it.
    pub fn edit_post(&mut self, post: &Post) -> Result<(), ActionError> {
        self.require_session()?;
        self.draft = Draft::edit(post);
        self.enter(View::Compose);
        Ok(())
    }

    pub fn edit_open_post(&mut self) -> Result<(), ActionError> {
        self.require_session()?;
        let post = self
            .detail
            .open_post()
            .map(|open| open.post.clone())
            .ok_or(ActionError::NoOpenPost)?;
        self.edit_post(&post)
    }

    /// Validate the draft and send it: create without a target id, update with one.
    pub fn save_draft(&mut self) -> Result<Vec<Task>, ActionError> {
        let author = self.require_session()?;
        let request = self.draft.save_request(&author)?;
        tracing::debug!(target = ?request.target, "Saving draft");
        Ok(vec![Task::SavePost(request)])
    }

    /// Discard the draft and go back.
    pub fn cancel_draft(&mut self) {
        self.draft.reset();
        if self.view == View::Compose {
            self.view = if self.detail.is_closed() {
                self.previous_view
            } else {
                View::Detail
            };
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn delete_post(&mut self, post_id: &str, confirmed: bool) -> Result<Vec<Task>, ActionError> {
        self.require_session()?;
        if !confirmed {
            return Err(ActionError::NotConfirmed);
        }
        Ok(vec![Task::DeletePost {
            post_id: post_id.to_string(),
        }])
    }

    pub fn add_reaction(&mut self, kind: ReactionKind) -> Result<Vec<Task>, ActionError> {
        self.require_session()?;
        let post_id = self.require_open_post()?;
        Ok(vec![Task::AddReaction { post_id, kind }])
    }

    pub fn remove_reaction(&mut self) -> Result<Vec<Task>, ActionError> {
        self.require_session()?;
        let post_id = self.require_open_post()?;
        Ok(vec![Task::RemoveReaction { post_id }])
    }

    pub fn add_comment(&mut self, text: &str) -> Result<Vec<Task>, ActionError> {
        self.require_session()?;
        let post_id = self.require_open_post()?;
        let content = text.trim();
        if content.is_empty() {
            return Err(ActionError::EmptyComment);
        }
        Ok(vec![Task::AddComment {
            post_id,
            content: content.to_string(),
        }])
    }

    // ========================================================================
    // Session and server
    // ========================================================================

    pub fn register(&mut self, username: &str, email: &str) -> Result<Vec<Task>, ActionError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() {
            return Err(ActionError::MissingRegistration);
        }
        Ok(vec![Task::Register {
            user: User {
                username: username.to_string(),
                email: email.to_string(),
            },
        }])
    }

    /// Sign out: session cleared, own posts dropped, any draft discarded.
    pub async fn logout(&mut self) -> Result<()> {
        self.session.logout().await?;
        self.mine.clear();
        self.draft.reset();
        if matches!(self.view, View::Mine | View::Compose) {
            self.view = View::Home;
        }
        self.info("Signed out");
        Ok(())
    }

    pub fn check_health(&mut self) -> Vec<Task> {
        vec![Task::CheckHealth]
    }

    pub fn load_top_tags(&mut self) -> Vec<Task> {
        vec![Task::LoadTopTags {
            limit: self.settings.top_tags_limit,
        }]
    }

    // ========================================================================
    // Applying outcomes
    // ========================================================================

    /// Fold a finished task into state. Returns follow-up tasks.
    pub async fn apply(&mut self, outcome: Outcome) -> Vec<Task> {
        match outcome {
            Outcome::Page { request, result } => {
                if request.kind.requires_auth() && !self.session.has_token() {
                    tracing::debug!("Dropping page for a session that has ended");
                    return Vec::new();
                }
                match result {
                    Ok(posts) => {
                        let outcome = self.feed_mut(request.kind).apply_page(&request, posts);
                        tracing::debug!(feed = request.kind.label(), ?outcome, "Page applied");
                        if outcome == PageOutcome::Exhausted {
                            self.info(NO_MORE_POSTS);
                        }
                    }
                    Err(e) => self.report("load page", &e),
                }
                Vec::new()
            }

            Outcome::Detail { post_id, result } => {
                if let Err(e) = self.detail.apply_open(&post_id, result) {
                    self.report("open post", &e);
                    if self.view == View::Detail {
                        self.view = self.previous_view;
                    }
                }
                Vec::new()
            }

            Outcome::Comments { post_id, result } => {
                self.detail.apply_comments(&post_id, result);
                Vec::new()
            }

            Outcome::Reactions { post_id, result } => {
                self.detail.apply_reactions(&post_id, result);
                Vec::new()
            }

            Outcome::Saved { target, result } => match result {
                Ok(post) => self.after_save(target, post),
                Err(e) => {
                    self.report("save post", &e);
                    Vec::new()
                }
            },

            Outcome::Deleted { post_id, result } => match result {
                Ok(()) => self.after_delete(&post_id),
                Err(e) => {
                    self.report("delete post", &e);
                    Vec::new()
                }
            },

            Outcome::Reacted { post_id, result } => match result {
                Ok(()) => vec![Task::RefreshReactions { post_id }],
                Err(e) => {
                    self.report("react", &e);
                    Vec::new()
                }
            },

            Outcome::Commented { post_id, result } => match result {
                Ok(_) => {
                    self.info("Comment added");
                    vec![Task::RefreshComments { post_id }]
                }
                Err(e) => {
                    self.report("add comment", &e);
                    Vec::new()
                }
            },

            Outcome::Registered { user, result } => self.after_register(user, result).await,

            Outcome::Health(result) => {
                match result {
                    Ok(()) => {
                        self.online = Some(true);
                        self.info("Server online");
                    }
                    Err(e) => {
                        self.online = Some(false);
                        tracing::warn!(error = %e, "Health check failed");
                        self.error(format!("Server offline: {e}"));
                    }
                }
                Vec::new()
            }

            Outcome::TopTags(result) => {
                match result {
                    Ok(tags) => self.top_tags = tags,
                    Err(e) => self.report("load top tags", &e),
                }
                Vec::new()
            }
        }
    }

    /// Clear the draft and reload every feed that could hold the post.
    fn after_save(&mut self, target: Option<String>, post: Post) -> Vec<Task> {
        tracing::info!(post_id = %post.id, updated = target.is_some(), "Post saved");
        self.draft.reset();
        self.info(if target.is_some() { "Post updated" } else { "Post created" });

        let mut tasks: Vec<Task> = [FeedKind::Home, FeedKind::Mine]
            .into_iter()
            .filter_map(|kind| self.refresh_feed(kind))
            .collect();
        if self.search.contains(&post.id) {
            tasks.push(Task::LoadPage(self.search.refresh_request()));
        }
        if self.detail.is_showing(&post.id) {
            tasks.extend(self.refresh_detail());
        }

        if self.view == View::Compose {
            self.view = if self.detail.is_closed() {
                self.previous_view
            } else {
                View::Detail
            };
        }
        tasks
    }

    /// Reload every feed holding the post and close it if it is open.
    fn after_delete(&mut self, post_id: &str) -> Vec<Task> {
        tracing::info!(post_id, "Post deleted");
        self.info("Post deleted");

        let holding: Vec<FeedKind> = FeedKind::ALL
            .into_iter()
            .filter(|kind| self.feed(*kind).contains(post_id))
            .collect();
        let tasks = holding
            .into_iter()
            .filter_map(|kind| self.refresh_feed(kind))
            .collect();

        if self.detail.is_showing(post_id) {
            self.close_detail();
        }
        tasks
    }

    async fn after_register(
        &mut self,
        user: User,
        result: Result<RegisterResponse, ApiError>,
    ) -> Vec<Task> {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.report("register", &e);
                return Vec::new();
            }
        };

        let Some(token) = response.token.filter(|t| !t.trim().is_empty()) else {
            tracing::warn!(username = %user.username, "Registration response carried no token");
            self.error(NO_TOKEN_RETURNED);
            return Vec::new();
        };

        let username = user.username.clone();
        if let Err(e) = self.session.sign_in(&token, user).await {
            tracing::error!(error = %e, "Failed to store session");
            self.error(format!("Failed to store session: {e:#}"));
            return Vec::new();
        }

        tracing::info!(%username, "Registered");
        self.info(format!("Signed in as {username}"));
        if self.view == View::Mine {
            return self.refresh_feed(FeedKind::Mine).into_iter().collect();
        }
        Vec::new()
    }

    // ========================================================================
    // Sequential driver
    // ========================================================================

    /// Run `tasks` and every follow-up to completion, one at a time.
    pub async fn run(&mut self, tasks: Vec<Task>) {
        let mut queue: VecDeque<Task> = tasks.into();
        while let Some(task) = queue.pop_front() {
            let outcome = task.run(&self.api).await;
            queue.extend(self.apply(outcome).await);
        }
    }
}
