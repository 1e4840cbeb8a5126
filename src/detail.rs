//! Single-post view: the open post id and its comment and reaction panels.
//!
//! The view moves `Closed → Loading → Open → Closed`. Loading the post itself
//! is the only hard step: if it fails the view closes and the error surfaces.
//! Comments and reactions are fetched after it, one after the other, and a
//! failure in either only marks that panel as failed.

use crate::api::{ApiClient, ApiError, Comment, Post, ReactionCount};

/// A sub-panel of the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel<T> {
    Loading,
    Loaded(T),
    /// Load failed; carries the message to show in place of the content.
    Failed(String),
}

impl<T> Panel<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Panel::Loaded(value) => Some(value),
            _ => None,
        }
    }

    fn from_result(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => Panel::Loaded(value),
            Err(message) => Panel::Failed(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPost {
    pub post: Post,
    pub comments: Panel<Vec<Comment>>,
    pub reactions: Panel<Vec<ReactionCount>>,
}

impl OpenPost {
    /// Count for one reaction kind, 0 when absent or not loaded.
    pub fn reaction_count(&self, reaction: &str) -> u64 {
        self.reactions
            .loaded()
            .and_then(|all| all.iter().find(|r| r.reaction == reaction))
            .map_or(0, |r| r.count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetailState {
    #[default]
    Closed,
    Loading {
        post_id: String,
    },
    Open(OpenPost),
}

/// Everything one open or refresh fetched.
#[derive(Debug, Clone)]
pub struct DetailSnapshot {
    pub post: Post,
    pub comments: Result<Vec<Comment>, String>,
    pub reactions: Result<Vec<ReactionCount>, String>,
}

/// Fetch a post and its panels.
///
/// With `increment_view`, a view-count bump is sent first; its failure is
/// logged and otherwise ignored. Only a failure to fetch the post is an error.
pub async fn fetch_detail(
    api: &ApiClient,
    post_id: &str,
    increment_view: bool,
) -> Result<DetailSnapshot, ApiError> {
    if increment_view {
        if let Err(e) = api.increment_views(post_id).await {
            tracing::debug!(post_id, error = %e, "View increment failed, ignoring");
        }
    }

    let post = api.get_post(post_id).await?;
    let comments = fetch_comments(api, post_id).await;
    let reactions = fetch_reactions(api, post_id).await;

    Ok(DetailSnapshot {
        post,
        comments,
        reactions,
    })
}

pub async fn fetch_comments(api: &ApiClient, post_id: &str) -> Result<Vec<Comment>, String> {
    api.list_comments(post_id).await.map_err(|e| {
        tracing::warn!(post_id, error = %e, "Failed to load comments");
        e.to_string()
    })
}

pub async fn fetch_reactions(api: &ApiClient, post_id: &str) -> Result<Vec<ReactionCount>, String> {
    api.list_reactions(post_id).await.map_err(|e| {
        tracing::warn!(post_id, error = %e, "Failed to load reactions");
        e.to_string()
    })
}

/// Holds the detail view state.
#[derive(Debug, Clone, Default)]
pub struct PostDetail {
    state: DetailState,
}

impl PostDetail {
    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// Id of the post being loaded or shown.
    pub fn open_id(&self) -> Option<&str> {
        match &self.state {
            DetailState::Closed => None,
            DetailState::Loading { post_id } => Some(post_id),
            DetailState::Open(open) => Some(&open.post.id),
        }
    }

    pub fn open_post(&self) -> Option<&OpenPost> {
        match &self.state {
            DetailState::Open(open) => Some(open),
            _ => None,
        }
    }

    pub fn is_showing(&self, post_id: &str) -> bool {
        self.open_id() == Some(post_id)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, DetailState::Closed)
    }

    pub fn begin_open(&mut self, post_id: &str) {
        self.state = DetailState::Loading {
            post_id: post_id.to_string(),
        };
    }

    pub fn close(&mut self) {
        self.state = DetailState::Closed;
    }

    /// Apply the result of an open or refresh for `post_id`.
    ///
    /// Results for a post that is no longer the one being shown are dropped
    /// and `Ok(false)` is returned. A failed fetch closes the view.
    pub fn apply_open(
        &mut self,
        post_id: &str,
        result: Result<DetailSnapshot, ApiError>,
    ) -> Result<bool, ApiError> {
        if !self.is_showing(post_id) {
            tracing::debug!(post_id, "Dropping detail result for a post no longer shown");
            return Ok(false);
        }

        match result {
            Ok(snapshot) => {
                self.state = DetailState::Open(OpenPost {
                    post: snapshot.post,
                    comments: Panel::from_result(snapshot.comments),
                    reactions: Panel::from_result(snapshot.reactions),
                });
                Ok(true)
            }
            Err(e) => {
                self.state = DetailState::Closed;
                Err(e)
            }
        }
    }

    pub fn apply_comments(&mut self, post_id: &str, result: Result<Vec<Comment>, String>) {
        if let DetailState::Open(open) = &mut self.state {
            if open.post.id == post_id {
                open.comments = Panel::from_result(result);
            }
        }
    }

    pub fn apply_reactions(&mut self, post_id: &str, result: Result<Vec<ReactionCount>, String>) {
        if let DetailState::Open(open) = &mut self.state {
            if open.post.id == post_id {
                open.reactions = Panel::from_result(result);
            }
        }
    }

    /// Open `post_id`, fetching it and both panels.
    pub async fn open(
        &mut self,
        api: &ApiClient,
        post_id: &str,
        increment_view: bool,
    ) -> Result<(), ApiError> {
        self.begin_open(post_id);
        let result = fetch_detail(api, post_id, increment_view).await;
        self.apply_open(post_id, result).map(|_| ())
    }

    /// Re-fetch the open post without counting a view. No-op when closed.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        let Some(post_id) = self.open_id().map(str::to_string) else {
            return Ok(());
        };
        let result = fetch_detail(api, &post_id, false).await;
        self.apply_open(&post_id, result).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            author_id: "ada".to_string(),
            content: "Hello\n\nworld".to_string(),
            title: None,
            media_url: None,
            category_id: None,
            status: None,
            tags: Vec::new(),
            views: 3,
            created_at: None,
            updated_at: None,
        }
    }

    fn snapshot(id: &str) -> DetailSnapshot {
        DetailSnapshot {
            post: post(id),
            comments: Ok(Vec::new()),
            reactions: Err("boom".to_string()),
        }
    }

    #[test]
    fn test_open_lifecycle() {
        let mut detail = PostDetail::default();
        assert!(detail.is_closed());

        detail.begin_open("7");
        assert_eq!(detail.open_id(), Some("7"));
        assert!(detail.open_post().is_none());

        assert!(detail.apply_open("7", Ok(snapshot("7"))).unwrap());
        let open = detail.open_post().unwrap();
        assert_eq!(open.comments, Panel::Loaded(Vec::new()));
        assert_eq!(open.reactions, Panel::Failed("boom".to_string()));

        detail.close();
        assert!(detail.is_closed());
    }

    #[test]
    fn test_stale_result_dropped() {
        let mut detail = PostDetail::default();
        detail.begin_open("1");
        detail.begin_open("2");
        assert!(!detail.apply_open("1", Ok(snapshot("1"))).unwrap());
        assert_eq!(detail.state(), &DetailState::Loading { post_id: "2".to_string() });
    }

    #[test]
    fn test_hard_failure_closes() {
        let mut detail = PostDetail::default();
        detail.begin_open("7");
        let err = ApiError::Status {
            status: 404,
            message: "Post not found".to_string(),
        };
        let result = detail.apply_open("7", Err(err));
        assert_eq!(result.unwrap_err().to_string(), "Post not found");
        assert!(detail.is_closed());
    }

    #[test]
    fn test_panel_refetch_only_for_open_post() {
        let mut detail = PostDetail::default();
        detail.begin_open("7");
        detail.apply_open("7", Ok(snapshot("7"))).unwrap();

        detail.apply_reactions(
            "8",
            Ok(vec![ReactionCount {
                reaction: "like".to_string(),
                count: 9,
            }]),
        );
        assert_eq!(detail.open_post().unwrap().reaction_count("like"), 0);

        detail.apply_reactions(
            "7",
            Ok(vec![ReactionCount {
                reaction: "like".to_string(),
                count: 2,
            }]),
        );
        assert_eq!(detail.open_post().unwrap().reaction_count("like"), 2);
    }
}
