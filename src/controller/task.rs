use crate::api::{
    ApiClient, ApiError, Comment, Post, ReactionCount, ReactionKind, RegisterResponse, TagCount,
    User,
};
use crate::detail::{fetch_comments, fetch_detail, fetch_reactions, DetailSnapshot};
use crate::feed::PageRequest;
use crate::form::SaveRequest;

/// A network call the controller wants made.
///
/// Tasks capture everything they need when created, so the front-end can run
/// them on a background task and hand the [`Outcome`] back to
/// [`Controller::apply`](super::Controller::apply) whenever it arrives.
#[derive(Debug, Clone)]
pub enum Task {
    LoadPage(PageRequest),
    OpenPost {
        post_id: String,
        increment_view: bool,
    },
    RefreshComments {
        post_id: String,
    },
    RefreshReactions {
        post_id: String,
    },
    SavePost(SaveRequest),
    DeletePost {
        post_id: String,
    },
    AddReaction {
        post_id: String,
        kind: ReactionKind,
    },
    RemoveReaction {
        post_id: String,
    },
    AddComment {
        post_id: String,
        content: String,
    },
    Register {
        user: User,
    },
    CheckHealth,
    LoadTopTags {
        limit: usize,
    },
}

/// Result of running a [`Task`].
#[derive(Debug)]
pub enum Outcome {
    Page {
        request: PageRequest,
        result: Result<Vec<Post>, ApiError>,
    },
    Detail {
        post_id: String,
        result: Result<DetailSnapshot, ApiError>,
    },
    Comments {
        post_id: String,
        result: Result<Vec<Comment>, String>,
    },
    Reactions {
        post_id: String,
        result: Result<Vec<ReactionCount>, String>,
    },
    Saved {
        target: Option<String>,
        result: Result<Post, ApiError>,
    },
    Deleted {
        post_id: String,
        result: Result<(), ApiError>,
    },
    Reacted {
        post_id: String,
        result: Result<(), ApiError>,
    },
    Commented {
        post_id: String,
        result: Result<Comment, ApiError>,
    },
    Registered {
        user: User,
        result: Result<RegisterResponse, ApiError>,
    },
    Health(Result<(), ApiError>),
    TopTags(Result<Vec<TagCount>, ApiError>),
}

impl Task {
    /// Short name for logs and panic reports.
    pub fn label(&self) -> &'static str {
        match self {
            Task::LoadPage(_) => "load page",
            Task::OpenPost { .. } => "open post",
            Task::RefreshComments { .. } => "load comments",
            Task::RefreshReactions { .. } => "load reactions",
            Task::SavePost(_) => "save post",
            Task::DeletePost { .. } => "delete post",
            Task::AddReaction { .. } => "add reaction",
            Task::RemoveReaction { .. } => "remove reaction",
            Task::AddComment { .. } => "add comment",
            Task::Register { .. } => "register",
            Task::CheckHealth => "health check",
            Task::LoadTopTags { .. } => "load top tags",
        }
    }

    pub async fn run(self, api: &ApiClient) -> Outcome {
        match self {
            Task::LoadPage(request) => {
                let result = request.fetch(api).await;
                Outcome::Page { request, result }
            }
            Task::OpenPost {
                post_id,
                increment_view,
            } => {
                let result = fetch_detail(api, &post_id, increment_view).await;
                Outcome::Detail { post_id, result }
            }
            Task::RefreshComments { post_id } => {
                let result = fetch_comments(api, &post_id).await;
                Outcome::Comments { post_id, result }
            }
            Task::RefreshReactions { post_id } => {
                let result = fetch_reactions(api, &post_id).await;
                Outcome::Reactions { post_id, result }
            }
            Task::SavePost(SaveRequest { target, payload }) => {
                let result = match &target {
                    Some(id) => api.update_post(id, &payload).await,
                    None => api.create_post(&payload).await,
                };
                Outcome::Saved { target, result }
            }
            Task::DeletePost { post_id } => {
                let result = api.delete_post(&post_id).await;
                Outcome::Deleted { post_id, result }
            }
            Task::AddReaction { post_id, kind } => {
                let result = api.add_reaction(&post_id, kind).await;
                Outcome::Reacted { post_id, result }
            }
            Task::RemoveReaction { post_id } => {
                let result = api.remove_reaction(&post_id).await;
                Outcome::Reacted { post_id, result }
            }
            Task::AddComment { post_id, content } => {
                let result = api.add_comment(&post_id, &content).await;
                Outcome::Commented { post_id, result }
            }
            Task::Register { user } => {
                let result = api.register(&user.username, &user.email).await;
                Outcome::Registered { user, result }
            }
            Task::CheckHealth => Outcome::Health(api.health().await),
            Task::LoadTopTags { limit } => Outcome::TopTags(api.top_tags(limit).await),
        }
    }
}
