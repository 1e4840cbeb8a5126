use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::form::extract_title_from_content;

// ============================================================================
// Records returned by the blog API
// ============================================================================

/// A blog post as returned by `GET /posts`, `GET /posts/{id}` and the mutating
/// post endpoints.
///
/// The backend never sends a `title`; when it is absent the display title is
/// derived from the first non-empty line of `content` (see [`Post::display_title`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Post {
    /// Title shown in lists and the detail header.
    ///
    /// Uses the explicit `title` when it is present and non-blank, otherwise the
    /// first non-empty line of the content (capped at 120 characters).
    pub fn display_title(&self) -> Cow<'_, str> {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => Cow::Borrowed(title),
            _ => Cow::Owned(extract_title_from_content(&self.content)),
        }
    }

    /// Media URL, treating the backend's empty-string placeholder as absent.
    pub fn media_url(&self) -> Option<&str> {
        self.media_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// A comment attached to a single post. Append-only from the client's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One entry of a post's reaction aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    pub reaction: String,
    pub count: u64,
}

/// One entry of `GET /posts/analytics/top-tags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Profile cached alongside the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
}

/// Body of `POST /register`. `token` is optional on the wire so that its
/// absence can be reported as a failure instead of a decode error.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub token: Option<String>,
}

// ============================================================================
// Request payloads
// ============================================================================

/// Payload for `POST /posts` and the full-update form of `PUT /posts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPayload {
    pub author_id: String,
    pub content: String,
    pub media_url: Option<String>,
    pub category_id: String,
    pub status: String,
    pub tags: Vec<String>,
}

/// Reaction kinds accepted by `POST /posts/{id}/reactions?reaction_type=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
    Love,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 3] = [ReactionKind::Like, ReactionKind::Dislike, ReactionKind::Love];

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
            ReactionKind::Love => "love",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            "love" => Ok(ReactionKind::Love),
            other => Err(format!("Unknown reaction: {other}")),
        }
    }
}

/// Query for one page of `GET /posts` or `GET /posts/me`.
///
/// `tag` and `q` are already trimmed; blank values never reach this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: usize,
    pub skip: usize,
    pub tag: Option<String>,
    pub q: Option<String>,
}

impl PageQuery {
    /// Serialize as query parameters, omitting absent filters entirely.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("skip", self.skip.to_string()),
        ];
        if let Some(tag) = &self.tag {
            params.push(("tag", tag.clone()));
        }
        if let Some(q) = &self.q {
            params.push(("q", q.clone()));
        }
        params
    }
}

/// The backend emits `null` for several fields it otherwise defaults.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_decodes_backend_shape() {
        let post: Post = serde_json::from_value(json!({
            "id": "65f0c0ffee",
            "author_id": "ada",
            "content": "Hello\n\nWorld",
            "media_url": "",
            "category_id": "general",
            "status": "published",
            "tags": ["space", "rust"],
            "views": 3,
            "created_at": "2024-03-01T10:00:00",
            "updated_at": null
        }))
        .unwrap();

        assert_eq!(post.id, "65f0c0ffee");
        assert_eq!(post.tags, vec!["space", "rust"]);
        assert_eq!(post.views, 3);
        assert_eq!(post.media_url(), None);
        assert_eq!(post.display_title(), "Hello");
    }

    #[test]
    fn test_post_nulls_fall_back_to_defaults() {
        let post: Post = serde_json::from_value(json!({
            "id": "1",
            "author_id": null,
            "content": "x",
            "tags": null,
            "views": null
        }))
        .unwrap();

        assert_eq!(post.author_id, "");
        assert!(post.tags.is_empty());
        assert_eq!(post.views, 0);
    }

    #[test]
    fn test_post_without_content_is_rejected() {
        let result = serde_json::from_value::<Post>(json!({ "id": "1" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_title_wins() {
        let post: Post = serde_json::from_value(json!({
            "id": "1",
            "content": "first line\nbody",
            "title": "Explicit"
        }))
        .unwrap();
        assert_eq!(post.display_title(), "Explicit");
    }

    #[test]
    fn test_reaction_kind_parse_and_display() {
        assert_eq!("Like".parse::<ReactionKind>().unwrap(), ReactionKind::Like);
        assert_eq!(" love ".parse::<ReactionKind>().unwrap(), ReactionKind::Love);
        assert!("meh".parse::<ReactionKind>().is_err());
        assert_eq!(ReactionKind::Dislike.to_string(), "dislike");
    }

    #[test]
    fn test_page_query_omits_absent_filters() {
        let query = PageQuery {
            limit: 10,
            skip: 20,
            tag: None,
            q: Some("mars".to_string()),
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("limit", "10".to_string()),
                ("skip", "20".to_string()),
                ("q", "mars".to_string()),
            ]
        );
    }
}
