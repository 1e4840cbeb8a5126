use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use super::types::{
    Comment, PageQuery, Post, PostPayload, ReactionCount, ReactionKind, RegisterResponse,
    TagCount,
};
use crate::session::SessionStore;
use crate::util::validate_base_url;

/// Base URL used when neither the CLI, the environment nor the config file
/// provides one. The backend mounts every route under `/api`.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors produced by the API gateway.
///
/// Every failure a caller can see is one of these; server error bodies are
/// normalized into [`ApiError::Status`] with a single human-readable message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (no response). Shown to the user verbatim.
    #[error("{0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx response; `message` follows the detail → message → JSON → text precedence.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// The server answered 2xx but the payload does not match the expected record.
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// HTTP status for server error responses.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401 responses, which the UI turns into a sign-in prompt.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Gateway to the blog backend.
///
/// Cloning is cheap: the reqwest client and the session store are both
/// reference-counted, so background tasks take their own copy.
///
/// The `Authorization` header is attached from the [`SessionStore`] on every
/// call; callers never set it themselves. There are no retries and no timeouts.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionStore) -> Result<Self, ApiError> {
        Self::with_http_client(reqwest::Client::new(), base_url, session)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: &str,
        session: SessionStore,
    ) -> Result<Self, ApiError> {
        let base_url =
            validate_base_url(base_url).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        if base_url.scheme() == "http" && !is_loopback_host(&base_url) {
            tracing::warn!(base_url = %base_url, "Using plain HTTP API base URL; bearer tokens are sent unencrypted");
        }
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Build the absolute URL for `segments` below the base URL.
    ///
    /// Segments are percent-encoded individually, so ids can never escape
    /// their path position.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issue one request and normalize the response.
    ///
    /// - Non-2xx → [`ApiError::Status`] with the extracted message
    /// - 2xx without a JSON content type → `Ok(None)`
    /// - 2xx JSON that fails to parse → the raw text as a JSON string
    pub async fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.endpoint(segments, query)?;
        tracing::debug!(method = %method, url = %url, "API request");

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json");

        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token.expose_secret());
        }

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ApiError::Malformed(format!("request body: {e}")))?;
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let response = request.send().await.map_err(ApiError::Network)?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(is_json_content_type)
            .unwrap_or(false);

        let text = read_limited_text(response, MAX_RESPONSE_SIZE).await?;

        if !status.is_success() {
            let message = extract_error_message(&text, status);
            tracing::debug!(method = %method, url = %url, status = status.as_u16(), message = %message, "API error response");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if !is_json {
            return Ok(None);
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "JSON response failed to parse, keeping raw text");
                Ok(Some(Value::String(text)))
            }
        }
    }

    // ========================================================================
    // Posts
    // ========================================================================

    /// `GET /posts?limit&skip&tag&q`
    pub async fn list_posts(&self, query: &PageQuery) -> Result<Vec<Post>, ApiError> {
        let value = self
            .request(Method::GET, &["posts"], &query.to_params(), None)
            .await?;
        decode_posts(value)
    }

    /// `GET /posts/me?limit&skip` (filters are not supported by this endpoint).
    pub async fn my_posts(&self, limit: usize, skip: usize) -> Result<Vec<Post>, ApiError> {
        let params = [("limit", limit.to_string()), ("skip", skip.to_string())];
        let value = self
            .request(Method::GET, &["posts", "me"], &params, None)
            .await?;
        decode_posts(value)
    }

    pub async fn get_post(&self, id: &str) -> Result<Post, ApiError> {
        let value = self.request(Method::GET, &["posts", id], &[], None).await?;
        decode_post(value)
    }

    /// `PUT /posts/{id}` with `{inc_views: 1}`.
    pub async fn increment_views(&self, id: &str) -> Result<Post, ApiError> {
        let body = json!({ "inc_views": 1 });
        let value = self
            .request(Method::PUT, &["posts", id], &[], Some(&body))
            .await?;
        decode_post(value)
    }

    pub async fn create_post(&self, payload: &PostPayload) -> Result<Post, ApiError> {
        let body = to_body(payload)?;
        let value = self
            .request(Method::POST, &["posts"], &[], Some(&body))
            .await?;
        decode_post(value)
    }

    pub async fn update_post(&self, id: &str, payload: &PostPayload) -> Result<Post, ApiError> {
        let body = to_body(payload)?;
        let value = self
            .request(Method::PUT, &["posts", id], &[], Some(&body))
            .await?;
        decode_post(value)
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, &["posts", id], &[], None)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Comments and reactions
    // ========================================================================

    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, ApiError> {
        let value = self
            .request(Method::GET, &["posts", post_id, "comments"], &[], None)
            .await?;
        decode(value, "comments")
    }

    pub async fn add_comment(&self, post_id: &str, content: &str) -> Result<Comment, ApiError> {
        let body = json!({ "content": content });
        let value = self
            .request(Method::POST, &["posts", post_id, "comments"], &[], Some(&body))
            .await?;
        decode(value, "comment")
    }

    pub async fn list_reactions(&self, post_id: &str) -> Result<Vec<ReactionCount>, ApiError> {
        let value = self
            .request(Method::GET, &["posts", post_id, "reactions"], &[], None)
            .await?;
        decode(value, "reactions")
    }

    pub async fn add_reaction(&self, post_id: &str, kind: ReactionKind) -> Result<(), ApiError> {
        let params = [("reaction_type", kind.as_str().to_string())];
        self.request(Method::POST, &["posts", post_id, "reactions"], &params, None)
            .await?;
        Ok(())
    }

    /// Removes the caller's reaction, whatever its kind.
    pub async fn remove_reaction(&self, post_id: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, &["posts", post_id, "reactions"], &[], None)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Misc
    // ========================================================================

    pub async fn top_tags(&self, limit: usize) -> Result<Vec<TagCount>, ApiError> {
        let params = [("limit", limit.to_string())];
        let value = self
            .request(
                Method::GET,
                &["posts", "analytics", "top-tags"],
                &params,
                None,
            )
            .await?;
        decode(value, "top tags")
    }

    /// `POST /register?username&email`. A response without `token` is
    /// returned as-is; deciding that it is a failure is the caller's job.
    pub async fn register(&self, username: &str, email: &str) -> Result<RegisterResponse, ApiError> {
        let params = [
            ("username", username.to_string()),
            ("email", email.to_string()),
        ];
        let value = self
            .request(Method::POST, &["register"], &params, None)
            .await?;
        match value {
            Some(value @ Value::Object(_)) => decode(Some(value), "register"),
            _ => Ok(RegisterResponse { token: None }),
        }
    }

    /// Any 2xx from `GET /health` means online.
    pub async fn health(&self) -> Result<(), ApiError> {
        self.request(Method::GET, &["health"], &[], None).await?;
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

fn is_loopback_host(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Pick the user-facing message out of an error response body.
///
/// Precedence: `detail` field, `message` field, the JSON body re-serialized,
/// then the raw text. An empty body falls back to the status line.
pub(crate) fn extract_error_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message"] {
            match value.get(key) {
                Some(Value::String(s)) => return s.clone(),
                Some(Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
        return value.to_string();
    }

    if body.trim().is_empty() {
        return match status.canonical_reason() {
            Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
            None => format!("HTTP {}", status.as_u16()),
        };
    }

    body.to_string()
}

fn to_body<T: serde::Serialize>(payload: &T) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|e| ApiError::Malformed(format!("request body: {e}")))
}

fn decode<T: DeserializeOwned>(value: Option<Value>, what: &str) -> Result<T, ApiError> {
    let value = value.ok_or_else(|| ApiError::Malformed(format!("{what}: expected JSON body")))?;
    serde_json::from_value(value).map_err(|e| ApiError::Malformed(format!("{what}: {e}")))
}

fn decode_post(value: Option<Value>) -> Result<Post, ApiError> {
    let post: Post = decode(value, "post")?;
    check_post(&post)?;
    Ok(post)
}

fn decode_posts(value: Option<Value>) -> Result<Vec<Post>, ApiError> {
    let posts: Vec<Post> = decode(value, "post list")?;
    for post in &posts {
        check_post(post)?;
    }
    Ok(posts)
}

fn check_post(post: &Post) -> Result<(), ApiError> {
    if post.id.trim().is_empty() {
        return Err(ApiError::Malformed("post: empty id".to_string()));
    }
    Ok(())
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
