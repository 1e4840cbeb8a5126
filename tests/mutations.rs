//! Integration tests for mutations and the reloads that follow them.
//!
//! Every test runs the controller's task queue to completion against its own
//! wiremock server, then checks both the requests sent and the resulting view
//! state.

use cosmic::api::{ApiClient, Post, ReactionKind, User};
use cosmic::controller::{ActionError, Controller, NoticeLevel, Settings, View};
use cosmic::detail::Panel;
use cosmic::feed::FeedKind;
use cosmic::session::SessionStore;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{
    body_partial_json, header, method, path, path_regex, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SIGN_IN: &str = "Please sign in (register from the Profile view)";

fn post_json(id: &str) -> Value {
    json!({
        "id": id,
        "author_id": "ada",
        "content": format!("Post {id}\n\nbody"),
        "tags": [],
        "views": 0
    })
}

fn post(id: &str) -> Post {
    serde_json::from_value(post_json(id)).unwrap()
}

async fn signed_in_session() -> SessionStore {
    let session = SessionStore::in_memory();
    session
        .sign_in(
            "tok",
            User {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
            },
        )
        .await
        .unwrap();
    session
}

fn controller_for(server: &MockServer, session: SessionStore) -> Controller {
    let api = ApiClient::new(&format!("{}/api", server.uri()), session).unwrap();
    let settings = Settings {
        increment_views_on_open: false,
        ..Settings::default()
    };
    Controller::new(api, settings)
}

/// Mount detail endpoints for `id` with empty panels.
async fn mount_detail(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/posts/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(id)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/posts/{id}/comments")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

// ============================================================================
// Session gating
// ============================================================================

#[tokio::test]
async fn test_gated_actions_without_session_send_nothing() {
    let server = MockServer::start().await;
    Mock::given(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, SessionStore::in_memory());

    assert_eq!(controller.new_draft(), Err(ActionError::SignInRequired));
    assert_eq!(controller.edit_post(&post("7")), Err(ActionError::SignInRequired));
    assert_eq!(controller.save_draft().unwrap_err(), ActionError::SignInRequired);
    assert_eq!(
        controller.delete_post("7", true).unwrap_err(),
        ActionError::SignInRequired
    );
    assert_eq!(
        controller.add_reaction(ReactionKind::Like).unwrap_err(),
        ActionError::SignInRequired
    );
    assert_eq!(controller.remove_reaction().unwrap_err(), ActionError::SignInRequired);
    assert_eq!(
        controller.add_comment("hi").unwrap_err(),
        ActionError::SignInRequired
    );
    assert_eq!(ActionError::SignInRequired.to_string(), SIGN_IN);
    assert_eq!(controller.view(), View::Home);
}

// ============================================================================
// Save
// ============================================================================

#[tokio::test]
async fn test_saving_an_edit_updates_and_reloads_both_feeds() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/posts/7"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({
            "author_id": "ada",
            "content": "New title\n\nNew body",
            "category_id": "general",
            "status": "published",
            "tags": ["a", "b"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json("7")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json("7")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/me"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json("7")])))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, signed_in_session().await);
    controller.edit_post(&post("7")).unwrap();
    assert_eq!(controller.view(), View::Compose);
    assert_eq!(controller.draft().editing_post_id(), Some("7"));

    {
        let fields = &mut controller.draft_mut().fields;
        fields.title = "New title".to_string();
        fields.body = "New body".to_string();
        fields.tags = "a, b,".to_string();
    }
    let tasks = controller.save_draft().unwrap();
    controller.run(tasks).await;

    assert_eq!(controller.view(), View::Home);
    assert!(!controller.draft().is_editing());
    assert_eq!(controller.draft().fields.title, "");
    assert_eq!(controller.feed(FeedKind::Home).len(), 1);
    assert_eq!(controller.feed(FeedKind::Mine).len(), 1);
    assert_eq!(
        controller.notice().map(|n| n.message.as_str()),
        Some("Post updated")
    );
}

#[tokio::test]
async fn test_create_without_title_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json("1")))
        .expect(0)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, signed_in_session().await);
    controller.new_draft().unwrap();
    controller.draft_mut().fields.body = "Only a body".to_string();

    let err = controller.save_draft().unwrap_err();
    assert_eq!(err.to_string(), "Title is required");
    assert_eq!(controller.view(), View::Compose);
}

#[tokio::test]
async fn test_unauthorized_save_prompts_sign_in_and_keeps_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, signed_in_session().await);
    controller.new_draft().unwrap();
    controller.draft_mut().fields.title = "Hello".to_string();
    controller.draft_mut().fields.body = "World".to_string();

    let tasks = controller.save_draft().unwrap();
    controller.run(tasks).await;

    let notice = controller.notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, SIGN_IN);
    assert_eq!(controller.draft().fields.title, "Hello");
    assert_eq!(controller.view(), View::Compose);
}

#[tokio::test]
async fn test_server_error_message_is_shown_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Content too long"})),
        )
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, signed_in_session().await);
    controller.new_draft().unwrap();
    controller.draft_mut().fields.title = "Hello".to_string();
    controller.draft_mut().fields.body = "World".to_string();

    let tasks = controller.save_draft().unwrap();
    controller.run(tasks).await;

    assert_eq!(
        controller.notice().map(|n| n.message.as_str()),
        Some("Content too long")
    );
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_reloads_holding_feed_and_closes_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([post_json("7"), post_json("8")])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json("8")])))
        .expect(1)
        .mount(&server)
        .await;
    mount_detail(&server, "7").await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7/reactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/posts/7"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, signed_in_session().await);
    let tasks = controller.activate(View::Home);
    controller.run(tasks).await;
    let tasks = controller.open_post("7");
    controller.run(tasks).await;
    assert!(controller.detail().is_showing("7"));

    assert_eq!(
        controller.delete_post("7", false).unwrap_err(),
        ActionError::NotConfirmed
    );
    let tasks = controller.delete_post("7", true).unwrap();
    controller.run(tasks).await;

    assert!(controller.detail().is_closed());
    assert_eq!(controller.view(), View::Home);
    assert!(!controller.feed(FeedKind::Home).contains("7"));
    assert_eq!(
        controller.notice().map(|n| n.message.as_str()),
        Some("Post deleted")
    );
}

// ============================================================================
// Opening and refreshing a post
// ============================================================================

#[tokio::test]
async fn test_open_survives_failed_view_count_and_comments() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/posts/7"))
        .and(body_partial_json(json!({"inc_views": 1})))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "views down"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json("7")))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7/comments"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "c down"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7/reactions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"reaction": "like", "count": 2}])),
        )
        .mount(&server)
        .await;

    let api = ApiClient::new(&format!("{}/api", server.uri()), SessionStore::in_memory()).unwrap();
    let mut controller = Controller::new(api, Settings::default());
    assert!(controller.settings().increment_views_on_open);

    let tasks = controller.open_post("7");
    controller.run(tasks).await;

    assert_eq!(controller.view(), View::Detail);
    assert!(controller.notice().is_none());
    let open = controller.detail().open_post().unwrap();
    assert_eq!(open.post.id, "7");
    assert_eq!(open.comments, Panel::Failed("c down".to_string()));
    assert_eq!(open.reaction_count("like"), 2);

    // Refreshing re-fetches the post without counting another view
    let tasks = controller.refresh_detail();
    controller.run(tasks).await;
    assert!(controller.detail().is_showing("7"));
}

// ============================================================================
// Reactions and comments
// ============================================================================

#[tokio::test]
async fn test_reaction_refetches_counts() {
    let server = MockServer::start().await;
    mount_detail(&server, "7").await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7/reactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7/reactions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"reaction": "like", "count": 1}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/7/reactions"))
        .and(query_param("reaction_type", "like"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, signed_in_session().await);
    let tasks = controller.open_post("7");
    controller.run(tasks).await;
    assert_eq!(controller.detail().open_post().unwrap().reaction_count("like"), 0);

    let tasks = controller.add_reaction(ReactionKind::Like).unwrap();
    controller.run(tasks).await;

    assert_eq!(controller.detail().open_post().unwrap().reaction_count("like"), 1);
}

#[tokio::test]
async fn test_comment_is_trimmed_and_list_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json("7")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7/reactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/7/comments"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"user_id": "ada", "content": "Nice"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/7/comments"))
        .and(body_partial_json(json!({"content": "Nice"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"user_id": "ada", "content": "Nice"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, signed_in_session().await);
    let tasks = controller.open_post("7");
    controller.run(tasks).await;

    assert_eq!(controller.add_comment("   ").unwrap_err(), ActionError::EmptyComment);
    let tasks = controller.add_comment("  Nice  ").unwrap();
    controller.run(tasks).await;

    let comments = controller
        .detail()
        .open_post()
        .and_then(|open| open.comments.loaded())
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content, "Nice");
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_without_token_leaves_session_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .and(query_param("username", "ada"))
        .and(query_param("email", "ada@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, SessionStore::in_memory());
    let tasks = controller.register(" ada ", "ada@example.com").unwrap();
    controller.run(tasks).await;

    assert!(!controller.session().has_token());
    assert!(controller.session().user().is_none());
    let notice = controller.notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "No token returned");
}

#[tokio::test]
async fn test_register_signs_in_and_authorizes_later_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json("3")])))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, SessionStore::in_memory());
    let tasks = controller.register("grace", "grace@example.com").unwrap();
    controller.run(tasks).await;

    assert_eq!(controller.session().username().as_deref(), Some("grace"));
    assert_eq!(
        controller.notice().map(|n| n.message.as_str()),
        Some("Signed in as grace")
    );

    let tasks = controller.activate(View::Mine);
    controller.run(tasks).await;
    assert_eq!(controller.feed(FeedKind::Mine).len(), 1);
}

#[tokio::test]
async fn test_logout_drops_own_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json("3")])))
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, signed_in_session().await);
    let tasks = controller.activate(View::Mine);
    controller.run(tasks).await;
    assert_eq!(controller.feed(FeedKind::Mine).len(), 1);

    controller.logout().await.unwrap();

    assert!(!controller.session().has_token());
    assert!(controller.feed(FeedKind::Mine).is_empty());
    assert_eq!(controller.view(), View::Home);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_marks_server_online() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, SessionStore::in_memory());
    let tasks = controller.check_health();
    controller.run(tasks).await;

    assert_eq!(controller.online(), Some(true));
    assert_eq!(
        controller.notice().map(|n| n.message.as_str()),
        Some("Server online")
    );
}
