//! Integration tests for paginated feeds against a mock blog server.
//!
//! Each test starts its own wiremock server and an in-memory session, so no
//! state leaks between tests. These exercise the request parameters the feeds
//! send and how pages fold into the visible lists.

use cosmic::api::ApiClient;
use cosmic::controller::{Controller, NoticeLevel, Settings, View};
use cosmic::feed::{FeedFilters, FeedKind, FeedState, PageOutcome};
use cosmic::session::SessionStore;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, session: SessionStore) -> ApiClient {
    ApiClient::new(&format!("{}/api", server.uri()), session).unwrap()
}

fn post_json(id: &str) -> Value {
    json!({
        "id": id,
        "author_id": "ada",
        "content": format!("Post {id}\n\nbody"),
        "tags": ["space"],
        "views": 0
    })
}

fn page(ids: std::ops::Range<u32>) -> Value {
    Value::Array(ids.map(|i| post_json(&i.to_string())).collect())
}

fn ids(feed: &FeedState) -> Vec<&str> {
    feed.items().iter().map(|p| p.id.as_str()).collect()
}

// ============================================================================
// FeedState against the server
// ============================================================================

#[tokio::test]
async fn test_tag_reload_then_empty_load_more_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("limit", "10"))
        .and(query_param("skip", "0"))
        .and(query_param("tag", "space"))
        .and(query_param_is_missing("q"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_json("1")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("skip", "1"))
        .and(query_param("tag", "space"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut feed = FeedState::new(FeedKind::Home, 10);

    let outcome = feed.reload(&api, FeedFilters::with_tag("space")).await.unwrap();
    assert_eq!(outcome, PageOutcome::Replaced(1));
    assert_eq!(ids(&feed), vec!["1"]);
    assert_eq!(feed.skip(), 1);

    let outcome = feed.load_more(&api).await.unwrap();
    assert_eq!(outcome, PageOutcome::Exhausted);
    assert_eq!(ids(&feed), vec!["1"]);
    assert_eq!(feed.skip(), 1);
    assert_eq!(feed.filters().tag(), Some("space"));
}

#[tokio::test]
async fn test_blank_filters_are_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param_is_missing("tag"))
        .and(query_param_is_missing("q"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..3)))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut feed = FeedState::new(FeedKind::Search, 10);

    feed.reload(&api, FeedFilters::new(Some("   "), Some("")))
        .await
        .unwrap();
    assert!(feed.filters().is_empty());
    assert_eq!(feed.len(), 3);
}

#[tokio::test]
async fn test_load_more_appends_and_advances_skip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("skip", "0"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("skip", "2"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(2..4)))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut feed = FeedState::new(FeedKind::Search, 2);

    feed.reload(&api, FeedFilters::with_query("rust")).await.unwrap();
    let outcome = feed.load_more(&api).await.unwrap();

    assert_eq!(outcome, PageOutcome::Appended(2));
    assert_eq!(ids(&feed), vec!["0", "1", "2", "3"]);
    assert_eq!(feed.skip(), 4);
}

#[tokio::test]
async fn test_failed_reload_leaves_feed_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..2)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Database unavailable"})))
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut feed = FeedState::new(FeedKind::Home, 10);
    feed.reload(&api, FeedFilters::default()).await.unwrap();

    let err = feed
        .reload(&api, FeedFilters::with_tag("space"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Database unavailable");
    assert_eq!(ids(&feed), vec!["0", "1"]);
    assert!(feed.filters().is_empty());
}

#[tokio::test]
async fn test_mine_feed_uses_own_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/me"))
        .and(query_param("limit", "5"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..1)))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut feed = FeedState::new(FeedKind::Mine, 5);
    feed.reload(&api, FeedFilters::default()).await.unwrap();
    assert_eq!(feed.len(), 1);
}

// ============================================================================
// Controller-driven loading
// ============================================================================

#[tokio::test]
async fn test_activating_home_loads_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..3)))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut controller = Controller::new(api, Settings::default());

    let tasks = controller.activate(View::Home);
    controller.run(tasks).await;

    assert_eq!(controller.feed(FeedKind::Home).len(), 3);
    assert!(controller.notice().is_none());
}

#[tokio::test]
async fn test_load_more_past_the_end_reports_no_more_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut controller = Controller::new(api, Settings::default());
    let tasks = controller.activate(View::Home);
    controller.run(tasks).await;

    let tasks = controller.load_more();
    controller.run(tasks).await;

    assert_eq!(controller.feed(FeedKind::Home).len(), 2);
    let notice = controller.notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.message, "No more posts");
}

#[tokio::test]
async fn test_mine_without_session_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..1)))
        .expect(0)
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut controller = Controller::new(api, Settings::default());

    let tasks = controller.activate(View::Mine);
    assert!(tasks.is_empty());
    controller.run(tasks).await;

    assert!(controller.feed(FeedKind::Mine).is_empty());
    assert_eq!(
        controller.notice().map(|n| n.message.as_str()),
        Some("Please sign in (register from the Profile view)")
    );
}

#[tokio::test]
async fn test_tag_filter_in_search_keeps_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("q", "mars"))
        .and(query_param_is_missing("tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("q", "mars"))
        .and(query_param("tag", "space"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..1)))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut controller = Controller::new(api, Settings::default());

    let tasks = controller.search("mars", None);
    controller.run(tasks).await;
    assert_eq!(controller.feed(FeedKind::Search).len(), 4);

    let tasks = controller.filter_by_tag("space");
    controller.run(tasks).await;

    let search = controller.feed(FeedKind::Search);
    assert_eq!(search.len(), 1);
    assert_eq!(search.filters().q(), Some("mars"));
    assert_eq!(search.filters().tag(), Some("space"));
    assert_eq!(controller.view(), View::Search);
}

#[tokio::test]
async fn test_choosing_a_top_tag_filters_home() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts/analytics/top-tags"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"tag": "space", "count": 4},
            {"tag": "rust", "count": 2}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("tag", "space"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(0..2)))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, SessionStore::in_memory());
    let mut controller = Controller::new(api, Settings::default());

    let tasks = controller.activate(View::Tags);
    controller.run(tasks).await;
    let tags: Vec<&str> = controller.top_tags().iter().map(|t| t.tag.as_str()).collect();
    assert_eq!(tags, vec!["space", "rust"]);

    let tasks = controller.filter_by_tag("space");
    controller.run(tasks).await;

    assert_eq!(controller.view(), View::Home);
    let home = controller.feed(FeedKind::Home);
    assert_eq!(home.len(), 2);
    assert_eq!(home.filters().tag(), Some("space"));
}
