use crate::api::{ApiClient, ApiError, PageQuery, Post};

use super::FeedFilters;

/// The independently paginated collections the client keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Everyone's posts, optionally narrowed by tag.
    Home,
    /// Posts owned by the signed-in user (`GET /posts/me`).
    Mine,
    /// Search results.
    Search,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [FeedKind::Home, FeedKind::Mine, FeedKind::Search];

    pub fn label(self) -> &'static str {
        match self {
            FeedKind::Home => "Home",
            FeedKind::Mine => "My posts",
            FeedKind::Search => "Search",
        }
    }

    /// Only the caller's own feed needs a token.
    pub fn requires_auth(self) -> bool {
        self == FeedKind::Mine
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    Reload,
    LoadMore,
}

/// One page fetch, captured when it is issued.
///
/// The request carries its own cursor and filters, so it stays meaningful
/// even if the feed changes before the response arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub kind: FeedKind,
    pub mode: PageMode,
    pub filters: FeedFilters,
    pub limit: usize,
    pub skip: usize,
}

impl PageRequest {
    pub fn query(&self) -> PageQuery {
        PageQuery {
            limit: self.limit,
            skip: self.skip,
            tag: self.filters.tag().map(str::to_string),
            q: self.filters.q().map(str::to_string),
        }
    }

    pub async fn fetch(&self, api: &ApiClient) -> Result<Vec<Post>, ApiError> {
        tracing::debug!(
            feed = self.kind.label(),
            mode = ?self.mode,
            skip = self.skip,
            limit = self.limit,
            "Fetching page"
        );
        match self.kind {
            FeedKind::Mine => api.my_posts(self.limit, self.skip).await,
            FeedKind::Home | FeedKind::Search => api.list_posts(&self.query()).await,
        }
    }
}

/// What applying a page did to the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Items replaced by a reload; carries the new item count.
    Replaced(usize),
    /// Items appended by a load-more; carries the number appended.
    Appended(usize),
    /// Load-more returned nothing. The feed is unchanged.
    Exhausted,
}

/// Accumulated posts plus the offset cursor for one feed.
///
/// `skip` always equals the number of posts received since the last reload.
/// Duplicates are not removed: if the backend's ordering shifts between
/// pages, the same post may appear twice.
#[derive(Debug, Clone)]
pub struct FeedState {
    kind: FeedKind,
    items: Vec<Post>,
    skip: usize,
    limit: usize,
    filters: FeedFilters,
    loaded: bool,
}

impl FeedState {
    /// Empty feed. `limit` is clamped to at least 1.
    pub fn new(kind: FeedKind, limit: usize) -> Self {
        Self {
            kind,
            items: Vec::new(),
            skip: 0,
            limit: limit.max(1),
            filters: FeedFilters::default(),
            loaded: false,
        }
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn items(&self) -> &[Post] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Post> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn filters(&self) -> &FeedFilters {
        &self.filters
    }

    /// True once any reload has been applied.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.items.iter().any(|p| p.id == post_id)
    }

    /// Drop everything, e.g. when the session that owned "mine" signs out.
    pub fn clear(&mut self) {
        self.items.clear();
        self.skip = 0;
        self.loaded = false;
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// First page for `filters`. The feed itself is untouched until the
    /// result is applied.
    pub fn reload_request(&self, filters: FeedFilters) -> PageRequest {
        PageRequest {
            kind: self.kind,
            mode: PageMode::Reload,
            filters,
            limit: self.limit,
            skip: 0,
        }
    }

    /// Reload with the filters currently in effect.
    pub fn refresh_request(&self) -> PageRequest {
        self.reload_request(self.filters.clone())
    }

    /// Next page after what is already held, with the same filters.
    pub fn load_more_request(&self) -> PageRequest {
        PageRequest {
            kind: self.kind,
            mode: PageMode::LoadMore,
            filters: self.filters.clone(),
            limit: self.limit,
            skip: self.skip,
        }
    }

    // ========================================================================
    // Merging
    // ========================================================================

    /// Merge a fetched page.
    ///
    /// A reload replaces the items and filters and sets the cursor to the
    /// number of posts received. A load-more appends and advances the cursor
    /// by the page length, so a short final page still leaves it exact. An
    /// empty load-more page changes nothing.
    pub fn apply_page(&mut self, request: &PageRequest, mut posts: Vec<Post>) -> PageOutcome {
        match request.mode {
            PageMode::Reload => {
                if posts.len() > self.limit {
                    tracing::warn!(
                        feed = self.kind.label(),
                        received = posts.len(),
                        limit = self.limit,
                        "Server returned more posts than requested, truncating"
                    );
                    posts.truncate(self.limit);
                }
                self.filters = request.filters.clone();
                self.items = posts;
                self.skip = self.items.len();
                self.loaded = true;
                PageOutcome::Replaced(self.items.len())
            }
            PageMode::LoadMore => {
                if posts.is_empty() {
                    return PageOutcome::Exhausted;
                }
                let count = posts.len();
                self.items.extend(posts);
                self.skip += count;
                PageOutcome::Appended(count)
            }
        }
    }

    // ========================================================================
    // Fetch and merge in one step
    // ========================================================================

    pub async fn reload(
        &mut self,
        api: &ApiClient,
        filters: FeedFilters,
    ) -> Result<PageOutcome, ApiError> {
        let request = self.reload_request(filters);
        let posts = request.fetch(api).await?;
        Ok(self.apply_page(&request, posts))
    }

    pub async fn load_more(&mut self, api: &ApiClient) -> Result<PageOutcome, ApiError> {
        let request = self.load_more_request();
        let posts = request.fetch(api).await?;
        Ok(self.apply_page(&request, posts))
    }
}
