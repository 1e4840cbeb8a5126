//! Paginated post collections.
//!
//! Each logical feed (home, mine, search) owns a [`FeedState`]: the posts
//! accumulated so far, an offset cursor and the active filters.
//!
//! - **Reload**: fetch from offset 0 and replace the items
//! - **Load more**: fetch from the current cursor and append; the cursor
//!   advances by the number of posts actually returned
//!
//! Fetching and applying are split. [`FeedState::reload_request`] and
//! [`FeedState::load_more_request`] describe the page to fetch without
//! touching state; [`FeedState::apply_page`] merges the result once it
//! arrives. The terminal UI runs the fetch on a background task in between,
//! so results are applied in arrival order and a slow reload can overwrite a
//! newer one.
//!
//! # Example
//!
//! ```ignore
//! let mut home = FeedState::new(FeedKind::Home, 10);
//! home.reload(&api, FeedFilters::with_tag("space")).await?;
//! match home.load_more(&api).await? {
//!     PageOutcome::Exhausted => println!("No more posts"),
//!     _ => {}
//! }
//! ```

mod filters;
mod state;

pub use filters::FeedFilters;
pub use state::{FeedKind, FeedState, PageMode, PageOutcome, PageRequest};
