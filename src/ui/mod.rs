//! Terminal User Interface module.
//!
//! A thin ratatui front-end over [`cosmic::controller::Controller`]:
//! - Main event loop (`run`)
//! - Input handling for lists, the post view, the compose form and prompts
//! - Rendering for every view plus the help and confirm overlays
//! - Background task event processing
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Applies finished tasks to the controller
//! - `render` - View rendering dispatch
//! - `helpers` - Task spawning and panic capture
//! - `posts` - Post list widget
//! - `post_view` - Open post with comments and reactions
//! - `compose` - Create/edit form
//! - `profile` - Session and server panel
//! - `tags` - Top tags list
//! - `status` - Status bar widget
//! - `help` - Help overlay

mod compose;
mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod post_view;
mod posts;
mod profile;
mod render;
mod status;
mod tags;

pub use loop_runner::{run, Action};
