//! Feed synchronization and view-state engine for the Cosmic blog API.
//!
//! - [`api`]: typed gateway to the REST backend
//! - [`session`]: bearer token and cached profile, persisted in [`storage`]
//! - [`feed`]: paginated post collections
//! - [`detail`]: the single-post view with comments and reactions
//! - [`form`]: create/edit draft and its mapping to posts
//! - [`controller`]: owns all of the above and reconciles after mutations
//!
//! The terminal front-end in the `cosmic` binary renders from [`controller::Controller`]
//! and invokes its operations on key presses.

pub mod api;
pub mod config;
pub mod controller;
pub mod detail;
pub mod feed;
pub mod form;
pub mod session;
pub mod storage;
pub mod util;
