//! Gateway to the blog REST API.
//!
//! - [`client`] - `ApiClient`: auth header injection, error normalization, typed endpoints
//! - [`types`] - records exchanged with the backend (`Post`, `Comment`, ...)
//!
//! Payloads are validated at this boundary: a 2xx response that does not
//! decode into the expected record is reported as [`ApiError::Malformed`]
//! instead of leaking half-filled values into the view state.

mod client;
mod types;

pub use client::{ApiClient, ApiError, DEFAULT_BASE_URL};
pub use types::{
    Comment, PageQuery, Post, PostPayload, ReactionCount, ReactionKind, RegisterResponse,
    TagCount, User,
};
