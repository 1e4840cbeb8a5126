//! Utility functions shared by the engine and the terminal front-end.
//!
//! - **URL validation**: API base URL and media links opened in the browser
//! - **Text processing**: control-character stripping, width-aware truncation,
//!   timestamp formatting

mod text;
mod url_validator;

pub use text::{
    display_width, format_relative_time, parse_timestamp, single_line, strip_control_chars,
    truncate_to_width,
};
pub use url_validator::{validate_base_url, validate_url_for_open, UrlValidationError};

/// Maximum accepted search query / tag filter length.
pub const MAX_FILTER_LENGTH: usize = 256;
