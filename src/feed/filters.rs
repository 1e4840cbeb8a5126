use crate::util::MAX_FILTER_LENGTH;

/// Tag and search constraints on a feed.
///
/// The two axes are independent; either, both or neither may be set. Values
/// are trimmed on the way in and a blank value is the same as no value, so a
/// filter that reaches the query string is never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilters {
    tag: Option<String>,
    q: Option<String>,
}

fn normalize(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    if value.chars().count() > MAX_FILTER_LENGTH {
        tracing::debug!(max = MAX_FILTER_LENGTH, "Filter value truncated");
        return Some(value.chars().take(MAX_FILTER_LENGTH).collect());
    }
    Some(value.to_string())
}

impl FeedFilters {
    pub fn new(tag: Option<&str>, q: Option<&str>) -> Self {
        Self {
            tag: normalize(tag),
            q: normalize(q),
        }
    }

    pub fn with_tag(tag: &str) -> Self {
        Self::new(Some(tag), None)
    }

    pub fn with_query(q: &str) -> Self {
        Self::new(None, Some(q))
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.q.is_none()
    }

    /// Short human-readable form for the status line, e.g. `#space "mars"`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(tag) = &self.tag {
            parts.push(format!("#{tag}"));
        }
        if let Some(q) = &self.q {
            parts.push(format!("\"{q}\""));
        }
        parts.join(" ")
    }
}
