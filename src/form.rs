//! Create/edit form state and its mapping to and from posts.
//!
//! The backend stores a single `content` string. The form splits it into a
//! title line and a body, and joins them back as `title + "\n\n" + body` on
//! save. At most one [`Draft`] is live; its `editing_post_id` decides whether
//! a save creates (`POST /posts`) or updates (`PUT /posts/{id}`).

use thiserror::Error;

use crate::api::{Post, PostPayload};

/// Category used when a post carries none.
pub const DEFAULT_CATEGORY: &str = "general";
/// Status sent with every save.
pub const DEFAULT_STATUS: &str = "published";
/// Derived titles are capped at this many characters.
pub const MAX_TITLE_CHARS: usize = 120;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Body is required")]
    MissingBody,
}

/// Split into lines on `\n`, dropping the `\r` of a CRLF terminator.
///
/// The final piece keeps any trailing `\r`, so a string with no `\n` comes
/// back exactly as given.
fn lines_with_rest(content: &str) -> impl Iterator<Item = (&str, &str)> {
    let mut offset = 0;
    content.split_inclusive('\n').map(move |piece| {
        offset += piece.len();
        let line = match piece.strip_suffix('\n') {
            Some(line) => line.strip_suffix('\r').unwrap_or(line),
            None => piece,
        };
        (line, &content[offset..])
    })
}

/// Title derived from post content: the first non-blank line, capped at
/// [`MAX_TITLE_CHARS`] characters.
///
/// A string without line breaks is returned unchanged when it fits, and
/// truncated otherwise. Content with no non-blank line yields its first line.
///
/// ```
/// use cosmic::form::extract_title_from_content;
///
/// assert_eq!(extract_title_from_content("\n\nHello\nworld"), "Hello");
/// assert_eq!(extract_title_from_content("single line"), "single line");
/// ```
pub fn extract_title_from_content(content: &str) -> String {
    let line = lines_with_rest(content)
        .map(|(line, _)| line)
        .find(|line| !line.trim().is_empty())
        .or_else(|| lines_with_rest(content).map(|(line, _)| line).next())
        .unwrap_or("");
    line.chars().take(MAX_TITLE_CHARS).collect()
}

/// Split content at its first non-blank line: `(line, everything after it)`.
fn split_title_line(content: &str) -> (&str, &str) {
    lines_with_rest(content)
        .find(|(line, _)| !line.trim().is_empty())
        .unwrap_or(("", ""))
}

/// Split a comma-separated tag field: pieces trimmed, empties dropped, order kept.
///
/// ```
/// use cosmic::form::split_tags;
///
/// assert_eq!(split_tags("a, b ,, c"), vec!["a", "b", "c"]);
/// ```
pub fn split_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of [`split_tags`] for display in the form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

/// Which form field has input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Body,
    Image,
    Category,
    Tags,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Title,
        FormField::Body,
        FormField::Image,
        FormField::Category,
        FormField::Tags,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Body => "Body",
            FormField::Image => "Image URL",
            FormField::Category => "Category",
            FormField::Tags => "Tags (comma separated)",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Only the body accepts line breaks.
    pub fn is_multiline(self) -> bool {
        self == FormField::Body
    }
}

/// Editable form values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub title: String,
    pub body: String,
    pub image: String,
    pub category: String,
    pub tags: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            image: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            tags: String::new(),
        }
    }
}

impl FormFields {
    /// Map a post onto form fields.
    ///
    /// Without an explicit title, the first non-blank line of `content` is the
    /// title and the rest (trimmed) is the body. With one, the body is the
    /// content minus a leading line equal to that title.
    pub fn from_post(post: &Post) -> Self {
        let (first_line, rest) = split_title_line(&post.content);
        let (title, body) = match post.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => {
                let body = if first_line.trim() == title {
                    rest.trim()
                } else {
                    post.content.trim()
                };
                (title.to_string(), body.to_string())
            }
            _ => (first_line.trim().to_string(), rest.trim().to_string()),
        };

        let category = post
            .category_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();

        Self {
            title,
            body,
            image: post.media_url().unwrap_or_default().to_string(),
            category,
            tags: join_tags(&post.tags),
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Body => &self.body,
            FormField::Image => &self.image,
            FormField::Category => &self.category,
            FormField::Tags => &self.tags,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Title => &mut self.title,
            FormField::Body => &mut self.body,
            FormField::Image => &mut self.image,
            FormField::Category => &mut self.category,
            FormField::Tags => &mut self.tags,
        }
    }

    /// Build the save payload. Fails before any network call when the title
    /// or body is blank.
    pub fn to_payload(&self, author_id: &str) -> Result<PostPayload, FormError> {
        let title = self.title.trim();
        let body = self.body.trim();
        if title.is_empty() {
            return Err(FormError::MissingTitle);
        }
        if body.is_empty() {
            return Err(FormError::MissingBody);
        }

        let image = self.image.trim();
        let category = self.category.trim();

        Ok(PostPayload {
            author_id: author_id.to_string(),
            content: format!("{title}\n\n{body}"),
            media_url: (!image.is_empty()).then(|| image.to_string()),
            category_id: if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_string()
            },
            status: DEFAULT_STATUS.to_string(),
            tags: split_tags(&self.tags),
        })
    }
}

/// A validated save, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// `None` creates a post, `Some(id)` updates that post.
    pub target: Option<String>,
    pub payload: PostPayload,
}

/// The single live create/edit draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    editing_post_id: Option<String>,
    pub fields: FormFields,
}

impl Draft {
    /// Draft loaded from `post`; the next save updates it.
    pub fn edit(post: &Post) -> Self {
        Self {
            editing_post_id: Some(post.id.clone()),
            fields: FormFields::from_post(post),
        }
    }

    pub fn editing_post_id(&self) -> Option<&str> {
        self.editing_post_id.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing_post_id.is_some()
    }

    /// Back to an empty create-mode draft.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn save_request(&self, author_id: &str) -> Result<SaveRequest, FormError> {
        Ok(SaveRequest {
            target: self.editing_post_id.clone(),
            payload: self.fields.to_payload(author_id)?,
        })
    }
}
