//! Comment data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CommentId, UserId};

/// Maximum length of a comment body in characters.
pub const COMMENT_MAX: usize = 2000;

/// Validation errors raised by [`CommentBody::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentValidationError {
    /// Body was blank.
    #[error("comment must not be empty")]
    Empty,
    /// Body exceeded [`COMMENT_MAX`].
    #[error("comment must be at most {max} characters")]
    TooLong {
        /// Maximum permitted length.
        max: usize,
    },
}

/// Validated comment text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommentBody(String);

impl CommentBody {
    /// Validate and construct a comment body.
    pub fn new(text: impl Into<String>) -> Result<Self, CommentValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(CommentValidationError::Empty);
        }
        if text.chars().count() > COMMENT_MAX {
            return Err(CommentValidationError::TooLong { max: COMMENT_MAX });
        }
        Ok(Self(text))
    }
}

impl AsRef<str> for CommentBody {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<CommentBody> for String {
    fn from(value: CommentBody) -> Self {
        value.0
    }
}

impl TryFrom<String> for CommentBody {
    type Error = CommentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A comment attached to exactly one post through the post's comment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    id: CommentId,
    description: CommentBody,
    author: UserId,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// Build a new comment record.
    #[must_use]
    pub fn new(
        id: CommentId,
        description: CommentBody,
        author: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            description,
            author,
            created_at,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> CommentId {
        self.id
    }

    /// Comment text.
    pub fn description(&self) -> &CommentBody {
        &self.description
    }

    /// Author; kept after the author's account is deleted.
    pub fn author(&self) -> UserId {
        self.author
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
