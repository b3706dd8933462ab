//! Post data model.
//!
//! A post carries its owner plus three relation sets: users who liked it,
//! users who validated (endorsed) it, and attached comments in insertion
//! order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CommentId, Membership, PostId, RelationSet, UserId};

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 120;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX: usize = 5000;
/// Maximum image proof reference length in characters.
pub const IMAGE_PROOF_MAX: usize = 2048;

/// Validation errors raised by [`PostContent::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostValidationError {
    /// A required field was blank.
    #[error("{field} must not be empty")]
    Empty {
        /// Offending field.
        field: &'static str,
    },
    /// A field exceeded its limit.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Offending field.
        field: &'static str,
        /// Maximum permitted length.
        max: usize,
    },
}

impl PostValidationError {
    /// Name of the request field the error refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } => field,
        }
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, PostValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PostValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(PostValidationError::TooLong { field, max });
    }
    Ok(value.to_owned())
}

/// Validated author-supplied fields of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostContent {
    title: String,
    description: String,
    image_proof: String,
}

impl PostContent {
    /// Validate title, description and image proof; each is trimmed.
    pub fn new(
        title: &str,
        description: &str,
        image_proof: &str,
    ) -> Result<Self, PostValidationError> {
        Ok(Self {
            title: required("title", title, TITLE_MAX)?,
            description: required("description", description, DESCRIPTION_MAX)?,
            image_proof: required("imageProof", image_proof, IMAGE_PROOF_MAX)?,
        })
    }

    /// Post title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Post body.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Reference to the proof image.
    pub fn image_proof(&self) -> &str {
        &self.image_proof
    }
}

/// A published post.
///
/// ## Invariants
/// - `owner` never changes after creation.
/// - Each relation set holds an identifier at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    id: PostId,
    #[serde(flatten)]
    content: PostContent,
    created_at: DateTime<Utc>,
    owner: UserId,
    #[serde(default)]
    likes: RelationSet<UserId>,
    #[serde(default)]
    comments: RelationSet<CommentId>,
    #[serde(default)]
    validators: RelationSet<UserId>,
}

impl Post {
    /// Build a new post with empty relation sets.
    #[must_use]
    pub fn new(id: PostId, content: PostContent, owner: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            content,
            created_at,
            owner,
            likes: RelationSet::new(),
            comments: RelationSet::new(),
            validators: RelationSet::new(),
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> PostId {
        self.id
    }

    /// Author-supplied content.
    pub fn content(&self) -> &PostContent {
        &self.content
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Owning user.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// Users who liked the post.
    pub fn likes(&self) -> &RelationSet<UserId> {
        &self.likes
    }

    /// Attached comments in insertion order.
    pub fn comments(&self) -> &RelationSet<CommentId> {
        &self.comments
    }

    /// Users who validated the post.
    pub fn validators(&self) -> &RelationSet<UserId> {
        &self.validators
    }

    /// Record a like from `user`.
    pub fn like(&mut self, user: UserId) -> Membership {
        self.likes.insert(user)
    }

    /// Record a validation from `user`.
    pub fn validate(&mut self, user: UserId) -> Membership {
        self.validators.insert(user)
    }

    /// Attach `comment` to the post.
    pub fn attach_comment(&mut self, comment: CommentId) -> Membership {
        self.comments.insert(comment)
    }

    /// Remove every trace of `user` from likes and validators.
    ///
    /// Reports [`Membership::Removed`] when either set changed.
    pub fn forget_user(&mut self, user: UserId) -> Membership {
        let liked = self.likes.remove(&user).changed();
        let validated = self.validators.remove(&user).changed();
        if liked || validated {
            Membership::Removed
        } else {
            Membership::Absent
        }
    }
}
