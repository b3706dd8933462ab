//! Driving port for post mutations.
//!
//! Inbound adapters pass the resolved caller (or `None` for anonymous
//! requests) and let the service decide whether the caller may act.

use async_trait::async_trait;

use crate::domain::{Comment, CommentBody, Error, Post, PostContent, PostId, Principal};

/// Domain use-case port for creating and changing posts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostCommand: Send + Sync {
    /// Publish a post owned by the caller.
    ///
    /// Requires the guest role.
    async fn create_post(
        &self,
        principal: Option<Principal>,
        content: PostContent,
    ) -> Result<Post, Error>;

    /// Attach a new comment to an existing post.
    async fn add_comment(
        &self,
        principal: Option<Principal>,
        post_id: PostId,
        body: CommentBody,
    ) -> Result<Comment, Error>;

    /// Record the caller's like. A second like fails with `AlreadyExists`.
    async fn like(&self, principal: Option<Principal>, post_id: PostId) -> Result<Post, Error>;

    /// Record the caller's validation. A second validation fails with
    /// `AlreadyExists`.
    async fn validate(&self, principal: Option<Principal>, post_id: PostId)
    -> Result<Post, Error>;

    /// Delete a post owned by the caller together with its comments.
    async fn delete_post(&self, principal: Option<Principal>, post_id: PostId)
    -> Result<(), Error>;
}
