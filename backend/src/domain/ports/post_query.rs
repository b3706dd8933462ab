//! Driving port for post reads.

use async_trait::async_trait;

use crate::domain::{Comment, Error, Post, PostId, Principal, User, UserId};

/// A post with its comments resolved in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDetail {
    /// The post record.
    pub post: Post,
    /// Comments that still exist, in the post's comment order.
    pub comments: Vec<Comment>,
}

/// Domain use-case port for reading posts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostQuery: Send + Sync {
    /// Fetch one post and its comments. Requires the guest role.
    async fn get_post(
        &self,
        principal: Option<Principal>,
        post_id: PostId,
    ) -> Result<PostDetail, Error>;

    /// Every post in creation order.
    async fn list_posts(&self, principal: Option<Principal>) -> Result<Vec<Post>, Error>;

    /// Posts owned by `user_id`, or by the caller when `user_id` is `None`.
    async fn list_posts_for_user(
        &self,
        principal: Option<Principal>,
        user_id: Option<UserId>,
    ) -> Result<Vec<Post>, Error>;

    /// Number of likes on a post.
    async fn count_likes(&self, principal: Option<Principal>, post_id: PostId)
    -> Result<u64, Error>;

    /// Users who validated a post, in validation order.
    async fn list_validators(
        &self,
        principal: Option<Principal>,
        post_id: PostId,
    ) -> Result<Vec<User>, Error>;
}
