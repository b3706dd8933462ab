//! Post domain service.
//!
//! Implements [`PostCommand`] and [`PostQuery`] on top of the entity store:
//! authorization first, then the relation change, then the multi-record
//! lifecycle with compensation.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::domain::authorization::require_owner;
use crate::domain::cascade::{self, OwnerLink};
use crate::domain::ports::{EntityStores, PostCommand, PostDetail, PostQuery, Versioned};
use crate::domain::record_update::{RecordChange, map_store_error, update_record};
use crate::domain::{
    Capability, Comment, CommentBody, CommentId, Error, Membership, Post, PostContent, PostId,
    Principal, RolePolicy, User, UserId,
};

/// Post service implementing the post driving ports.
#[derive(Clone)]
pub struct PostService {
    stores: EntityStores,
    policy: RolePolicy,
    clock: Arc<dyn Clock>,
}

impl PostService {
    /// Create a service over the given stores.
    pub fn new(stores: EntityStores, policy: RolePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            policy,
            clock,
        }
    }

    fn post_not_found(post_id: PostId) -> Error {
        Error::not_found(format!("post {post_id} not found"))
    }

    async fn load_post(&self, post_id: PostId) -> Result<Versioned<Post>, Error> {
        self.stores
            .posts
            .find_by_id(&post_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Self::post_not_found(post_id))
    }

    /// Roll back a post whose owner could not be updated.
    async fn discard_post(&self, post_id: PostId, cause: Error) -> Error {
        warn!(post_id = %post_id, error = %cause, "owner update failed; removing created post");
        match self.stores.posts.delete(&post_id).await {
            Ok(_) => cause,
            Err(err) => {
                error!(
                    post_id = %post_id,
                    reconciliation_required = true,
                    error = %err,
                    "failed to remove orphaned post"
                );
                Error::internal("post creation could not be rolled back")
                    .with_details(json!({ "orphanedPostId": post_id }))
            }
        }
    }

    /// Roll back a comment that could not be attached to its post.
    async fn discard_comment(&self, comment_id: CommentId, cause: Error) -> Error {
        warn!(comment_id = %comment_id, error = %cause, "comment attach failed; removing comment");
        match self.stores.comments.delete(&comment_id).await {
            Ok(_) => cause,
            Err(err) => {
                error!(
                    comment_id = %comment_id,
                    reconciliation_required = true,
                    error = %err,
                    "failed to remove orphaned comment"
                );
                Error::internal("comment creation could not be rolled back")
                    .with_details(json!({ "orphanedCommentId": comment_id }))
            }
        }
    }

    /// Add `user_id` to one of the post's relation sets.
    async fn endorse(
        &self,
        post_id: PostId,
        user_id: UserId,
        relation: &'static str,
        apply: fn(&mut Post, UserId) -> Membership,
    ) -> Result<Post, Error> {
        let updated = update_record(self.stores.posts.as_ref(), &post_id, |post| {
            match apply(post, user_id) {
                Membership::Added => Ok(RecordChange::Modified),
                _ => {
                    debug!(post_id = %post_id, user_id = %user_id, relation, "duplicate rejected");
                    Err(Error::already_exists(format!("post already {relation} by user")))
                }
            }
        })
        .await?;
        updated
            .map(Versioned::into_record)
            .ok_or_else(|| Self::post_not_found(post_id))
    }
}

fn saturating_len(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[async_trait]
impl PostCommand for PostService {
    async fn create_post(
        &self,
        principal: Option<Principal>,
        content: PostContent,
    ) -> Result<Post, Error> {
        let principal = self.policy.require(principal.as_ref(), Capability::Guest)?;
        let owner_id = principal.user_id();
        let post = Post::new(PostId::random(), content, owner_id, self.clock.utc());
        let post_id = post.id();
        let created = self
            .stores
            .posts
            .create(&post)
            .await
            .map_err(map_store_error)?;

        let attached = update_record(self.stores.users.as_ref(), &owner_id, |user| {
            Ok(user.attach_post(post_id).into())
        })
        .await;
        match attached {
            Ok(Some(_)) => {
                info!(post_id = %post_id, owner_id = %owner_id, "post created");
                Ok(created.record)
            }
            Ok(None) => Err(self
                .discard_post(post_id, Error::not_found(format!("user {owner_id} not found")))
                .await),
            Err(err) => Err(self.discard_post(post_id, err).await),
        }
    }

    async fn add_comment(
        &self,
        principal: Option<Principal>,
        post_id: PostId,
        body: CommentBody,
    ) -> Result<Comment, Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        self.load_post(post_id).await?;

        let comment = Comment::new(
            CommentId::random(),
            body,
            principal.user_id(),
            self.clock.utc(),
        );
        let comment_id = comment.id();
        self.stores
            .comments
            .create(&comment)
            .await
            .map_err(map_store_error)?;

        let attached = update_record(self.stores.posts.as_ref(), &post_id, |post| {
            Ok(post.attach_comment(comment_id).into())
        })
        .await;
        match attached {
            Ok(Some(_)) => {
                info!(post_id = %post_id, comment_id = %comment_id, "comment added");
                Ok(comment)
            }
            Ok(None) => Err(self
                .discard_comment(comment_id, Self::post_not_found(post_id))
                .await),
            Err(err) => {
                let cause = Error::internal(format!(
                    "failed to attach comment to post {post_id}: {}",
                    err.message()
                ));
                Err(self.discard_comment(comment_id, cause).await)
            }
        }
    }

    async fn like(&self, principal: Option<Principal>, post_id: PostId) -> Result<Post, Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        self.endorse(post_id, principal.user_id(), "liked", Post::like)
            .await
    }

    async fn validate(
        &self,
        principal: Option<Principal>,
        post_id: PostId,
    ) -> Result<Post, Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        self.endorse(post_id, principal.user_id(), "validated", Post::validate)
            .await
    }

    async fn delete_post(
        &self,
        principal: Option<Principal>,
        post_id: PostId,
    ) -> Result<(), Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        let post = self.load_post(post_id).await?;
        require_owner(principal, &post.record)?;

        if cascade::delete_post(&self.stores, post, OwnerLink::Detach).await? {
            Ok(())
        } else {
            Err(Self::post_not_found(post_id))
        }
    }
}

#[async_trait]
impl PostQuery for PostService {
    async fn get_post(
        &self,
        principal: Option<Principal>,
        post_id: PostId,
    ) -> Result<PostDetail, Error> {
        self.policy.require(principal.as_ref(), Capability::Guest)?;
        let post = self.load_post(post_id).await?.into_record();
        let comments = self
            .stores
            .comments
            .populate(post.comments().as_slice())
            .await
            .map_err(map_store_error)?;
        Ok(PostDetail { post, comments })
    }

    async fn list_posts(&self, principal: Option<Principal>) -> Result<Vec<Post>, Error> {
        self.policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        self.stores.posts.list().await.map_err(map_store_error)
    }

    async fn list_posts_for_user(
        &self,
        principal: Option<Principal>,
        user_id: Option<UserId>,
    ) -> Result<Vec<Post>, Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        let target = user_id.unwrap_or_else(|| principal.user_id());
        let user: User = self
            .stores
            .users
            .find_by_id(&target)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("user {target} not found")))?
            .into_record();
        self.stores
            .posts
            .populate(user.posts().as_slice())
            .await
            .map_err(map_store_error)
    }

    async fn count_likes(
        &self,
        principal: Option<Principal>,
        post_id: PostId,
    ) -> Result<u64, Error> {
        self.policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        let post = self.load_post(post_id).await?;
        Ok(saturating_len(post.record.likes().len()))
    }

    async fn list_validators(
        &self,
        principal: Option<Principal>,
        post_id: PostId,
    ) -> Result<Vec<User>, Error> {
        self.policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        let post = self.load_post(post_id).await?;
        self.stores
            .users
            .populate(post.record.validators().as_slice())
            .await
            .map_err(map_store_error)
    }
}
