//! Multi-record removals shared by post deletion and account deletion.
//!
//! The store has no cross-collection transactions. Once the primary record
//! is gone the remaining steps are best effort: each failure is collected,
//! logged for reconciliation and surfaced as an internal error.

use serde_json::json;
use tracing::{debug, error, info};

use crate::domain::ports::{EntityStoreError, EntityStores, Versioned};
use crate::domain::record_update::{MAX_UPDATE_ATTEMPTS, map_store_error, update_record};
use crate::domain::{Error, Post, UserId};

/// How to treat the owner's post list when removing a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OwnerLink {
    /// Remove the post id from the owner's list.
    Detach,
    /// Leave the owner untouched; the owner is being deleted as well.
    Skip,
}

/// Delete `post`, its comments and, optionally, the owner's reference.
///
/// The post is removed only at the revision it was read with. When a
/// concurrent writer (typically a comment append) got there first the post
/// is reloaded and the delete retried, so the cascade always covers the
/// comments of the record that was actually removed.
///
/// Returns `Ok(false)` when the post record was already gone.
pub(crate) async fn delete_post(
    stores: &EntityStores,
    post: Versioned<Post>,
    owner_link: OwnerLink,
) -> Result<bool, Error> {
    let post_id = post.record.id();
    let Some(post) = delete_at_current_revision(stores, post).await? else {
        return Ok(false);
    };

    let mut failures = Vec::new();
    for comment_id in post.comments() {
        if let Err(err) = stores.comments.delete(comment_id).await {
            failures.push(format!("delete comment {comment_id}: {err}"));
        }
    }
    if owner_link == OwnerLink::Detach {
        let owner = post.owner();
        let detached = update_record(stores.users.as_ref(), &owner, |user| {
            Ok(user.detach_post(post_id).into())
        })
        .await;
        if let Err(err) = detached {
            failures.push(format!("detach from owner {owner}: {err}"));
        }
    }

    if failures.is_empty() {
        info!(
            post_id = %post_id,
            comments = post.comments().len(),
            "post deleted"
        );
        return Ok(true);
    }
    error!(
        post_id = %post_id,
        reconciliation_required = true,
        failures = ?failures,
        "post deleted but cleanup was incomplete"
    );
    Err(Error::internal("post deletion left dangling references")
        .with_details(json!({ "postId": post_id })))
}

async fn delete_at_current_revision(
    stores: &EntityStores,
    mut current: Versioned<Post>,
) -> Result<Option<Post>, Error> {
    let post_id = current.record.id();
    for attempt in 1..=MAX_UPDATE_ATTEMPTS {
        match stores.posts.delete_at_revision(&post_id, current.revision).await {
            Ok(true) => return Ok(Some(current.into_record())),
            Ok(false) => return Ok(None),
            Err(EntityStoreError::RevisionMismatch { expected, actual }) => {
                debug!(
                    post_id = %post_id,
                    attempt,
                    expected,
                    actual,
                    "post changed before deletion; retrying"
                );
            }
            Err(other) => return Err(map_store_error(other)),
        }
        match stores.posts.find_by_id(&post_id).await.map_err(map_store_error)? {
            Some(fresh) => current = fresh,
            None => return Ok(None),
        }
    }
    Err(Error::internal(format!(
        "gave up deleting post {post_id} after {MAX_UPDATE_ATTEMPTS} attempts"
    )))
}

/// Remove `user_id` from every follow set and every like or validator set.
pub(crate) async fn detach_user_everywhere(
    stores: &EntityStores,
    user_id: UserId,
) -> Result<(), Error> {
    let mut failures = Vec::new();

    let followers = stores.users.list().await.map_err(map_store_error)?;
    for follower in followers
        .iter()
        .filter(|candidate| candidate.follows().contains(&user_id))
    {
        let follower_id = follower.id();
        let outcome = update_record(stores.users.as_ref(), &follower_id, |user| {
            Ok(user.unfollow(user_id).into())
        })
        .await;
        if let Err(err) = outcome {
            failures.push(format!("unfollow from {follower_id}: {err}"));
        }
    }

    let posts = stores.posts.list().await.map_err(map_store_error)?;
    for post in posts.iter().filter(|candidate| {
        candidate.likes().contains(&user_id) || candidate.validators().contains(&user_id)
    }) {
        let post_id = post.id();
        let outcome = update_record(stores.posts.as_ref(), &post_id, |post| {
            Ok(post.forget_user(user_id).into())
        })
        .await;
        if let Err(err) = outcome {
            failures.push(format!("forget on post {post_id}: {err}"));
        }
    }

    if failures.is_empty() {
        return Ok(());
    }
    error!(
        user_id = %user_id,
        reconciliation_required = true,
        failures = ?failures,
        "user deleted but references remain"
    );
    Err(Error::internal("user deletion left dangling references")
        .with_details(json!({ "userId": user_id })))
}
