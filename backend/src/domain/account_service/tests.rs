//! Tests for the account service.

use std::sync::Mutex;

use rstest::rstest;
use zeroize::Zeroizing;

use super::*;
use crate::domain::ports::{EntityStore, PostCommand};
use crate::domain::testing::{World, fixture_timestamp, memory_stores};
use crate::domain::{CommentBody, DisplayName, ErrorCode, Post, PostContent, PostId};
use crate::outbound::memory::InMemoryEntityStore;

fn registration(login: &str, password: &str) -> RegistrationRequest {
    RegistrationRequest {
        credentials: LoginCredentials::try_from_parts(login, password).expect("credentials"),
        username: DisplayName::new("Some User").expect("display name"),
        image: Some("https://img.example/avatar.png".to_owned()),
        about_me: Some("   ".to_owned()),
    }
}

/// Users store whose next revision-checked delete races a post creation.
#[derive(Default)]
struct RacingUsers {
    inner: InMemoryEntityStore<User>,
    post_on_delete: Mutex<Option<Arc<dyn EntityStore<Post>>>>,
}

#[async_trait]
impl EntityStore<User> for RacingUsers {
    async fn create(&self, record: &User) -> Result<Versioned<User>, EntityStoreError> {
        self.inner.create(record).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Versioned<User>>, EntityStoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_unique_key(
        &self,
        key: &str,
    ) -> Result<Option<Versioned<User>>, EntityStoreError> {
        self.inner.find_by_unique_key(key).await
    }

    async fn populate(&self, ids: &[UserId]) -> Result<Vec<User>, EntityStoreError> {
        self.inner.populate(ids).await
    }

    async fn list(&self) -> Result<Vec<User>, EntityStoreError> {
        self.inner.list().await
    }

    async fn count(&self) -> Result<u64, EntityStoreError> {
        self.inner.count().await
    }

    async fn update(
        &self,
        record: &User,
        expected_revision: u64,
    ) -> Result<Versioned<User>, EntityStoreError> {
        self.inner.update(record, expected_revision).await
    }

    async fn delete(&self, id: &UserId) -> Result<bool, EntityStoreError> {
        self.inner.delete(id).await
    }

    async fn delete_at_revision(
        &self,
        id: &UserId,
        expected_revision: u64,
    ) -> Result<bool, EntityStoreError> {
        let rival = self.post_on_delete.lock().expect("rival lock").take();
        if let Some(posts) = rival {
            let content = PostContent::new("Late", "body", "img").expect("content");
            let post = Post::new(PostId::random(), content, *id, fixture_timestamp());
            posts.create(&post).await?;
            let Some(current) = self.inner.find_by_id(id).await? else {
                return Ok(false);
            };
            let mut next = current.record;
            next.attach_post(post.id());
            self.inner.update(&next, current.revision).await?;
        }
        self.inner.delete_at_revision(id, expected_revision).await
    }
}

async fn stored_user(world: &World, user_id: UserId) -> User {
    world
        .stores
        .users
        .find_by_id(&user_id)
        .await
        .expect("lookup")
        .expect("user exists")
        .record
}

#[rstest]
#[tokio::test]
async fn registration_attaches_guest_role_and_hashes_password() {
    let world = World::new().await;
    let user = world
        .accounts
        .register(registration("carol", "s3cret"))
        .await
        .expect("register");

    assert_eq!(user.roles().as_slice(), &[world.guest.id()]);
    assert!(user.credential().verify("s3cret"));
    assert_eq!(
        user.profile().image.as_deref(),
        Some("https://img.example/avatar.png")
    );
    assert!(user.profile().about_me.is_none());
}

#[rstest]
#[tokio::test]
async fn duplicate_login_is_rejected_with_field_details() {
    let world = World::new().await;
    world
        .accounts
        .register(registration("carol", "one"))
        .await
        .expect("first registration");
    let err = world
        .accounts
        .register(registration("  carol ", "two"))
        .await
        .expect_err("duplicate login");

    assert_eq!(err.code(), ErrorCode::AlreadyExists);
    assert_eq!(err.details(), Some(&json!({ "field": "login" })));
    assert_eq!(world.stores.users.count().await.expect("count"), 1);
}

#[rstest]
#[case("x", "login")]
#[case("bad login", "login")]
#[tokio::test]
async fn invalid_logins_are_rejected(#[case] login: &str, #[case] field: &str) {
    let world = World::new().await;
    let err = world
        .accounts
        .register(registration(login, "pw"))
        .await
        .expect_err("invalid login");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.details(), Some(&json!({ "field": field })));
}

#[rstest]
#[case("carol", "s3cret", true)]
#[case("carol", "wrong", false)]
#[case("nobody", "s3cret", false)]
#[tokio::test]
async fn authentication_checks_credentials(
    #[case] login: &str,
    #[case] password: &str,
    #[case] should_succeed: bool,
) {
    let world = World::new().await;
    let user = world
        .accounts
        .register(registration("carol", "s3cret"))
        .await
        .expect("register");
    let credentials = LoginCredentials::try_from_parts(login, password).expect("credentials");

    match (should_succeed, world.accounts.authenticate(&credentials).await) {
        (true, Ok(id)) => assert_eq!(id, user.id()),
        (false, Err(err)) => {
            assert_eq!(err.code(), ErrorCode::Unauthenticated);
            assert_eq!(err.message(), "invalid credentials");
        }
        (true, Err(err)) => panic!("expected success, got error: {err:?}"),
        (false, Ok(id)) => panic!("expected failure, got success: {id}"),
    }
}

#[rstest]
#[tokio::test]
async fn principal_reflects_current_roles() {
    let world = World::new().await;
    let dave = world.register("dave").await;
    assert_eq!(dave.roles(), &[world.guest.name().clone()]);

    let promoted = world.promote(&dave).await;
    assert!(promoted.has_role(world.admin.name()));
    assert!(
        world
            .accounts
            .resolve(&UserId::random())
            .await
            .expect("resolve")
            .is_none()
    );
}

#[rstest]
#[tokio::test]
async fn follow_twice_reports_already_exists() {
    let world = World::new().await;
    let alice = world.register("alice").await;
    let bob = world.register("bob").await;

    world
        .accounts
        .follow(Some(alice.clone()), bob.user_id())
        .await
        .expect("first follow");
    let err = world
        .accounts
        .follow(Some(alice.clone()), bob.user_id())
        .await
        .expect_err("second follow");

    assert_eq!(err.code(), ErrorCode::AlreadyExists);
    let stored = stored_user(&world, alice.user_id()).await;
    assert_eq!(stored.follows().as_slice(), &[bob.user_id()]);
}

#[rstest]
#[tokio::test]
async fn follow_rejects_self_and_unknown_targets() {
    let world = World::new().await;
    let alice = world.register("alice").await;

    let err = world
        .accounts
        .follow(Some(alice.clone()), alice.user_id())
        .await
        .expect_err("self follow");
    assert_eq!(err.code(), ErrorCode::InvalidOperation);

    let err = world
        .accounts
        .follow(Some(alice), UserId::random())
        .await
        .expect_err("unknown target");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn unfollow_twice_is_a_noop() {
    let world = World::new().await;
    let alice = world.register("alice").await;
    let bob = world.register("bob").await;
    world
        .accounts
        .follow(Some(alice.clone()), bob.user_id())
        .await
        .expect("follow");

    for _ in 0..2 {
        let user = world
            .accounts
            .unfollow(Some(alice.clone()), bob.user_id())
            .await
            .expect("unfollow");
        assert!(user.follows().is_empty());
    }
    let revision = world
        .stores
        .users
        .find_by_id(&alice.user_id())
        .await
        .expect("lookup")
        .expect("user exists")
        .revision;
    assert_eq!(revision, 3, "second unfollow must not write");
}

#[rstest]
#[tokio::test]
async fn self_role_grant_is_invalid() {
    let world = World::new().await;
    let root = world.register("root").await;
    let root = world.promote(&root).await;

    let err = world
        .accounts
        .grant_role(Some(root.clone()), root.user_id(), world.guest.id())
        .await
        .expect_err("self grant");
    assert_eq!(err.code(), ErrorCode::InvalidOperation);
}

#[rstest]
#[tokio::test]
async fn granting_a_held_role_keeps_one_entry() {
    let world = World::new().await;
    let root = world.register("root").await;
    let root = world.promote(&root).await;
    let bob = world.register("bob").await;
    world.promote(&bob).await;

    let err = world
        .accounts
        .grant_role(Some(root), bob.user_id(), world.admin.id())
        .await
        .expect_err("already admin");

    assert_eq!(err.code(), ErrorCode::AlreadyExists);
    let stored = stored_user(&world, bob.user_id()).await;
    let admin_entries = stored
        .roles()
        .iter()
        .filter(|role| **role == world.admin.id())
        .count();
    assert_eq!(admin_entries, 1);
}

#[rstest]
#[tokio::test]
async fn grant_role_requires_admin_and_existing_role() {
    let world = World::new().await;
    let alice = world.register("alice").await;
    let bob = world.register("bob").await;

    let err = world
        .accounts
        .grant_role(Some(alice.clone()), bob.user_id(), world.admin.id())
        .await
        .expect_err("not an admin");
    assert_eq!(err.code(), ErrorCode::Unauthorized);

    let alice = world.promote(&alice).await;
    let err = world
        .accounts
        .grant_role(Some(alice.clone()), bob.user_id(), RoleId::random())
        .await
        .expect_err("unknown role");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let bob_after = world
        .accounts
        .grant_role(Some(alice), bob.user_id(), world.admin.id())
        .await
        .expect("grant admin");
    assert!(bob_after.roles().contains(&world.admin.id()));
}

#[rstest]
#[tokio::test]
async fn password_change_requires_current_password() {
    let world = World::new().await;
    let alice = world.register("alice").await;

    let missing = ProfileUpdateRequest {
        new_password: Some(Zeroizing::new("fresh".to_owned())),
        ..ProfileUpdateRequest::default()
    };
    let err = world
        .accounts
        .update_profile(Some(alice.clone()), missing)
        .await
        .expect_err("missing current password");
    assert_eq!(err.code(), ErrorCode::InvalidOperation);

    let confirmed = ProfileUpdateRequest {
        username: Some(DisplayName::new("Alice Renamed").expect("display name")),
        new_password: Some(Zeroizing::new("fresh".to_owned())),
        current_password: Some(Zeroizing::new("password123".to_owned())),
        ..ProfileUpdateRequest::default()
    };
    let user = world
        .accounts
        .update_profile(Some(alice), confirmed)
        .await
        .expect("update profile");
    assert!(user.credential().verify("fresh"));
    assert_eq!(user.profile().username.as_ref(), "Alice Renamed");
}

#[rstest]
#[tokio::test]
async fn list_users_excludes_the_caller() {
    let world = World::new().await;
    let alice = world.register("alice").await;
    let bob = world.register("bob").await;

    let users = world
        .accounts
        .list_users(Some(alice))
        .await
        .expect("list users");
    let ids: Vec<UserId> = users.iter().map(User::id).collect();
    assert_eq!(ids, vec![bob.user_id()]);
}

#[rstest]
#[tokio::test]
async fn admin_queries_require_admin() {
    let world = World::new().await;
    let alice = world.register("alice").await;
    let err = world
        .accounts
        .count_users(Some(alice.clone()))
        .await
        .expect_err("not admin");
    assert_eq!(err.code(), ErrorCode::Unauthorized);

    let alice = world.promote(&alice).await;
    assert_eq!(
        world
            .accounts
            .count_users(Some(alice.clone()))
            .await
            .expect("count users"),
        1
    );
    let roles = world
        .accounts
        .list_roles(Some(alice))
        .await
        .expect("list roles");
    assert_eq!(roles.len(), 2);
}

#[rstest]
#[tokio::test]
async fn deleting_a_user_cascades_and_detaches_references() {
    let world = World::new().await;
    let alice = world.register("alice").await;
    let bob = world.register("bob").await;

    let alices_post = world
        .posts
        .create_post(
            Some(alice.clone()),
            PostContent::new("Mine", "body", "img").expect("content"),
        )
        .await
        .expect("alice posts");
    let bobs_post = world
        .posts
        .create_post(
            Some(bob.clone()),
            PostContent::new("Theirs", "body", "img").expect("content"),
        )
        .await
        .expect("bob posts");
    world
        .posts
        .add_comment(
            Some(bob.clone()),
            alices_post.id(),
            CommentBody::new("on alice").expect("comment"),
        )
        .await
        .expect("comment on alice");
    let kept_comment = world
        .posts
        .add_comment(
            Some(alice.clone()),
            bobs_post.id(),
            CommentBody::new("on bob").expect("comment"),
        )
        .await
        .expect("comment on bob");
    world
        .posts
        .like(Some(alice.clone()), bobs_post.id())
        .await
        .expect("like");
    world
        .posts
        .validate(Some(alice.clone()), bobs_post.id())
        .await
        .expect("validate");
    world
        .accounts
        .follow(Some(bob.clone()), alice.user_id())
        .await
        .expect("follow");

    world
        .accounts
        .delete_self(Some(alice.clone()))
        .await
        .expect("delete self");

    assert!(
        world
            .stores
            .users
            .find_by_id(&alice.user_id())
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(
        world
            .stores
            .posts
            .find_by_id(&alices_post.id())
            .await
            .expect("lookup")
            .is_none()
    );
    let remaining_comments = world.stores.comments.list().await.expect("comments");
    assert_eq!(remaining_comments, vec![kept_comment]);

    let bob_record = stored_user(&world, bob.user_id()).await;
    assert!(bob_record.follows().is_empty());
    let bobs_post = world
        .stores
        .posts
        .find_by_id(&bobs_post.id())
        .await
        .expect("lookup")
        .expect("bob's post survives")
        .record;
    assert!(bobs_post.likes().is_empty());
    assert!(bobs_post.validators().is_empty());
}

#[rstest]
#[tokio::test]
async fn admin_delete_of_unknown_user_is_not_found() {
    let world = World::new().await;
    let root = world.register("root").await;
    let root = world.promote(&root).await;
    let err = world
        .accounts
        .delete_user(Some(root), UserId::random())
        .await
        .expect_err("unknown user");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn deleting_a_user_cascades_posts_attached_mid_delete() {
    let racing = Arc::new(RacingUsers::default());
    let mut stores = memory_stores();
    stores.users = racing.clone();
    let world = World::with_stores(stores).await;
    let alice = world.register("alice").await;
    world
        .posts
        .create_post(
            Some(alice.clone()),
            PostContent::new("Mine", "body", "img").expect("content"),
        )
        .await
        .expect("alice posts");

    *racing.post_on_delete.lock().expect("rival lock") = Some(world.stores.posts.clone());
    world
        .accounts
        .delete_self(Some(alice.clone()))
        .await
        .expect("delete self");

    assert_eq!(world.stores.posts.count().await.expect("count"), 0);
    assert!(
        world
            .stores
            .users
            .find_by_id(&alice.user_id())
            .await
            .expect("lookup")
            .is_none()
    );
}
