//! Driven port for the generic document store.
//!
//! Every collection (users, posts, comments, roles) is reached through the
//! same [`EntityStore`] contract. Records are opaque serialisable documents
//! keyed by their typed identifier; the store owns a monotonically increasing
//! revision per record that backs compare-and-swap updates.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{Comment, CommentId, EntityId, Post, PostId, Role, RoleId, User, UserId};

use super::define_port_error;

/// Named collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Posts,
    Comments,
    Roles,
}

impl Collection {
    /// Stable collection name used by persistence adapters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Posts => "posts",
            Self::Comments => "comments",
            Self::Roles => "roles",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that can live in an [`EntityStore`].
pub trait Document: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Identifier type of the record.
    type Id: EntityId;

    /// Collection the record belongs to.
    const COLLECTION: Collection;

    /// Identifier of this record.
    fn id(&self) -> Self::Id;

    /// Optional key that must be unique within the collection.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

impl Document for User {
    type Id = UserId;
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> UserId {
        User::id(self)
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.login().to_string())
    }
}

impl Document for Role {
    type Id = RoleId;
    const COLLECTION: Collection = Collection::Roles;

    fn id(&self) -> RoleId {
        Role::id(self)
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.name().to_string())
    }
}

impl Document for Post {
    type Id = PostId;
    const COLLECTION: Collection = Collection::Posts;

    fn id(&self) -> PostId {
        Post::id(self)
    }
}

impl Document for Comment {
    type Id = CommentId;
    const COLLECTION: Collection = Collection::Comments;

    fn id(&self) -> CommentId {
        Comment::id(self)
    }
}

/// Stored record together with its store-managed revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<R> {
    /// Record contents.
    pub record: R,
    /// Revision of the stored copy; starts at 1.
    pub revision: u64,
}

impl<R> Versioned<R> {
    /// Discard the revision.
    pub fn into_record(self) -> R {
        self.record
    }
}

define_port_error! {
    /// Errors raised by entity store adapters.
    pub enum EntityStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "entity store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "entity store query failed: {message}",
        /// A stored document could not be encoded or decoded.
        Serialization { message: String } => "entity store serialization failed: {message}",
        /// The addressed record does not exist.
        NotFound { collection: String, id: String } => "{collection} record {id} not found",
        /// The stored revision differs from the expected one.
        RevisionMismatch { expected: u64, actual: u64 } =>
            "revision mismatch: expected {expected}, found {actual}",
        /// Another record already holds the unique key.
        DuplicateKey { collection: String, key: String } =>
            "{collection} already holds a record keyed {key}",
    }
}

/// Generic persistence contract shared by every collection.
///
/// Adapters must apply `update` atomically: the write succeeds only when the
/// stored revision equals `expected_revision`, and it bumps the revision by
/// one.
#[async_trait]
pub trait EntityStore<R: Document>: Send + Sync {
    /// Insert a new record at revision 1.
    ///
    /// Fails with [`EntityStoreError::DuplicateKey`] when the record's unique
    /// key or id is already taken.
    async fn create(&self, record: &R) -> Result<Versioned<R>, EntityStoreError>;

    /// Fetch a record by identifier.
    async fn find_by_id(&self, id: &R::Id) -> Result<Option<Versioned<R>>, EntityStoreError>;

    /// Fetch a record by its unique key.
    async fn find_by_unique_key(&self, key: &str)
    -> Result<Option<Versioned<R>>, EntityStoreError>;

    /// Resolve `ids` in the given order, skipping identifiers with no record.
    async fn populate(&self, ids: &[R::Id]) -> Result<Vec<R>, EntityStoreError>;

    /// Every record in creation order.
    async fn list(&self) -> Result<Vec<R>, EntityStoreError>;

    /// Number of records.
    async fn count(&self) -> Result<u64, EntityStoreError>;

    /// Replace a record if its stored revision equals `expected_revision`.
    async fn update(
        &self,
        record: &R,
        expected_revision: u64,
    ) -> Result<Versioned<R>, EntityStoreError>;

    /// Remove a record; returns whether it existed.
    async fn delete(&self, id: &R::Id) -> Result<bool, EntityStoreError>;

    /// Remove a record only while its revision still equals
    /// `expected_revision`.
    ///
    /// Returns `Ok(false)` when the record is already gone and
    /// [`EntityStoreError::RevisionMismatch`] when another writer changed it.
    async fn delete_at_revision(
        &self,
        id: &R::Id,
        expected_revision: u64,
    ) -> Result<bool, EntityStoreError>;
}

/// One store handle per collection.
#[derive(Clone)]
pub struct EntityStores {
    /// User records.
    pub users: Arc<dyn EntityStore<User>>,
    /// Post records.
    pub posts: Arc<dyn EntityStore<Post>>,
    /// Comment records.
    pub comments: Arc<dyn EntityStore<Comment>>,
    /// Role records.
    pub roles: Arc<dyn EntityStore<Role>>,
}
