//! Domain primitives, engines and services.
//!
//! Purpose: Define the four entities (users, posts, comments, roles), the
//! relation sets linking them, the authorization rules gating every action
//! and the services that keep multi-record writes consistent. Nothing here
//! depends on HTTP or a concrete store.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Post, Comment, Role and their validated fields.
//! - RelationSet / Membership: idempotent ordered relations.
//! - RolePolicy / Capability / Principal: authorization.
//! - PostService / AccountService: implementations of the driving ports.

pub mod account_service;
pub mod auth;
pub mod authorization;
mod cascade;
pub mod comment;
pub mod error;
pub mod ids;
pub mod ports;
pub mod post;
pub mod post_service;
pub mod principal;
pub mod record_update;
pub mod relation;
pub mod role;
pub mod role_bootstrap;
#[cfg(test)]
pub(crate) mod testing;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::authorization::{Capability, RolePolicy};
pub use self::comment::{COMMENT_MAX, Comment, CommentBody, CommentValidationError};
pub use self::error::{Error, ErrorCode};
pub use self::ids::{CommentId, EntityId, IdValidationError, PostId, RoleId, UserId};
pub use self::post::{Post, PostContent, PostValidationError};
pub use self::post_service::PostService;
pub use self::principal::Principal;
pub use self::record_update::{MAX_UPDATE_ATTEMPTS, RecordChange, update_record};
pub use self::relation::{Membership, RelationSet};
pub use self::role::{Role, RoleName, RoleNameError};
pub use self::role_bootstrap::{resolve_role, seed_roles};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    CredentialHash, DisplayName, Login, User, UserProfile, UserValidationError,
};
