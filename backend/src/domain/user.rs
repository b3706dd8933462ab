//! User data model.
//!
//! A [`User`] owns its credential hash, public profile and three relation
//! sets: granted roles, owned posts and followed users. Relation sets hold
//! identifiers only; the referenced records live in their own collections.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::domain::{Error, Membership, PostId, RelationSet, RoleId, UserId};

/// Validation errors raised while building user fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyLogin,
    LoginTooShort { min: usize },
    LoginTooLong { max: usize },
    LoginInvalidCharacters,
    EmptyDisplayName,
    DisplayNameTooShort { min: usize },
    DisplayNameTooLong { max: usize },
    DisplayNameInvalidCharacters,
    EmptyPassword,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLogin => write!(f, "login must not be empty"),
            Self::LoginTooShort { min } => write!(f, "login must be at least {min} characters"),
            Self::LoginTooLong { max } => write!(f, "login must be at most {max} characters"),
            Self::LoginInvalidCharacters => write!(
                f,
                "login may only contain letters, numbers, dots, dashes, underscores, or @",
            ),
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooShort { min } => {
                write!(f, "display name must be at least {min} characters")
            }
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
            Self::DisplayNameInvalidCharacters => write!(
                f,
                "display name may only contain letters, numbers, spaces, or underscores",
            ),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

impl UserValidationError {
    /// Name of the request field the error refers to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyLogin
            | Self::LoginTooShort { .. }
            | Self::LoginTooLong { .. }
            | Self::LoginInvalidCharacters => "login",
            Self::EmptyDisplayName
            | Self::DisplayNameTooShort { .. }
            | Self::DisplayNameTooLong { .. }
            | Self::DisplayNameInvalidCharacters => "username",
            Self::EmptyPassword => "password",
        }
    }
}

/// Minimum allowed length for a login.
pub const LOGIN_MIN: usize = 3;
/// Maximum allowed length for a login.
pub const LOGIN_MAX: usize = 64;
/// Minimum allowed length for a display name.
pub const DISPLAY_NAME_MIN: usize = 3;
/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 32;

static LOGIN_RE: OnceLock<Regex> = OnceLock::new();
static DISPLAY_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn login_regex() -> &'static Regex {
    LOGIN_RE.get_or_init(|| {
        Regex::new("^[A-Za-z0-9_.@-]+$")
            .unwrap_or_else(|error| panic!("login regex failed to compile: {error}"))
    })
}

fn display_name_regex() -> &'static Regex {
    DISPLAY_NAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        Regex::new("^[A-Za-z0-9_ ]+$")
            .unwrap_or_else(|error| panic!("display name regex failed to compile: {error}"))
    })
}

fn check_length(
    value: &str,
    min: usize,
    max: usize,
    too_short: impl FnOnce(usize) -> UserValidationError,
    too_long: impl FnOnce(usize) -> UserValidationError,
) -> Result<(), UserValidationError> {
    let length = value.chars().count();
    if length < min {
        return Err(too_short(min));
    }
    if length > max {
        return Err(too_long(max));
    }
    Ok(())
}

/// Globally unique sign-in name.
///
/// Surrounding whitespace is trimmed before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Login(String);

impl Login {
    /// Validate and construct a [`Login`].
    pub fn new(login: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let login = login.as_ref().trim();
        if login.is_empty() {
            return Err(UserValidationError::EmptyLogin);
        }
        check_length(
            login,
            LOGIN_MIN,
            LOGIN_MAX,
            |min| UserValidationError::LoginTooShort { min },
            |max| UserValidationError::LoginTooLong { max },
        )?;
        if !login_regex().is_match(login) {
            return Err(UserValidationError::LoginInvalidCharacters);
        }
        Ok(Self(login.to_owned()))
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Login> for String {
    fn from(value: Login) -> Self {
        value.0
    }
}

impl TryFrom<String> for Login {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`] from owned input.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        check_length(
            &display_name,
            DISPLAY_NAME_MIN,
            DISPLAY_NAME_MAX,
            |min| UserValidationError::DisplayNameTooShort { min },
            |max| UserValidationError::DisplayNameTooLong { max },
        )?;
        if !display_name_regex().is_match(&display_name) {
            return Err(UserValidationError::DisplayNameInvalidCharacters);
        }
        Ok(Self(display_name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Hex encoded SHA-512 digest of a password.
///
/// Plaintext passwords are never stored. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Hash `password`.
    pub fn derive(password: &str) -> Result<Self, UserValidationError> {
        if password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(Self(hex::encode(Sha512::digest(password.as_bytes()))))
    }

    /// Whether `password` hashes to this digest.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        hex::encode(Sha512::digest(password.as_bytes())) == self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(..)")
    }
}

/// Public profile fields shown to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name.
    pub username: DisplayName,
    /// Optional avatar reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Optional free-form biography.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
    /// Registration timestamp.
    pub joined_at: DateTime<Utc>,
}

/// Application user.
///
/// ## Invariants
/// - `login` is unique across the user collection (enforced by the store).
/// - `follows` never contains `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    login: Login,
    credential: CredentialHash,
    profile: UserProfile,
    #[serde(default)]
    roles: RelationSet<RoleId>,
    #[serde(default)]
    posts: RelationSet<PostId>,
    #[serde(default)]
    follows: RelationSet<UserId>,
}

impl User {
    /// Build a freshly registered user holding a single initial role.
    #[must_use]
    pub fn register(
        id: UserId,
        login: Login,
        credential: CredentialHash,
        profile: UserProfile,
        initial_role: RoleId,
    ) -> Self {
        let mut roles = RelationSet::new();
        roles.insert(initial_role);
        Self {
            id,
            login,
            credential,
            profile,
            roles,
            posts: RelationSet::new(),
            follows: RelationSet::new(),
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Sign-in name.
    pub fn login(&self) -> &Login {
        &self.login
    }

    /// Stored credential digest.
    pub fn credential(&self) -> &CredentialHash {
        &self.credential
    }

    /// Public profile.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Mutable access to the public profile.
    pub fn profile_mut(&mut self) -> &mut UserProfile {
        &mut self.profile
    }

    /// Granted roles.
    pub fn roles(&self) -> &RelationSet<RoleId> {
        &self.roles
    }

    /// Owned posts in creation order.
    pub fn posts(&self) -> &RelationSet<PostId> {
        &self.posts
    }

    /// Followed users.
    pub fn follows(&self) -> &RelationSet<UserId> {
        &self.follows
    }

    /// Replace the stored credential.
    pub fn set_credential(&mut self, credential: CredentialHash) {
        self.credential = credential;
    }

    /// Follow `target`. Users cannot follow themselves.
    pub fn follow(&mut self, target: UserId) -> Result<Membership, Error> {
        if target == self.id {
            return Err(Error::invalid_operation("users cannot follow themselves"));
        }
        Ok(self.follows.insert(target))
    }

    /// Stop following `target`.
    pub fn unfollow(&mut self, target: UserId) -> Membership {
        self.follows.remove(&target)
    }

    /// Add `role` to the granted roles.
    pub fn grant_role(&mut self, role: RoleId) -> Membership {
        self.roles.insert(role)
    }

    /// Record ownership of `post`.
    pub fn attach_post(&mut self, post: PostId) -> Membership {
        self.posts.insert(post)
    }

    /// Drop ownership of `post`.
    pub fn detach_post(&mut self, post: PostId) -> Membership {
        self.posts.remove(&post)
    }
}
