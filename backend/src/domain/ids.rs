//! Typed entity identifiers.
//!
//! Foreign references between entities are stored as these identifiers, never
//! as embedded records. Each collection gets its own newtype so a `PostId`
//! cannot be passed where a `UserId` is expected.

use std::fmt;
use std::hash::Hash;

use uuid::Uuid;

/// Validation errors raised while parsing an identifier from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdValidationError {
    /// The raw value was empty.
    #[error("{entity} id must not be empty")]
    Empty {
        /// Entity kind the identifier refers to.
        entity: &'static str,
    },
    /// The raw value was not a canonical UUID.
    #[error("{entity} id must be a valid UUID")]
    Invalid {
        /// Entity kind the identifier refers to.
        entity: &'static str,
    },
}

/// Behaviour shared by every entity identifier.
pub trait EntityId:
    Copy + Eq + Hash + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Wrap a raw UUID.
    fn from_uuid(uuid: Uuid) -> Self;

    /// Access the underlying UUID.
    fn as_uuid(&self) -> &Uuid;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident => $entity:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Validate and construct an identifier from borrowed input.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdValidationError> {
                let raw = raw.as_ref();
                if raw.is_empty() {
                    return Err(IdValidationError::Empty { entity: $entity });
                }
                if raw.trim() != raw {
                    return Err(IdValidationError::Invalid { entity: $entity });
                }
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| IdValidationError::Invalid { entity: $entity })
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl EntityId for $name {
            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

define_entity_id! {
    /// Stable user identifier.
    UserId => "user"
}

define_entity_id! {
    /// Stable post identifier.
    PostId => "post"
}

define_entity_id! {
    /// Stable comment identifier.
    CommentId => "comment"
}

define_entity_id! {
    /// Stable role identifier.
    RoleId => "role"
}
