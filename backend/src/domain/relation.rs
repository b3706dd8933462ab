//! Ordered, deduplicated relation sets between entities.
//!
//! Likes, validations, follows, role membership, owned posts and post
//! comments are all stored as a [`RelationSet`] of identifiers. Insertion
//! order is preserved and an identifier appears at most once.

use serde::{Deserialize, Serialize};

/// Outcome of a membership change on a [`RelationSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// The identifier was appended.
    Added,
    /// The identifier was already a member; nothing changed.
    AlreadyPresent,
    /// The identifier was removed.
    Removed,
    /// The identifier was not a member; nothing changed.
    Absent,
}

impl Membership {
    /// Whether the set was modified by the operation.
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Added | Self::Removed)
    }
}

/// Insertion-ordered set of identifiers.
///
/// Deserialising a list that contains duplicates keeps the first occurrence
/// of each identifier.
///
/// # Examples
/// ```
/// use proofboard::domain::{Membership, RelationSet};
///
/// let mut likes = RelationSet::new();
/// assert_eq!(likes.insert(7_u32), Membership::Added);
/// assert_eq!(likes.insert(7_u32), Membership::AlreadyPresent);
/// assert_eq!(likes.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<T>", into = "Vec<T>")]
#[serde(bound(
    serialize = "T: Clone + Serialize",
    deserialize = "T: PartialEq + Deserialize<'de>"
))]
pub struct RelationSet<T> {
    members: Vec<T>,
}

impl<T> Default for RelationSet<T> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<T: PartialEq> RelationSet<T> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless it is already a member.
    pub fn insert(&mut self, id: T) -> Membership {
        if self.members.contains(&id) {
            return Membership::AlreadyPresent;
        }
        self.members.push(id);
        Membership::Added
    }

    /// Remove `id` if it is a member, keeping the order of the others.
    pub fn remove(&mut self, id: &T) -> Membership {
        match self.members.iter().position(|member| member == id) {
            Some(index) => {
                self.members.remove(index);
                Membership::Removed
            }
            None => Membership::Absent,
        }
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: &T) -> bool {
        self.members.contains(id)
    }
}

impl<T> RelationSet<T> {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate members in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.members.iter()
    }

    /// Members as a slice in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.members
    }
}

impl<T: PartialEq> From<Vec<T>> for RelationSet<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T> From<RelationSet<T>> for Vec<T> {
    fn from(value: RelationSet<T>) -> Self {
        value.members
    }
}

impl<T: PartialEq> FromIterator<T> for RelationSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl<'a, T> IntoIterator for &'a RelationSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
