//! Compare-and-swap read-modify-write over a single stored record.
//!
//! Relation changes (likes, follows, role grants, comment attachment) and
//! cascade detachments all run through [`update_record`], so decisions such
//! as "already liked" are always taken against committed state.

use serde_json::json;
use tracing::debug;

use crate::domain::Error;
use crate::domain::ports::{Document, EntityStore, EntityStoreError, Versioned};

/// Upper bound on read-modify-write attempts before giving up.
pub const MAX_UPDATE_ATTEMPTS: usize = 8;

/// Whether a mutation changed the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    /// Write the mutated record.
    Modified,
    /// Skip the write.
    Unchanged,
}

impl From<crate::domain::Membership> for RecordChange {
    fn from(value: crate::domain::Membership) -> Self {
        if value.changed() {
            Self::Modified
        } else {
            Self::Unchanged
        }
    }
}

/// Map an entity store failure onto the domain error vocabulary.
pub(crate) fn map_store_error(error: EntityStoreError) -> Error {
    match error {
        EntityStoreError::Connection { message } => {
            Error::internal(format!("entity store unavailable: {message}"))
        }
        EntityStoreError::Query { message } => {
            Error::internal(format!("entity store error: {message}"))
        }
        EntityStoreError::Serialization { message } => {
            Error::internal(format!("entity store serialization failed: {message}"))
        }
        EntityStoreError::NotFound { collection, id } => {
            Error::not_found(format!("{collection} record {id} not found"))
        }
        EntityStoreError::RevisionMismatch { expected, actual } => {
            Error::internal("concurrent modification").with_details(json!({
                "expectedRevision": expected,
                "actualRevision": actual,
            }))
        }
        EntityStoreError::DuplicateKey { collection, key } => {
            Error::already_exists(format!("{collection} already holds {key}"))
        }
    }
}

/// Apply `mutate` to the record `id` with optimistic concurrency.
///
/// The record is read, mutated on a fresh copy and written back with the
/// revision that was read. When another writer got there first the whole
/// cycle repeats against the new state, up to [`MAX_UPDATE_ATTEMPTS`] times.
///
/// Returns `Ok(None)` when the record does not exist (or vanished between
/// read and write). An error returned by `mutate` aborts without writing.
pub async fn update_record<R, F>(
    store: &dyn EntityStore<R>,
    id: &R::Id,
    mut mutate: F,
) -> Result<Option<Versioned<R>>, Error>
where
    R: Document,
    F: FnMut(&mut R) -> Result<RecordChange, Error> + Send,
{
    for attempt in 1..=MAX_UPDATE_ATTEMPTS {
        let Some(current) = store.find_by_id(id).await.map_err(map_store_error)? else {
            return Ok(None);
        };
        let mut next = current.record.clone();
        if mutate(&mut next)? == RecordChange::Unchanged {
            return Ok(Some(current));
        }
        match store.update(&next, current.revision).await {
            Ok(updated) => return Ok(Some(updated)),
            Err(EntityStoreError::RevisionMismatch { expected, actual }) => {
                debug!(
                    collection = %R::COLLECTION,
                    id = %id,
                    attempt,
                    expected,
                    actual,
                    "record changed concurrently; retrying"
                );
            }
            Err(EntityStoreError::NotFound { .. }) => return Ok(None),
            Err(other) => return Err(map_store_error(other)),
        }
    }
    Err(Error::internal(format!(
        "gave up updating {} record {id} after {MAX_UPDATE_ATTEMPTS} attempts",
        R::COLLECTION
    )))
}
