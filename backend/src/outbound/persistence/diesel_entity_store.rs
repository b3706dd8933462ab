//! PostgreSQL-backed `EntityStore` implementation using Diesel ORM.
//!
//! Each record is stored as a JSONB document in the shared `documents`
//! table. Compare-and-swap updates are a single conditional `UPDATE`; unique
//! keys are enforced by a partial unique index.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::EntityId;
use crate::domain::ports::{Document, EntityStore, EntityStoreError, EntityStores, Versioned};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{DocumentRow, NewDocumentRow};
use super::pool::{DbPool, PoolError};
use super::schema::documents;

/// Diesel-backed implementation of the `EntityStore` port for one
/// collection.
pub struct DieselEntityStore<R> {
    pool: DbPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for DieselEntityStore<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Document> DieselEntityStore<R> {
    /// Create a store for `R`'s collection over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

/// Build one Diesel store per collection, all sharing `pool`.
pub fn diesel_stores(pool: DbPool) -> EntityStores {
    EntityStores {
        users: Arc::new(DieselEntityStore::new(pool.clone())),
        posts: Arc::new(DieselEntityStore::new(pool.clone())),
        comments: Arc::new(DieselEntityStore::new(pool.clone())),
        roles: Arc::new(DieselEntityStore::new(pool)),
    }
}

fn map_pool_error(error: PoolError) -> EntityStoreError {
    map_basic_pool_error(error, EntityStoreError::connection)
}

fn map_diesel_error(error: DieselError) -> EntityStoreError {
    map_basic_diesel_error(error, EntityStoreError::query, EntityStoreError::connection)
}

/// Map insert/update failures, translating unique violations.
fn map_write_error<R: Document>(error: DieselError, key: &str) -> EntityStoreError {
    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &error {
        debug!(
            collection = %R::COLLECTION,
            constraint = info.constraint_name(),
            "unique constraint rejected write"
        );
        return EntityStoreError::duplicate_key(R::COLLECTION.as_str(), key);
    }
    map_diesel_error(error)
}

fn encode<R: Document>(record: &R) -> Result<serde_json::Value, EntityStoreError> {
    serde_json::to_value(record).map_err(|err| EntityStoreError::serialization(err.to_string()))
}

fn decode<R: Document>(row: DocumentRow) -> Result<Versioned<R>, EntityStoreError> {
    let record = serde_json::from_value(row.body).map_err(|err| {
        EntityStoreError::serialization(format!("{} record {}: {err}", R::COLLECTION, row.id))
    })?;
    Ok(Versioned {
        record,
        revision: revision_from_db(row.revision)?,
    })
}

fn revision_from_db(revision: i64) -> Result<u64, EntityStoreError> {
    u64::try_from(revision)
        .map_err(|_| EntityStoreError::query(format!("negative revision {revision} in store")))
}

fn revision_for_db(revision: u64) -> Result<i64, EntityStoreError> {
    i64::try_from(revision)
        .map_err(|_| EntityStoreError::query(format!("revision {revision} exceeds storage range")))
}

#[async_trait]
impl<R: Document> EntityStore<R> for DieselEntityStore<R> {
    async fn create(&self, record: &R) -> Result<Versioned<R>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let unique_key = record.unique_key();
        let id = record.id();
        let row = NewDocumentRow {
            collection: R::COLLECTION.as_str(),
            id: *id.as_uuid(),
            revision: 1,
            unique_key: unique_key.as_deref(),
            body: encode(record)?,
        };

        diesel::insert_into(documents::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| {
                let key = unique_key.clone().unwrap_or_else(|| id.to_string());
                map_write_error::<R>(err, &key)
            })?;

        Ok(Versioned {
            record: record.clone(),
            revision: 1,
        })
    }

    async fn find_by_id(&self, id: &R::Id) -> Result<Option<Versioned<R>>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DocumentRow> = documents::table
            .filter(documents::collection.eq(R::COLLECTION.as_str()))
            .filter(documents::id.eq(id.as_uuid()))
            .select(DocumentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(decode).transpose()
    }

    async fn find_by_unique_key(
        &self,
        key: &str,
    ) -> Result<Option<Versioned<R>>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DocumentRow> = documents::table
            .filter(documents::collection.eq(R::COLLECTION.as_str()))
            .filter(documents::unique_key.eq(key))
            .select(DocumentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(decode).transpose()
    }

    async fn populate(&self, ids: &[R::Id]) -> Result<Vec<R>, EntityStoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<DocumentRow> = documents::table
            .filter(documents::collection.eq(R::COLLECTION.as_str()))
            .filter(documents::id.eq_any(&uuids))
            .select(DocumentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut by_id: HashMap<Uuid, R> = HashMap::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            by_id.insert(id, decode::<R>(row)?.record);
        }
        // Requested order wins; duplicates in `ids` resolve once each.
        Ok(uuids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    async fn list(&self) -> Result<Vec<R>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<DocumentRow> = documents::table
            .filter(documents::collection.eq(R::COLLECTION.as_str()))
            .order(documents::seq.asc())
            .select(DocumentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| decode::<R>(row).map(Versioned::into_record))
            .collect()
    }

    async fn count(&self) -> Result<u64, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = documents::table
            .filter(documents::collection.eq(R::COLLECTION.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        u64::try_from(count).map_err(|err| EntityStoreError::query(err.to_string()))
    }

    async fn update(
        &self,
        record: &R,
        expected_revision: u64,
    ) -> Result<Versioned<R>, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = record.id();
        let unique_key = record.unique_key();
        let expected = revision_for_db(expected_revision)?;
        let next_revision = expected_revision
            .checked_add(1)
            .ok_or_else(|| EntityStoreError::query("revision overflow"))?;
        let next = revision_for_db(next_revision)?;

        let updated = diesel::update(
            documents::table
                .filter(documents::collection.eq(R::COLLECTION.as_str()))
                .filter(documents::id.eq(id.as_uuid()))
                .filter(documents::revision.eq(expected)),
        )
        .set((
            documents::body.eq(encode(record)?),
            documents::revision.eq(next),
            documents::unique_key.eq(unique_key.as_deref()),
            documents::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)
        .await
        .map_err(|err| {
            let key = unique_key.clone().unwrap_or_else(|| id.to_string());
            map_write_error::<R>(err, &key)
        })?;

        if updated == 1 {
            return Ok(Versioned {
                record: record.clone(),
                revision: next_revision,
            });
        }

        let actual: Option<i64> = documents::table
            .filter(documents::collection.eq(R::COLLECTION.as_str()))
            .filter(documents::id.eq(id.as_uuid()))
            .select(documents::revision)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        match actual {
            Some(actual) => Err(EntityStoreError::revision_mismatch(
                expected_revision,
                revision_from_db(actual)?,
            )),
            None => Err(EntityStoreError::not_found(
                R::COLLECTION.as_str(),
                id.to_string(),
            )),
        }
    }

    async fn delete(&self, id: &R::Id) -> Result<bool, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            documents::table
                .filter(documents::collection.eq(R::COLLECTION.as_str()))
                .filter(documents::id.eq(id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn delete_at_revision(
        &self,
        id: &R::Id,
        expected_revision: u64,
    ) -> Result<bool, EntityStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let expected = revision_for_db(expected_revision)?;
        let deleted = diesel::delete(
            documents::table
                .filter(documents::collection.eq(R::COLLECTION.as_str()))
                .filter(documents::id.eq(id.as_uuid()))
                .filter(documents::revision.eq(expected)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        if deleted > 0 {
            return Ok(true);
        }

        let actual: Option<i64> = documents::table
            .filter(documents::collection.eq(R::COLLECTION.as_str()))
            .filter(documents::id.eq(id.as_uuid()))
            .select(documents::revision)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        match actual {
            Some(actual) => Err(EntityStoreError::revision_mismatch(
                expected_revision,
                revision_from_db(actual)?,
            )),
            None => Ok(false),
        }
    }
}
