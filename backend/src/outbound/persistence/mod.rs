//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Provides the `documents`-table implementation of the entity store port
//! with async support through `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: the store only translates between rows and domain
//!   records. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never reach the domain layer.
//! - **Strongly typed errors**: database errors map to
//!   [`crate::domain::ports::EntityStoreError`] variants.
//!
//! # Example
//!
//! ```no_run
//! use proofboard::domain::User;
//! use proofboard::outbound::persistence::{DbPool, DieselEntityStore, PoolConfig};
//!
//! # async fn demo() -> Result<(), proofboard::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/proofboard")).await?;
//! let users = DieselEntityStore::<User>::new(pool);
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_entity_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_entity_store::{DieselEntityStore, diesel_stores};
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DEFAULT_MAX_CONNECTIONS, DbPool, PoolConfig, PoolError};
