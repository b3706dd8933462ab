//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: in-process entity store for tests and database-less runs
//! - **persistence**: PostgreSQL-backed entity store using Diesel ORM
//!
//! Adapters are thin translators between domain records and
//! infrastructure-specific representations. They contain no business logic.

pub mod memory;
pub mod persistence;
