//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// One row per stored record across all collections.
    ///
    /// `(collection, id)` is the primary key; `unique_key` is unique within a
    /// collection when present; `seq` records creation order.
    documents (collection, id) {
        /// Collection name, for example `users`.
        collection -> Text,
        /// Record identifier.
        id -> Uuid,
        /// Insertion sequence used for creation ordering.
        seq -> Int8,
        /// Compare-and-swap revision, starting at 1.
        revision -> Int8,
        /// Optional per-collection unique key (login, role name).
        unique_key -> Nullable<Text>,
        /// Serialised record.
        body -> Jsonb,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}
