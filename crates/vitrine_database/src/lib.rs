//! SQLite persistence for Vitrine.
//!
//! Two tables back the store: `images`, one row per distinct byte sequence
//! keyed by its content hash, and `ownerships`, the user-to-image edges that
//! reference-count those rows.
//!
//! Repository modules expose synchronous functions over a
//! [`SqliteConnection`](diesel::sqlite::SqliteConnection); [`Database`]
//! wraps them for async callers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod database;
pub mod image_repository;
pub mod lifecycle;
mod models;
pub mod ownership_repository;
#[allow(missing_docs)]
pub mod schema;

pub use connection::{establish_pool, run_migrations, DbConnection, DbPool, PoolOptions, MIGRATIONS};
pub use database::Database;
pub use image_repository::Inserted;
pub use lifecycle::DeleteOutcome;
pub use models::{ImageRow, NewImageRow, NewOwnershipRow, OwnershipRow};

/// Result type for synchronous repository calls.
pub type DatabaseResult<T> = Result<T, vitrine_error::DatabaseError>;
