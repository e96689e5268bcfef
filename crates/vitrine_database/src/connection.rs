//! Database connection utilities.

use crate::DatabaseResult;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use vitrine_error::{DatabaseError, DatabaseErrorKind};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Shared pool of SQLite connections.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// A connection checked out of a [`DbPool`].
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Pool sizing and per-connection pragmas.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct PoolOptions {
    /// Maximum number of open connections.
    max_size: u32,
    /// How long a caller waits for a free connection before failing.
    connection_timeout: Duration,
    /// How long SQLite waits on a locked database before returning BUSY.
    busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolOptions {
    /// Create pool options with the given size and checkout timeout.
    pub fn new(max_size: u32, connection_timeout: Duration) -> Self {
        Self {
            max_size,
            connection_timeout,
            ..Self::default()
        }
    }
}

/// Applies pragmas to every new pooled connection.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Build a bounded connection pool for the SQLite file at `database_url`.
///
/// Callers beyond `max_size` block until a connection is returned or the
/// checkout timeout elapses.
///
/// # Errors
///
/// Returns an error if the initial connections cannot be opened.
#[tracing::instrument(skip(options), fields(max_size = options.max_size))]
pub fn establish_pool(database_url: &str, options: &PoolOptions) -> DatabaseResult<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);

    let pool = Pool::builder()
        .max_size(options.max_size)
        .connection_timeout(options.connection_timeout)
        .connection_customizer(Box::new(SqlitePragmas {
            busy_timeout: options.busy_timeout,
        }))
        .build(manager)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;

    tracing::info!(database_url, "Opened connection pool");
    Ok(pool)
}

/// Apply any pending schema migrations.
///
/// # Errors
///
/// Returns an error if a connection cannot be checked out or a migration fails.
#[tracing::instrument(skip(pool))]
pub fn run_migrations(pool: &DbPool) -> DatabaseResult<()> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))?;

    for version in &applied {
        tracing::info!(%version, "Applied migration");
    }
    Ok(())
}
