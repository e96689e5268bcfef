//! Async handle over the connection pool.
//!
//! Diesel is synchronous, so every call checks out a pooled connection and
//! runs on the blocking thread pool.

use crate::connection::{establish_pool, run_migrations, DbPool, PoolOptions};
use crate::image_repository::{self, Inserted};
use crate::lifecycle::{self, DeleteOutcome};
use crate::ownership_repository;
use chrono::{DateTime, Utc};
use diesel::sqlite::SqliteConnection;
use vitrine_core::{Image, ListQuery, Ownership};
use vitrine_error::{DatabaseError, DatabaseErrorKind, VitrineError, VitrineResult};

/// Pooled SQLite database.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("Database")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl Database {
    /// Wrap an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a pool on `database_url` and apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn connect(database_url: &str, options: PoolOptions) -> VitrineResult<Self> {
        let url = database_url.to_string();
        let pool = tokio::task::spawn_blocking(move || {
            let pool = establish_pool(&url, &options)?;
            run_migrations(&pool)?;
            Ok::<_, DatabaseError>(pool)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))??;
        Ok(Self { pool })
    }

    /// The underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn run<T, F>(&self, task: F) -> VitrineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> VitrineResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(DatabaseError::from)?;
            task(&mut *conn)
        })
        .await
        .map_err(|e| {
            VitrineError::from(DatabaseError::new(DatabaseErrorKind::Query(e.to_string())))
        })?
    }

    /// See [`image_repository::get_image`].
    pub async fn get_image(&self, image_id: i64) -> VitrineResult<Image> {
        self.run(move |conn| Ok(image_repository::get_image(conn, image_id)?))
            .await
    }

    /// See [`image_repository::find_by_hash`].
    pub async fn find_image_by_hash(&self, content_hash: &str) -> VitrineResult<Option<Image>> {
        let hash = content_hash.to_string();
        self.run(move |conn| Ok(image_repository::find_by_hash(conn, &hash)?))
            .await
    }

    /// See [`image_repository::insert_or_get`].
    pub async fn insert_image(
        &self,
        content_hash: &str,
        extension: &str,
        created_time: DateTime<Utc>,
    ) -> VitrineResult<(Image, Inserted)> {
        let hash = content_hash.to_string();
        let extension = extension.to_string();
        self.run(move |conn| {
            Ok(image_repository::insert_or_get(
                conn,
                &hash,
                &extension,
                created_time,
            )?)
        })
        .await
    }

    /// See [`ownership_repository::create`].
    pub async fn create_ownership(
        &self,
        user_id: i64,
        image_id: i64,
        is_private: bool,
        now: DateTime<Utc>,
    ) -> VitrineResult<Ownership> {
        self.run(move |conn| {
            Ok(ownership_repository::create(
                conn, user_id, image_id, is_private, now,
            )?)
        })
        .await
    }

    /// See [`ownership_repository::find`].
    pub async fn find_ownership(
        &self,
        user_id: i64,
        image_id: i64,
    ) -> VitrineResult<Option<Ownership>> {
        self.run(move |conn| Ok(ownership_repository::find(conn, user_id, image_id)?))
            .await
    }

    /// The ownership row and its image for `(user_id, image_id)`.
    pub async fn find_owned_image(
        &self,
        user_id: i64,
        image_id: i64,
    ) -> VitrineResult<Option<(Ownership, Image)>> {
        self.run(move |conn| {
            let Some(ownership) = ownership_repository::find(conn, user_id, image_id)? else {
                return Ok(None);
            };
            let image = image_repository::get_image(conn, ownership.image_id)?;
            Ok(Some((ownership, image)))
        })
        .await
    }

    /// See [`ownership_repository::list`].
    pub async fn list_ownerships(
        &self,
        user_id: i64,
        query: ListQuery,
    ) -> VitrineResult<Vec<(Ownership, Image)>> {
        query.validate()?;
        self.run(move |conn| ownership_repository::list(conn, user_id, &query))
            .await
    }

    /// See [`ownership_repository::set_visibility`].
    pub async fn set_visibility(
        &self,
        ownership_id: i64,
        is_private: bool,
        now: DateTime<Utc>,
    ) -> VitrineResult<Ownership> {
        self.run(move |conn| {
            Ok(ownership_repository::set_visibility(
                conn,
                ownership_id,
                is_private,
                now,
            )?)
        })
        .await
    }

    /// See [`ownership_repository::count_for_image`].
    pub async fn count_owners(&self, image_id: i64) -> VitrineResult<i64> {
        self.run(move |conn| Ok(ownership_repository::count_for_image(conn, image_id)?))
            .await
    }

    /// See [`lifecycle::delete_ownership`].
    pub async fn delete_ownership(
        &self,
        user_id: i64,
        image_id: i64,
    ) -> VitrineResult<DeleteOutcome> {
        self.run(move |conn| Ok(lifecycle::delete_ownership(conn, user_id, image_id)?))
            .await
    }

    /// See [`lifecycle::remove_unowned_image`].
    pub async fn remove_unowned_image(&self, image_id: i64) -> VitrineResult<Option<Image>> {
        self.run(move |conn| Ok(lifecycle::remove_unowned_image(conn, image_id)?))
            .await
    }
}
