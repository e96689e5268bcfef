//! Process-wide collaborators.

use crate::VitrineConfig;
use std::sync::Arc;
use vitrine_database::Database;
use vitrine_error::VitrineResult;
use vitrine_security::TokenCodec;
use vitrine_storage::{ArtifactGenerator, BlobStore, FileSystemStorage};

/// Everything a request needs, built once at start-up and shared read-only.
#[derive(Clone)]
pub struct AppContext {
    config: VitrineConfig,
    database: Database,
    storage: Arc<dyn BlobStore>,
    artifacts: ArtifactGenerator,
    tokens: TokenCodec,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("database", &self.database)
            .field("artifacts", &self.artifacts)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Validate `config`, open storage and the database, and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the storage root
    /// cannot be created or the database cannot be opened.
    #[tracing::instrument(skip(config))]
    pub async fn new(config: VitrineConfig) -> VitrineResult<Self> {
        config.validate()?;
        let tokens = TokenCodec::new(&config.secret_key()?);

        let storage: Arc<dyn BlobStore> =
            Arc::new(FileSystemStorage::new(config.storage.root.clone())?);
        let artifacts = ArtifactGenerator::new(storage.clone(), config.artifacts.clone());

        let database = Database::connect(&config.database_url, config.pool_options()).await?;

        tracing::info!(
            root = %config.storage.root.display(),
            database_url = %config.database_url,
            "Context ready"
        );

        Ok(Self {
            config,
            database,
            storage,
            artifacts,
            tokens,
        })
    }

    /// Loaded configuration.
    pub fn config(&self) -> &VitrineConfig {
        &self.config
    }

    /// Database handle.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Blob store.
    pub fn storage(&self) -> &Arc<dyn BlobStore> {
        &self.storage
    }

    /// Artifact generator.
    pub fn artifacts(&self) -> &ArtifactGenerator {
        &self.artifacts
    }

    /// Token codec.
    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }
}
