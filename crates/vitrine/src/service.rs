//! Operations exposed to a transport layer.
//!
//! Callers pass an already-authenticated `user_id`; public fetches pass a
//! capability token instead.

use crate::AppContext;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};
use vitrine_core::{now_millis, Image, ImageFile, ImageView, ListQuery, Ownership, Variant};
use vitrine_database::Inserted;
use vitrine_error::{
    ConfigError, DatabaseError, DatabaseErrorKind, ErrorCategory, StorageError, StorageErrorKind,
    TokenError, VitrineError, VitrineResult,
};
use vitrine_storage::layout::{all_keys, canonical_key, canonical_key_for};
use vitrine_storage::{compute_hash, detect_format, mime_for_extension, DetectedFormat};

/// File names accepted on the public route: `{sha256-hex}.{ext}`.
pub const PUBLIC_FILE_NAME_PATTERN: &str = r"^[0-9a-fA-F]{64}\.[A-Za-z0-9]{1,7}$";

const JPEG_MIME: &str = "image/jpeg";

const BLOB_LOCK_STRIPES: usize = 64;

fn not_found() -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::NotFound)
}

/// Hash-striped locks serializing blob writes against blob removal for the
/// same content.
#[derive(Debug)]
struct BlobLocks(Vec<Mutex<()>>);

impl BlobLocks {
    fn new() -> Self {
        Self((0..BLOB_LOCK_STRIPES).map(|_| Mutex::new(())).collect())
    }

    async fn lock(&self, hash: &str) -> MutexGuard<'_, ()> {
        let stripe = hash.bytes().fold(0usize, |acc, b| {
            acc.wrapping_mul(31)
                .wrapping_add(usize::from(b.to_ascii_lowercase()))
        }) % self.0.len();
        self.0[stripe].lock().await
    }
}

/// Upload, listing, retrieval, visibility and deletion of images.
#[derive(Debug, Clone)]
pub struct ImageService {
    context: Arc<AppContext>,
    public_name: Regex,
    blob_locks: Arc<BlobLocks>,
}

impl ImageService {
    /// Create a service over a shared context.
    ///
    /// # Errors
    ///
    /// Returns an error if the public file name pattern fails to compile.
    pub fn new(context: Arc<AppContext>) -> VitrineResult<Self> {
        let public_name = Regex::new(PUBLIC_FILE_NAME_PATTERN)
            .map_err(|e| ConfigError::new(format!("Invalid file name pattern: {}", e)))?;
        Ok(Self {
            context,
            public_name,
            blob_locks: Arc::new(BlobLocks::new()),
        })
    }

    /// Shared context.
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Store `data` for `user_id`.
    ///
    /// Identical bytes uploaded by anyone are stored once; each uploader gets
    /// their own ownership row. If the matching image loses its last owner
    /// before the ownership row is written, the upload starts over once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` for bytes that are not a supported raster
    /// image and `AlreadyOwned` if this user already owns the same bytes.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload(
        &self,
        user_id: i64,
        data: Vec<u8>,
        is_private: bool,
    ) -> VitrineResult<ImageView> {
        let (data, format, hash) = tokio::task::spawn_blocking(move || {
            let format = detect_format(&data)?;
            let hash = compute_hash(&data);
            Ok::<_, VitrineError>((data, format, hash))
        })
        .await
        .map_err(|e| StorageError::new(StorageErrorKind::Task(e.to_string())))??;

        let database = self.context.database();
        let mut retried = false;
        loop {
            let (image, inserted) = self.put(&hash, &format, &data).await?;
            let created = database
                .create_ownership(user_id, image.image_id, is_private, now_millis())
                .await;

            match created {
                Ok(ownership) => {
                    info!(
                        image_id = image.image_id,
                        ownership_id = ownership.ownership_id,
                        "Uploaded image"
                    );
                    return self.view(&image, &ownership);
                }
                // The image lost its last owner between lookup and insert.
                Err(e) if e.category() == ErrorCategory::NotFound && !retried => {
                    debug!(image_id = image.image_id, "Image removed concurrently, retrying");
                    retried = true;
                }
                Err(e) => {
                    if inserted == Inserted::New {
                        self.discard_unowned(image.image_id).await;
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Canonical image for `hash`, writing the blob and row if new.
    ///
    /// An existing row whose canonical file has gone missing gets the file
    /// rewritten from `data`.
    async fn put(
        &self,
        hash: &str,
        format: &DetectedFormat,
        data: &[u8],
    ) -> VitrineResult<(Image, Inserted)> {
        let database = self.context.database();
        let storage = self.context.storage();
        let _guard = self.blob_locks.lock(hash).await;

        if let Some(existing) = database.find_image_by_hash(hash).await? {
            let key = canonical_key(&existing);
            if !storage.exists(&key).await? {
                warn!(key = %key, "Restoring missing blob for existing image");
                storage.put(&key, data).await?;
            }
            debug!(image_id = existing.image_id, "Deduplicated upload");
            return Ok((existing, Inserted::Existing));
        }

        let created = now_millis();
        let key = canonical_key_for(hash, format.extension(), &created);
        storage.put(&key, data).await?;

        let (image, inserted) = database
            .insert_image(hash, format.extension(), created)
            .await?;

        if inserted == Inserted::Existing {
            // Lost the insert race; keep the winner's file only.
            let winner = canonical_key(&image);
            if winner != key {
                if let Err(e) = storage.delete(&key).await {
                    warn!(key = %key, error = %e, "Failed to remove duplicate blob");
                }
            }
            debug!(image_id = image.image_id, "Concurrent upload already stored");
        } else {
            info!(key = %key, size = data.len(), "Stored image blob");
        }
        Ok((image, inserted))
    }

    /// Drop a freshly inserted image that never got its first owner.
    async fn discard_unowned(&self, image_id: i64) {
        match self.context.database().remove_unowned_image(image_id).await {
            Ok(Some(image)) => self.remove_files(&image).await,
            Ok(None) => {}
            Err(e) => warn!(image_id, error = %e, "Failed to remove unowned image"),
        }
    }

    /// Remove the files of a deleted image row.
    ///
    /// Runs under the hash lock and re-reads the row for the same bytes
    /// first. If the content was uploaded again, only files the new row does
    /// not share are removed. Failures are logged and otherwise ignored.
    async fn remove_files(&self, image: &Image) {
        let storage = self.context.storage();
        let _guard = self.blob_locks.lock(&image.content_hash).await;

        let keep = match self
            .context
            .database()
            .find_image_by_hash(&image.content_hash)
            .await
        {
            Ok(current) => current.as_ref().map(all_keys),
            Err(e) => {
                warn!(error = %e, "Could not confirm image removal, keeping files");
                return;
            }
        };

        for key in all_keys(image) {
            if keep.as_ref().is_some_and(|kept| kept.contains(&key)) {
                debug!(key = %key, "File belongs to a newer upload");
                continue;
            }
            match storage.delete(&key).await {
                Ok(true) => debug!(key = %key, "Removed file"),
                Ok(false) => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to remove file"),
            }
        }
    }

    /// One page of `user_id`'s images.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an out-of-range page or limit.
    #[instrument(skip(self))]
    pub async fn list_images(
        &self,
        user_id: i64,
        query: ListQuery,
    ) -> VitrineResult<Vec<ImageView>> {
        let rows = self
            .context
            .database()
            .list_ownerships(user_id, query)
            .await?;

        rows.iter()
            .map(|(ownership, image)| self.view(image, ownership))
            .collect()
    }

    /// Resolve one of `user_id`'s own images.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user owns no such image.
    #[instrument(skip(self))]
    pub async fn fetch_private(
        &self,
        user_id: i64,
        image_id: i64,
        variant: Variant,
    ) -> VitrineResult<ImageFile> {
        let (_, image) = self
            .context
            .database()
            .find_owned_image(user_id, image_id)
            .await?
            .ok_or_else(not_found)?;
        self.resolve(&image, variant).await
    }

    /// Resolve a public image from its file name and capability token.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a malformed file name and `InvalidToken` when
    /// the token does not grant access to that file right now.
    #[instrument(skip(self, token))]
    pub async fn fetch_public(
        &self,
        file_name: &str,
        token: &str,
        variant: Variant,
    ) -> VitrineResult<ImageFile> {
        if !self.public_name.is_match(file_name) {
            debug!("Malformed public file name");
            return Err(not_found().into());
        }

        let claims = self.context.tokens().verify(token)?;
        let database = self.context.database();

        let owned = database
            .find_owned_image(*claims.user_id(), *claims.image_id())
            .await?;
        let Some((ownership, image)) = owned else {
            debug!("Token refers to a missing ownership row");
            return Err(TokenError::new().into());
        };

        if !claims.matches(&ownership) {
            debug!(
                is_private = ownership.is_private,
                "Token does not match current ownership state"
            );
            return Err(TokenError::new().into());
        }
        if !image.file_name().eq_ignore_ascii_case(file_name) {
            debug!("Token issued for a different file");
            return Err(TokenError::new().into());
        }

        self.resolve(&image, variant).await
    }

    /// Make `user_id`'s image private or public.
    ///
    /// Every change issues a fresh `updated_time`, so links handed out
    /// before the change stop working.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user owns no such image.
    #[instrument(skip(self))]
    pub async fn update_visibility(
        &self,
        user_id: i64,
        image_id: i64,
        is_private: bool,
    ) -> VitrineResult<ImageView> {
        let database = self.context.database();
        let (ownership, image) = database
            .find_owned_image(user_id, image_id)
            .await?
            .ok_or_else(not_found)?;

        let updated = database
            .set_visibility(ownership.ownership_id, is_private, now_millis())
            .await?;
        self.view(&image, &updated)
    }

    /// Remove `user_id`'s ownership of `image_id`.
    ///
    /// When no owners remain the image row goes too, and after commit its
    /// canonical file and artifacts are removed unless the same bytes were
    /// uploaded again in the meantime. File removal failures are logged and
    /// otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user owns no such image and
    /// `TransactionFailure` if the row changes could not be committed.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i64, image_id: i64) -> VitrineResult<()> {
        let outcome = self
            .context
            .database()
            .delete_ownership(user_id, image_id)
            .await?;

        let Some(image) = outcome.removed_image() else {
            return Ok(());
        };

        self.remove_files(image).await;
        info!(image_id, hash = %image.content_hash, "Removed image and artifacts");
        Ok(())
    }

    async fn resolve(&self, image: &Image, variant: Variant) -> VitrineResult<ImageFile> {
        let artifacts = self.context.artifacts();

        let (path, mime_type) = match variant {
            Variant::Original => (
                self.context.storage().local_path(&canonical_key(image)),
                mime_for_extension(&image.extension),
            ),
            Variant::Thumbnail => (artifacts.thumbnail(image).await?, JPEG_MIME),
            Variant::Compressed => {
                let path = artifacts.compressed(image).await?;
                let mime = if artifacts.compresses_to_original(image).await? {
                    mime_for_extension(&image.extension)
                } else {
                    JPEG_MIME
                };
                (path, mime)
            }
        };

        Ok(ImageFile {
            path,
            variant,
            mime_type: mime_type.to_string(),
        })
    }

    fn view(&self, image: &Image, ownership: &Ownership) -> VitrineResult<ImageView> {
        let prefix = self.context.config().url_prefix();
        let private_url = format!("{}/private/{}", prefix, image.image_id);

        let public_url = if ownership.is_public() {
            let token = self.context.tokens().issue(
                &ownership.updated_time,
                image.image_id,
                ownership.user_id,
            )?;
            Some(format!(
                "{}/public/{}?key={}",
                prefix,
                image.file_name(),
                token
            ))
        } else {
            None
        };

        Ok(ImageView::new(image, ownership, private_url, public_url))
    }
}
