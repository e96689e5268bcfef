//! Lazily generated thumbnail and compressed renditions.
//!
//! Artifacts are a pure function of the canonical bytes, so the cache is
//! never invalidated. Two requests that miss the cache at the same time both
//! render and both write; each write lands atomically and the bytes are
//! equivalent, so whichever rename happens last is as good as the first.

use crate::layout::{artifact_key, canonical_key, ArtifactKind};
use crate::{compute_hash, BlobKey, BlobStore};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use vitrine_core::Image;
use vitrine_error::{
    ImageError, ImageErrorKind, StorageError, StorageErrorKind, VitrineResult,
};

/// JPEG quality used for thumbnails.
pub const THUMBNAIL_QUALITY: u8 = 75;

/// Parameters for artifact generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Bounding box edge for thumbnails, in pixels.
    thumbnail_size: u32,
    /// Size the compressed rendition aims to stay under, in KiB.
    compress_target_kb: u64,
    /// First JPEG quality tried.
    compress_initial_quality: u8,
    /// Quality decrement between attempts.
    compress_step: u8,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: 128,
            compress_target_kb: 500,
            compress_initial_quality: 90,
            compress_step: 5,
        }
    }
}

impl ArtifactConfig {
    /// Create a configuration with explicit values.
    pub fn new(
        thumbnail_size: u32,
        compress_target_kb: u64,
        compress_initial_quality: u8,
        compress_step: u8,
    ) -> Self {
        Self {
            thumbnail_size,
            compress_target_kb,
            compress_initial_quality,
            compress_step,
        }
    }

    /// Validates generation parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the thumbnail size or step is zero, or the
    /// initial quality exceeds 100.
    pub fn validate(&self) -> Result<(), String> {
        if self.thumbnail_size == 0 {
            return Err("thumbnail_size must be positive".to_string());
        }
        if self.compress_initial_quality > 100 {
            return Err(format!(
                "compress_initial_quality must be at most 100, got {}",
                self.compress_initial_quality
            ));
        }
        if self.compress_step == 0 {
            return Err("compress_step must be positive".to_string());
        }
        Ok(())
    }
}

/// Descending JPEG qualities: `initial, initial - step, ...` down to 0.
#[derive(Debug, Clone)]
pub struct QualitySchedule {
    next: Option<u8>,
    step: u8,
}

impl QualitySchedule {
    /// Start at `initial`, decrementing by `step` (a zero step is treated as 1).
    pub fn new(initial: u8, step: u8) -> Self {
        Self {
            next: Some(initial),
            step: step.max(1),
        }
    }
}

impl Iterator for QualitySchedule {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let current = self.next?;
        self.next = current.checked_sub(self.step);
        Some(current)
    }
}

/// Result of the size-convergence loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionOutcome {
    /// Last encoding produced
    pub data: Vec<u8>,
    /// Every quality tried, in order
    pub qualities: Vec<u8>,
}

impl CompressionOutcome {
    /// Quality of the persisted encoding.
    pub fn final_quality(&self) -> Option<u8> {
        self.qualities.last().copied()
    }
}

fn decode(data: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(data).map_err(|e| ImageError::new(ImageErrorKind::Decode(e.to_string())))
}

/// Encode RGB pixels as JPEG. The encoder accepts 1..=100, so 0 maps to 1.
pub fn encode_jpeg(pixels: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode_image(pixels)
        .map_err(|e| ImageError::new(ImageErrorKind::Encode(e.to_string())))?;
    Ok(out)
}

/// Shrink `data` to fit within `max_edge`×`max_edge`, preserving aspect
/// ratio and never upscaling, and encode it as JPEG.
///
/// # Errors
///
/// Returns an error if the source cannot be decoded or the output encoded.
pub fn render_thumbnail(data: &[u8], max_edge: u32) -> Result<Vec<u8>, ImageError> {
    let img = decode(data)?;
    let (width, height) = img.dimensions();

    let fitted = if width > max_edge || height > max_edge {
        img.resize(max_edge, max_edge, FilterType::Lanczos3)
    } else {
        img
    };

    encode_jpeg(&fitted.to_rgb8(), THUMBNAIL_QUALITY)
}

/// Re-encode `data` at decreasing quality until it fits `target_bytes`.
///
/// The source is decoded once. The loop stops at the first encoding that
/// fits or when the schedule runs out; the last encoding is returned either
/// way.
///
/// # Errors
///
/// Returns an error if the source cannot be decoded or an encoding fails.
pub fn compress_to_target(
    data: &[u8],
    target_bytes: u64,
    initial_quality: u8,
    step: u8,
) -> Result<CompressionOutcome, ImageError> {
    let pixels = decode(data)?.to_rgb8();
    let mut qualities = Vec::new();
    let mut encoded = Vec::new();

    for quality in QualitySchedule::new(initial_quality, step) {
        encoded = encode_jpeg(&pixels, quality)?;
        qualities.push(quality);
        if encoded.len() as u64 <= target_bytes {
            break;
        }
    }

    Ok(CompressionOutcome {
        data: encoded,
        qualities,
    })
}

async fn run_blocking<T, F>(task: F) -> VitrineResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ImageError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| StorageError::new(StorageErrorKind::Task(e.to_string())))?;
    Ok(result?)
}

/// Generates and caches derived artifacts.
#[derive(Clone)]
pub struct ArtifactGenerator {
    store: Arc<dyn BlobStore>,
    config: ArtifactConfig,
}

impl std::fmt::Debug for ArtifactGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ArtifactGenerator {
    /// Create a generator writing into `store`.
    pub fn new(store: Arc<dyn BlobStore>, config: ArtifactConfig) -> Self {
        Self { store, config }
    }

    /// Generation parameters.
    pub fn config(&self) -> &ArtifactConfig {
        &self.config
    }

    /// Path of the thumbnail, generating it on a cache miss.
    pub async fn thumbnail(&self, image: &Image) -> VitrineResult<PathBuf> {
        let key = self.ensure(image, ArtifactKind::Thumbnail).await?;
        Ok(self.store.local_path(&key))
    }

    /// Path of the compressed rendition, generating it on a cache miss.
    pub async fn compressed(&self, image: &Image) -> VitrineResult<PathBuf> {
        let key = self.ensure(image, ArtifactKind::Compressed).await?;
        Ok(self.store.local_path(&key))
    }

    /// Whether the compressed rendition of `image` is the original bytes.
    ///
    /// True when the original already fits the size target, in which case
    /// the artifact shares the original's format rather than being JPEG.
    pub async fn compresses_to_original(&self, image: &Image) -> VitrineResult<bool> {
        let size = self.store.size(&canonical_key(image)).await?;
        Ok(size <= self.target_bytes())
    }

    fn target_bytes(&self) -> u64 {
        self.config.compress_target_kb * 1024
    }

    /// Make sure the artifact exists and return its key.
    #[tracing::instrument(skip(self, image), fields(hash = %image.content_hash, %kind))]
    pub async fn ensure(&self, image: &Image, kind: ArtifactKind) -> VitrineResult<BlobKey> {
        let key = artifact_key(&image.content_hash, kind);
        if self.store.exists(&key).await? {
            tracing::debug!(key = %key, "Artifact cache hit");
            return Ok(key);
        }

        match kind {
            ArtifactKind::Thumbnail => self.generate_thumbnail(image, &key).await?,
            ArtifactKind::Compressed => self.generate_compressed(image, &key).await?,
        }
        Ok(key)
    }

    async fn generate_thumbnail(&self, image: &Image, key: &BlobKey) -> VitrineResult<()> {
        let original = self.load_original(image).await?;
        let max_edge = self.config.thumbnail_size;
        let rendered = run_blocking(move || render_thumbnail(&original, max_edge)).await?;

        self.store.put(key, &rendered).await?;
        tracing::info!(key = %key, size = rendered.len(), "Generated thumbnail");
        Ok(())
    }

    async fn generate_compressed(&self, image: &Image, key: &BlobKey) -> VitrineResult<()> {
        let target_bytes = self.target_bytes();

        if self.compresses_to_original(image).await? {
            self.store.alias(&canonical_key(image), key).await?;
            tracing::info!(key = %key, "Original already within target, aliased");
            return Ok(());
        }

        let original = self.load_original(image).await?;
        let initial = self.config.compress_initial_quality;
        let step = self.config.compress_step;
        let outcome =
            run_blocking(move || compress_to_target(&original, target_bytes, initial, step))
                .await?;

        if outcome.data.len() as u64 > target_bytes {
            tracing::debug!(
                key = %key,
                size = outcome.data.len(),
                target_bytes,
                "Compression schedule exhausted above target"
            );
        }

        self.store.put(key, &outcome.data).await?;
        tracing::info!(
            key = %key,
            size = outcome.data.len(),
            quality = ?outcome.final_quality(),
            attempts = outcome.qualities.len(),
            "Generated compressed rendition"
        );
        Ok(())
    }

    /// Read canonical bytes and check them against the content hash.
    async fn load_original(&self, image: &Image) -> VitrineResult<Vec<u8>> {
        let data = self.store.get(&canonical_key(image)).await?;
        verify_hash(&data, &image.content_hash)?;
        Ok(data)
    }
}

/// Verify content hash matches expected hash.
pub fn verify_hash(data: &[u8], expected_hash: &str) -> Result<(), StorageError> {
    let actual_hash = compute_hash(data);
    if !actual_hash.eq_ignore_ascii_case(expected_hash) {
        return Err(StorageError::new(StorageErrorKind::HashMismatch(format!(
            "expected {}, got {}",
            expected_hash, actual_hash
        ))));
    }
    Ok(())
}
