//! Content-addressable image storage for Vitrine.
//!
//! This crate owns the byte side of the image store. Records and reference
//! counts live in the database; this crate decides where bytes go and how
//! derived renditions are produced from them.
//!
//! # Features
//!
//! - **Content addressing**: Canonical blobs are named by their SHA-256 hash
//! - **Format sniffing**: Only recognised raster formats are accepted
//! - **Pluggable backends**: [`BlobStore`] abstracts the byte store
//! - **Atomic writes**: Temp file + rename, safe under concurrent writers
//! - **Derived artifacts**: Thumbnails and size-bounded JPEG renditions,
//!   generated lazily and cached next to the originals
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitrine_storage::{ArtifactConfig, ArtifactGenerator, FileSystemStorage};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Arc::new(FileSystemStorage::new("/var/lib/vitrine")?);
//! let artifacts = ArtifactGenerator::new(storage, ArtifactConfig::default());
//! assert_eq!(*artifacts.config().thumbnail_size(), 128);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifact;
mod filesystem;
mod format;
mod hash;
mod key;
pub mod layout;
mod storage;

pub use artifact::{
    compress_to_target, encode_jpeg, render_thumbnail, verify_hash, ArtifactConfig,
    ArtifactGenerator, CompressionOutcome, QualitySchedule, THUMBNAIL_QUALITY,
};
pub use filesystem::FileSystemStorage;
pub use format::{detect_format, mime_for_extension, DetectedFormat};
pub use hash::compute_hash;
pub use key::BlobKey;
pub use layout::ArtifactKind;
pub use storage::BlobStore;
