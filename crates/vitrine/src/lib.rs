//! Vitrine - deduplicating image store
//!
//! Vitrine stores uploaded raster images once per distinct byte sequence and
//! tracks which users own them. Owners fetch their images directly; anyone
//! else needs a public URL carrying a capability token, which stops working
//! as soon as the owner changes the image's visibility.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitrine::{AppContext, ImageService, VitrineConfig};
//! use vitrine_core::{ListQuery, Variant};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VitrineConfig::load(None)?;
//! let service = ImageService::new(Arc::new(AppContext::new(config).await?))?;
//!
//! let bytes = std::fs::read("cat.png")?;
//! let view = service.upload(1, bytes, false).await?;
//! let thumb = service.fetch_private(1, view.image_id, Variant::Thumbnail).await?;
//! println!("{} -> {}", view.image_hash_name, thumb.path.display());
//!
//! let page = service.list_images(1, ListQuery::default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `vitrine_error` - Error types
//! - `vitrine_core` - Shared record types
//! - `vitrine_storage` - Blob layout, atomic writes, thumbnails and compression
//! - `vitrine_database` - SQLite rows for images and ownerships
//! - `vitrine_security` - Capability token codec
//!
//! This crate wires them together behind [`ImageService`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod service;
mod telemetry;

pub use config::{StorageConfig, VitrineConfig, MAX_POOL_SIZE};
pub use context::AppContext;
pub use service::{ImageService, PUBLIC_FILE_NAME_PATTERN};
pub use telemetry::init_tracing;

pub use vitrine_core::{ImageFile, ImageFilter, ImageView, ListQuery, OrderBy, Variant};
pub use vitrine_error::{ErrorCategory, VitrineError, VitrineResult};
