//! Error types for the Vitrine image store.
//!
//! This crate provides the foundation error types used throughout the Vitrine workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Transport layers should not match on the nested kinds directly. Use
//! [`VitrineError::category`] to obtain the coarse [`ErrorCategory`] that
//! decides the user-visible outcome.
//!
//! # Examples
//!
//! ```
//! use vitrine_error::{ErrorCategory, ImageError, ImageErrorKind, VitrineResult};
//!
//! fn sniff(data: &[u8]) -> VitrineResult<()> {
//!     if data.is_empty() {
//!         Err(ImageError::new(ImageErrorKind::InvalidFormat("empty upload".into())))?
//!     }
//!     Ok(())
//! }
//!
//! let err = sniff(&[]).unwrap_err();
//! assert_eq!(err.category(), ErrorCategory::InvalidFormat);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod error;
mod image;
mod storage;
mod token;
mod validation;

pub use config::ConfigError;
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{ErrorCategory, VitrineError, VitrineErrorKind, VitrineResult};
pub use image::{ImageError, ImageErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use token::TokenError;
pub use validation::ValidationError;
