//! Top-level error wrapper types.

use crate::{
    ConfigError, DatabaseError, DatabaseErrorKind, ImageError, ImageErrorKind, StorageError,
    StorageErrorKind, TokenError, ValidationError,
};

/// Every error a Vitrine operation can produce.
///
/// # Examples
///
/// ```
/// use vitrine_error::{VitrineError, StorageError, StorageErrorKind};
///
/// let storage_err = StorageError::new(StorageErrorKind::FileRead("denied".into()));
/// let err: VitrineError = storage_err.into();
/// assert!(format!("{}", err).contains("Storage Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VitrineErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Blob storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Database error
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Image decoding/encoding error
    #[from(ImageError)]
    Image(ImageError),
    /// Capability token rejected
    #[from(TokenError)]
    Token(TokenError),
    /// Invalid request argument
    #[from(ValidationError)]
    Validation(ValidationError),
}

/// Coarse outcome classes a transport maps to user-visible responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ErrorCategory {
    /// Uploaded bytes are not a decodable raster image
    InvalidFormat,
    /// No such image or ownership for the principal
    NotFound,
    /// Duplicate (user, image) association
    AlreadyOwned,
    /// Any capability token failure
    InvalidToken,
    /// Atomic multi-row mutation could not complete
    TransactionFailure,
    /// Caller supplied an out-of-range argument
    InvalidRequest,
    /// Anything else (I/O, pool, query, configuration)
    Internal,
}

/// Vitrine error with kind discrimination.
///
/// # Examples
///
/// ```
/// use vitrine_error::{ErrorCategory, TokenError, VitrineResult};
///
/// fn verify() -> VitrineResult<()> {
///     Err(TokenError::new())?
/// }
///
/// assert_eq!(verify().unwrap_err().category(), ErrorCategory::InvalidToken);
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vitrine Error: {}", _0)]
pub struct VitrineError(Box<VitrineErrorKind>);

impl VitrineError {
    /// Create a new error from a kind.
    pub fn new(kind: VitrineErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VitrineErrorKind {
        &self.0
    }

    /// Classify the error for a transport layer.
    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            VitrineErrorKind::Image(e) => match e.kind {
                ImageErrorKind::InvalidFormat(_) => ErrorCategory::InvalidFormat,
                _ => ErrorCategory::Internal,
            },
            VitrineErrorKind::Database(e) => match e.kind {
                DatabaseErrorKind::NotFound => ErrorCategory::NotFound,
                DatabaseErrorKind::AlreadyOwned { .. } => ErrorCategory::AlreadyOwned,
                DatabaseErrorKind::TransactionFailure(_) => ErrorCategory::TransactionFailure,
                _ => ErrorCategory::Internal,
            },
            VitrineErrorKind::Storage(e) => match e.kind {
                StorageErrorKind::NotFound(_) => ErrorCategory::NotFound,
                _ => ErrorCategory::Internal,
            },
            VitrineErrorKind::Token(_) => ErrorCategory::InvalidToken,
            VitrineErrorKind::Validation(_) => ErrorCategory::InvalidRequest,
            VitrineErrorKind::Config(_) => ErrorCategory::Internal,
        }
    }
}

// Generic From implementation for any type that converts to VitrineErrorKind
impl<T> From<T> for VitrineError
where
    T: Into<VitrineErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Vitrine operations.
pub type VitrineResult<T> = std::result::Result<T, VitrineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_kinds_map_to_categories() {
        let cases = [
            (DatabaseErrorKind::NotFound, ErrorCategory::NotFound),
            (
                DatabaseErrorKind::AlreadyOwned {
                    user_id: 1,
                    image_id: 2,
                },
                ErrorCategory::AlreadyOwned,
            ),
            (
                DatabaseErrorKind::TransactionFailure("rolled back".into()),
                ErrorCategory::TransactionFailure,
            ),
            (
                DatabaseErrorKind::Pool("timed out".into()),
                ErrorCategory::Internal,
            ),
        ];

        for (kind, expected) in cases {
            let err: VitrineError = DatabaseError::new(kind).into();
            assert_eq!(err.category(), expected);
        }
    }

    #[test]
    fn image_decode_failures_are_internal() {
        let err: VitrineError = ImageError::new(ImageErrorKind::Decode("truncated".into())).into();
        assert_eq!(err.category(), ErrorCategory::Internal);

        let err: VitrineError =
            ImageError::new(ImageErrorKind::InvalidFormat("text/plain".into())).into();
        assert_eq!(err.category(), ErrorCategory::InvalidFormat);
    }

    #[test]
    fn missing_blob_is_not_found() {
        let err: VitrineError =
            StorageError::new(StorageErrorKind::NotFound("/tmp/x.png".into())).into();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn token_error_display_has_no_reason() {
        let err: VitrineError = TokenError::new().into();
        let text = err.to_string();
        assert!(text.contains("Invalid token"));
        assert!(!text.contains("expired"));
    }
}
