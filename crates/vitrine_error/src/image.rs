//! Image decoding and encoding error types.

/// Kinds of image processing errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ImageErrorKind {
    /// Bytes are not a recognised raster image
    #[display("Uploaded data is not a supported image: {}", _0)]
    InvalidFormat(String),
    /// A stored image could not be decoded
    #[display("Failed to decode image: {}", _0)]
    Decode(String),
    /// A derived artifact could not be encoded
    #[display("Failed to encode image: {}", _0)]
    Encode(String),
}

/// Image error with location tracking.
///
/// # Examples
///
/// ```
/// use vitrine_error::{ImageError, ImageErrorKind};
///
/// let err = ImageError::new(ImageErrorKind::InvalidFormat("unknown magic".into()));
/// assert!(format!("{}", err).contains("not a supported image"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Image Error: {} at line {} in {}", kind, line, file)]
pub struct ImageError {
    /// The kind of error that occurred
    pub kind: ImageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ImageError {
    /// Create a new image error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ImageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
