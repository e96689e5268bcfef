//! Request validation errors.

/// A caller-supplied argument was out of range.
///
/// # Examples
///
/// ```
/// use vitrine_error::ValidationError;
///
/// let err = ValidationError::new("limit", "must be between 1 and 100");
/// assert_eq!(err.field, "limit");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation failed for '{}': {} at line {} in {}", field, reason, line, file)]
pub struct ValidationError {
    /// Offending field
    pub field: String,
    /// Why the value was rejected
    pub reason: String,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError with automatic location tracking.
    #[track_caller]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            field: field.into(),
            reason: reason.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
