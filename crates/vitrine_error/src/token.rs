//! Capability token error.

/// A capability token was rejected.
///
/// Carries no reason: a malformed token, a token whose ownership
/// row changed and a token for a deleted row all look the same to callers.
///
/// # Examples
///
/// ```
/// use vitrine_error::TokenError;
///
/// let err = TokenError::new();
/// assert!(format!("{}", err).contains("Invalid token"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Invalid token at line {} in {}", line, file)]
pub struct TokenError {
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TokenError {
    /// Create a new TokenError at the current location.
    #[track_caller]
    pub fn new() -> Self {
        let location = std::panic::Location::caller();
        Self {
            line: location.line(),
            file: location.file(),
        }
    }
}

impl Default for TokenError {
    #[track_caller]
    fn default() -> Self {
        Self::new()
    }
}
