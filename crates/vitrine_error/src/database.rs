//! Database error types.

/// Database error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// Connection failed
    #[display("Database connection error: {}", _0)]
    Connection(String),
    /// No connection became available before the pool timeout elapsed
    #[display("Connection pool exhausted: {}", _0)]
    Pool(String),
    /// Query execution failed
    #[display("Database query error: {}", _0)]
    Query(String),
    /// A UNIQUE constraint rejected the write
    #[display("Unique constraint violated: {}", _0)]
    UniqueViolation(String),
    /// A FOREIGN KEY constraint rejected the write
    #[display("Foreign key constraint violated: {}", _0)]
    ForeignKeyViolation(String),
    /// Migration error
    #[display("Migration error: {}", _0)]
    Migration(String),
    /// Record not found
    #[display("Record not found")]
    NotFound,
    /// The user already owns an ownership row for this image
    #[display("User {} already owns image {}", user_id, image_id)]
    AlreadyOwned {
        /// Owning user
        user_id: i64,
        /// Image that is already associated
        image_id: i64,
    },
    /// A multi-row mutation was rolled back
    #[display("Transaction failed: {}", _0)]
    TransactionFailure(String),
}

/// Database error with source location tracking.
///
/// # Examples
///
/// ```
/// use vitrine_error::{DatabaseError, DatabaseErrorKind};
///
/// let err = DatabaseError::new(DatabaseErrorKind::NotFound);
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// The kind of error that occurred
    pub kind: DatabaseErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DatabaseError {
    /// Create a new DatabaseError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether this error was raised by a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::UniqueViolation(_))
    }

    /// Whether this error was raised by a FOREIGN KEY constraint.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::ForeignKeyViolation(_))
    }
}

// Diesel error conversions (only available with database feature)
#[cfg(feature = "database")]
impl From<diesel::result::Error> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind as DieselKind, Error};

        match err {
            Error::NotFound => DatabaseError::new(DatabaseErrorKind::NotFound),
            Error::DatabaseError(DieselKind::UniqueViolation, info) => DatabaseError::new(
                DatabaseErrorKind::UniqueViolation(info.message().to_string()),
            ),
            Error::DatabaseError(DieselKind::ForeignKeyViolation, info) => DatabaseError::new(
                DatabaseErrorKind::ForeignKeyViolation(info.message().to_string()),
            ),
            _ => DatabaseError::new(DatabaseErrorKind::Query(err.to_string())),
        }
    }
}

#[cfg(feature = "database")]
impl From<diesel::ConnectionError> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        DatabaseError::new(DatabaseErrorKind::Connection(err.to_string()))
    }
}

#[cfg(feature = "database")]
impl From<diesel::r2d2::PoolError> for DatabaseError {
    #[track_caller]
    fn from(err: diesel::r2d2::PoolError) -> Self {
        DatabaseError::new(DatabaseErrorKind::Pool(err.to_string()))
    }
}
