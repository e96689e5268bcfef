//! Canonical image records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A canonical, content-addressed image blob.
///
/// Identity is the content hash: two uploads of the same bytes always
/// resolve to the same `Image`. Records are never mutated after creation.
///
/// # Examples
///
/// ```
/// use vitrine_core::{Image, now_millis};
///
/// let image = Image {
///     image_id: 7,
///     content_hash: "ab".repeat(32),
///     extension: "png".to_string(),
///     created_time: now_millis(),
/// };
/// assert!(image.file_name().ends_with(".png"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Image {
    /// Opaque identifier
    pub image_id: i64,
    /// Lower-case hex SHA-256 of the raw bytes
    pub content_hash: String,
    /// Extension of the detected format, without the dot
    pub extension: String,
    /// When the first upload of these bytes happened
    pub created_time: DateTime<Utc>,
}

impl Image {
    /// Stored file name: `{hash}.{ext}`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.content_hash, self.extension)
    }
}
