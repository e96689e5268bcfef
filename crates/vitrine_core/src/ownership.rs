//! Ownership records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's association with a canonical image.
///
/// At most one row exists per `(user_id, image_id)`. The `updated_time`
/// doubles as the version stamp that capability tokens are bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ownership {
    /// Row identifier
    pub ownership_id: i64,
    /// Owning user
    pub user_id: i64,
    /// Referenced canonical image
    pub image_id: i64,
    /// Whether only the owner may read the image
    pub is_private: bool,
    /// When the association was created
    pub created_time: DateTime<Utc>,
    /// Last visibility change
    pub updated_time: DateTime<Utc>,
}

impl Ownership {
    /// Whether the image may be served through a capability token.
    pub fn is_public(&self) -> bool {
        !self.is_private
    }
}
