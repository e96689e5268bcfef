//! Views handed to a transport layer.

use crate::{Image, Ownership};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which bytes to serve for an image.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// The canonical upload
    Original,
    /// Bounded-size preview
    Thumbnail,
    /// Size-compressed rendition
    #[default]
    Compressed,
}

impl Variant {
    /// Pick a variant from the `thumb`/`compress` request flags.
    ///
    /// `thumb` wins over `compress`; neither selects the original.
    pub fn from_flags(thumb: bool, compress: bool) -> Self {
        match (thumb, compress) {
            (true, _) => Variant::Thumbnail,
            (false, true) => Variant::Compressed,
            (false, false) => Variant::Original,
        }
    }
}

/// An image joined with one user's ownership row, plus access URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageView {
    /// Canonical image id
    pub image_id: i64,
    /// Stored file name, `{hash}.{ext}`
    pub image_hash_name: String,
    /// Owning user
    pub user_id: i64,
    /// Visibility
    pub is_private: bool,
    /// Ownership creation time
    pub created_time: DateTime<Utc>,
    /// Last visibility change
    pub updated_time: DateTime<Utc>,
    /// Owner-only URL
    pub private_url: String,
    /// Shareable URL carrying a capability token; `None` while private
    pub public_url: Option<String>,
}

impl ImageView {
    /// Join an image and ownership with precomputed URLs.
    pub fn new(
        image: &Image,
        ownership: &Ownership,
        private_url: String,
        public_url: Option<String>,
    ) -> Self {
        Self {
            image_id: image.image_id,
            image_hash_name: image.file_name(),
            user_id: ownership.user_id,
            is_private: ownership.is_private,
            created_time: ownership.created_time,
            updated_time: ownership.updated_time,
            private_url,
            public_url,
        }
    }
}

/// A resolved file ready to be streamed by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Location on local storage
    pub path: PathBuf,
    /// Which variant the bytes are
    pub variant: Variant,
    /// MIME type of the bytes at `path`
    pub mime_type: String,
}
