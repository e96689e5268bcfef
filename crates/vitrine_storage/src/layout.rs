//! Deterministic on-disk layout.
//!
//! ```text
//! {root}/image/{yyyy}/{mm}/{dd}/{hash}.{ext}   canonical blobs
//! {root}/image/thumb/{hash}.jpeg               thumbnails
//! {root}/image/compress/{hash}.jpeg            compressed renditions
//! ```

use crate::BlobKey;
use chrono::{DateTime, Datelike, Utc};
use vitrine_core::Image;

/// Top-level directory for all image blobs.
pub const IMAGE_DIR: &str = "image";
/// Directory holding thumbnails.
pub const THUMB_DIR: &str = "thumb";
/// Directory holding compressed renditions.
pub const COMPRESS_DIR: &str = "compress";
/// Extension of every derived artifact.
pub const ARTIFACT_EXT: &str = "jpeg";

/// Kind of derived artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ArtifactKind {
    /// Bounded-size preview
    #[display("thumbnail")]
    Thumbnail,
    /// Size-compressed rendition
    #[display("compressed")]
    Compressed,
}

impl ArtifactKind {
    fn dir(&self) -> &'static str {
        match self {
            ArtifactKind::Thumbnail => THUMB_DIR,
            ArtifactKind::Compressed => COMPRESS_DIR,
        }
    }
}

/// `{yyyy}/{mm}/{dd}` segments for a creation time.
pub fn date_segments(created: &DateTime<Utc>) -> [String; 3] {
    [
        format!("{:04}", created.year()),
        format!("{:02}", created.month()),
        format!("{:02}", created.day()),
    ]
}

/// Key of a canonical blob from its parts.
pub fn canonical_key_for(hash: &str, extension: &str, created: &DateTime<Utc>) -> BlobKey {
    let [year, month, day] = date_segments(created);
    BlobKey::from_segments([
        IMAGE_DIR.to_string(),
        year,
        month,
        day,
        format!("{}.{}", hash, extension),
    ])
}

/// Key of an image's canonical blob.
pub fn canonical_key(image: &Image) -> BlobKey {
    canonical_key_for(&image.content_hash, &image.extension, &image.created_time)
}

/// Key of a derived artifact. Depends only on the content hash.
pub fn artifact_key(hash: &str, kind: ArtifactKind) -> BlobKey {
    BlobKey::from_segments([
        IMAGE_DIR.to_string(),
        kind.dir().to_string(),
        format!("{}.{}", hash, ARTIFACT_EXT),
    ])
}

/// Every key an image occupies: canonical blob first, then artifacts.
pub fn all_keys(image: &Image) -> [BlobKey; 3] {
    [
        canonical_key(image),
        artifact_key(&image.content_hash, ArtifactKind::Thumbnail),
        artifact_key(&image.content_hash, ArtifactKind::Compressed),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn image() -> Image {
        Image {
            image_id: 1,
            content_hash: "0f".repeat(32),
            extension: "png".into(),
            created_time: Utc.with_ymd_and_hms(2024, 3, 7, 23, 59, 0).unwrap(),
        }
    }

    #[test]
    fn canonical_is_date_partitioned() {
        let key = canonical_key(&image());
        assert_eq!(
            key.as_str(),
            format!("image/2024/03/07/{}.png", "0f".repeat(32))
        );
    }

    #[test]
    fn artifacts_depend_only_on_hash() {
        let img = image();
        let thumb = artifact_key(&img.content_hash, ArtifactKind::Thumbnail);
        let compress = artifact_key(&img.content_hash, ArtifactKind::Compressed);
        assert_eq!(thumb.as_str(), format!("image/thumb/{}.jpeg", img.content_hash));
        assert_eq!(
            compress.as_str(),
            format!("image/compress/{}.jpeg", img.content_hash)
        );
        assert_eq!(all_keys(&img)[1], thumb);
    }
}
