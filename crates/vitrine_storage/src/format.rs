//! Raster format detection.

use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use vitrine_error::{ImageError, ImageErrorKind};

/// A format sniffed from uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters)]
pub struct DetectedFormat {
    /// Decoder format
    format: ImageFormat,
    /// Decoded pixel width
    width: u32,
    /// Decoded pixel height
    height: u32,
}

impl DetectedFormat {
    /// Canonical file extension for the format, without the dot.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    /// MIME type for the format.
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Sniff `data` and decode it in full.
///
/// Accepts any raster format the `image` crate can decode. Every pixel must
/// decode and the image must have non-zero dimensions, so thumbnails and
/// compressed renditions can always be derived from stored bytes.
///
/// # Errors
///
/// Returns [`ImageErrorKind::InvalidFormat`] if the bytes are not a
/// recognised image, or the header or pixel data is corrupt or truncated.
#[tracing::instrument(skip(data), fields(size = data.len()))]
pub fn detect_format(data: &[u8]) -> Result<DetectedFormat, ImageError> {
    let invalid =
        |e: image::ImageError| ImageError::new(ImageErrorKind::InvalidFormat(e.to_string()));

    let format = image::guess_format(data).map_err(invalid)?;
    let decoded = ImageReader::with_format(Cursor::new(data), format)
        .decode()
        .map_err(invalid)?;
    let (width, height) = (decoded.width(), decoded.height());

    if width == 0 || height == 0 {
        return Err(ImageError::new(ImageErrorKind::InvalidFormat(format!(
            "{}x{} image has no pixels",
            width, height
        ))));
    }

    tracing::debug!(?format, width, height, "Detected image format");
    Ok(DetectedFormat {
        format,
        width,
        height,
    })
}

/// MIME type for a stored extension, falling back to octet-stream.
pub fn mime_for_extension(extension: &str) -> &'static str {
    ImageFormat::from_extension(extension)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn detects_png_and_jpeg() {
        let png = detect_format(&encode(ImageFormat::Png)).unwrap();
        assert_eq!(png.extension(), "png");
        assert_eq!(png.mime_type(), "image/png");
        assert_eq!((*png.width(), *png.height()), (4, 3));

        let jpeg = detect_format(&encode(ImageFormat::Jpeg)).unwrap();
        assert_eq!(*jpeg.format(), ImageFormat::Jpeg);
    }

    #[test]
    fn rejects_text() {
        let err = detect_format(b"definitely not an image").unwrap_err();
        assert!(matches!(err.kind, ImageErrorKind::InvalidFormat(_)));
    }

    #[test]
    fn rejects_truncated_header() {
        let png = encode(ImageFormat::Png);
        assert!(detect_format(&png[..12]).is_err());
    }

    #[test]
    fn rejects_truncated_pixel_data() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(200, 200, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        let png = out.into_inner();

        let err = detect_format(&png[..png.len() / 2]).unwrap_err();
        assert!(matches!(err.kind, ImageErrorKind::InvalidFormat(_)));
    }
}
