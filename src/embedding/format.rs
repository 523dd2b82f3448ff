//! Magic-byte image format detection.
//!
//! The embedder accepts the raster formats below; anything else is rejected before the
//! (expensive) model call.

use serde::Serialize;

/// Raster format accepted by the embedders.
///
/// # Example
///
/// ```rust
/// use landmark::embedding::ImageFormat;
///
/// // PNG signature
/// let png_bytes = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// assert_eq!(ImageFormat::detect(&png_bytes), Some(ImageFormat::Png));
/// assert_eq!(ImageFormat::detect(b"%PDF-1.7"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
    Bmp,
}

impl ImageFormat {
    const JPEG_MAGIC: &'static [u8] = &[0xFF, 0xD8, 0xFF];
    const PNG_MAGIC: &'static [u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const GIF87_MAGIC: &'static [u8] = b"GIF87a";
    const GIF89_MAGIC: &'static [u8] = b"GIF89a";
    const BMP_MAGIC: &'static [u8] = b"BM";

    /// Detects the format from the leading bytes of `bytes`.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(Self::JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(Self::PNG_MAGIC) {
            Some(Self::Png)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else if bytes.starts_with(Self::GIF87_MAGIC) || bytes.starts_with(Self::GIF89_MAGIC) {
            Some(Self::Gif)
        } else if bytes.len() >= 14 && bytes.starts_with(Self::BMP_MAGIC) {
            Some(Self::Bmp)
        } else {
            None
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}
