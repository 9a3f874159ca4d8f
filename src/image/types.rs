//! Core types for image generation.

use crate::error::{FluxGenError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG format (lossy).
    #[default]
    Jpeg,
    /// PNG format (lossless).
    Png,
    /// WebP format. Accepted as input only.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

impl From<OutputFormat> for ImageFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Jpeg => Self::Jpeg,
            OutputFormat::Png => Self::Png,
        }
    }
}

/// Output formats the generation service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG output (service default).
    #[default]
    Jpeg,
    /// PNG output.
    Png,
}

impl OutputFormat {
    /// Returns the value sent in the `output_format` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FluxGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(FluxGenError::invalid(
                "output_format",
                format!("must be \"jpeg\" or \"png\", got {other:?}"),
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four operations an image generation driver exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Generate an image from a prompt alone.
    TextToImage,
    /// Generate an image conditioned on a source image.
    Variation,
    /// Replace the masked region of a source image.
    Inpainting,
    /// Extend a source image beyond its bounds.
    Outpainting,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TextToImage => write!(f, "text-to-image"),
            Self::Variation => write!(f, "variation"),
            Self::Inpainting => write!(f, "inpainting"),
            Self::Outpainting => write!(f, "outpainting"),
        }
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Identifier of the remote job.
    pub job_id: Option<String>,
    /// Seed reported by the service.
    pub seed: Option<u64>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// An image with its bytes, format and dimensions.
///
/// For generated images `width` and `height` are the configured values and
/// are not measured from the returned bytes.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct ImageArtifact {
    /// Raw image bytes.
    pub value: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Generation metadata. Empty for input images.
    pub metadata: GenerationMetadata,
}

impl ImageArtifact {
    /// Creates a new image artifact.
    pub fn new(value: Vec<u8>, format: ImageFormat, width: u32, height: u32) -> Self {
        Self {
            value,
            format,
            width,
            height,
            metadata: GenerationMetadata::default(),
        }
    }

    /// Attaches generation metadata.
    pub fn with_metadata(mut self, metadata: GenerationMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Reads an image from disk, detecting format and dimensions from its bytes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let value = std::fs::read(path)?;

        let format = ImageFormat::from_magic_bytes(&value)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .ok_or_else(|| {
                FluxGenError::Encoding(format!("unrecognized image format: {}", path.display()))
            })?;

        let size = imagesize::blob_size(&value)
            .map_err(|e| FluxGenError::Encoding(format!("{}: {e}", path.display())))?;

        Ok(Self::new(value, format, size.width as u32, size.height as u32))
    }

    /// Returns the actual format detected from magic bytes.
    pub fn detected_format(&self) -> Option<ImageFormat> {
        ImageFormat::from_magic_bytes(&self.value)
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.value.len()
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.value)?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.value)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];

    // 1x1 transparent PNG.
    const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"short"), None);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("PNG".parse::<OutputFormat>().unwrap(), OutputFormat::Png);

        let err = "webp".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.field(), Some("output_format"));
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::TextToImage.to_string(), "text-to-image");
        assert_eq!(Operation::Variation.to_string(), "variation");
        assert_eq!(Operation::Outpainting.to_string(), "outpainting");
    }

    #[test]
    fn test_artifact_base64_and_data_url() {
        let artifact = ImageArtifact::new(b"test".to_vec(), ImageFormat::Png, 1, 1);
        assert_eq!(artifact.base64(), "dGVzdA==");
        assert_eq!(artifact.to_data_url(), "data:image/png;base64,dGVzdA==");
        assert_eq!(artifact.size(), 4);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");

        let artifact = ImageArtifact::new(TINY_PNG.to_vec(), ImageFormat::Png, 1, 1);
        artifact.save(&path).unwrap();

        let loaded = ImageArtifact::load(&path).unwrap();
        assert_eq!(loaded.format, ImageFormat::Png);
        assert_eq!((loaded.width, loaded.height), (1, 1));
        assert_eq!(loaded.value, TINY_PNG);
        assert_eq!(loaded.detected_format(), Some(ImageFormat::Png));
    }

    #[test]
    fn test_load_rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = ImageArtifact::load(&path).unwrap_err();
        assert!(matches!(err, FluxGenError::Encoding(_)));
    }
}
