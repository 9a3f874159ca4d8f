//! Base64 handling for images sent to the service.

use crate::error::{FluxGenError, Result};
use crate::image::types::ImageArtifact;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Source of a base64-encoded image for variation and fill requests.
pub trait ImageInput: Send + Sync {
    /// Returns the image encoded as standard, padded base64.
    fn base64(&self) -> String;
}

impl ImageInput for ImageArtifact {
    fn base64(&self) -> String {
        ImageArtifact::base64(self)
    }
}

/// An image that arrives already base64-encoded, e.g. from a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(pub String);

impl EncodedImage {
    /// Wraps an encoded string without checking it.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }
}

impl ImageInput for EncodedImage {
    fn base64(&self) -> String {
        self.0.clone()
    }
}

/// Returns true if `s` decodes as base64 and re-encodes to the same string.
pub fn is_valid_base64(s: &str) -> bool {
    if s.len() % 4 != 0 {
        return false;
    }
    match STANDARD.decode(s) {
        Ok(bytes) => STANDARD.encode(bytes) == s,
        Err(_) => false,
    }
}

/// Encodes `input` and checks the result, naming `field` on failure.
pub(crate) fn encode_checked(field: &str, input: &dyn ImageInput) -> Result<String> {
    let encoded = input.base64();
    if !is_valid_base64(&encoded) {
        return Err(FluxGenError::Encoding(format!(
            "{field} is not valid base64 ({} chars)",
            encoded.len()
        )));
    }
    Ok(encoded)
}
