//! Error types for Flux image generation.

use crate::image::Operation;
use std::time::Duration;

/// Errors that can occur while configuring the driver or generating an image.
#[derive(Debug, thiserror::Error)]
pub enum FluxGenError {
    /// A configuration field is outside its valid range.
    #[error("invalid {field}: {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable constraint that was violated.
        reason: String,
    },

    /// The configured model has no payload shape for the requested operation.
    #[error("model {model} does not support {operation}")]
    Unsupported {
        /// API identifier of the configured model.
        model: String,
        /// The operation that was requested.
        operation: Operation,
    },

    /// API returned a non-success response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or description.
        message: String,
    },

    /// API response was missing an expected field.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Remote job reached a terminal status other than "Ready".
    #[error(
        "job {id} failed with status {status}{}",
        .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    JobFailed {
        /// Remote job identifier.
        id: String,
        /// Last status reported for the job.
        status: String,
        /// Error text reported by the service, if any.
        message: Option<String>,
    },

    /// Request or result was rejected by moderation.
    #[error("content moderated: {0}")]
    ContentModerated(String),

    /// Polling exceeded the configured bound.
    #[error("job did not complete within {0:?}")]
    Timeout(Duration),

    /// Input image or mask failed base64 validation.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`FluxGenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid configuration, detected before any request is built.
    Configuration,
    /// Operation not available for the configured model.
    Unsupported,
    /// Transport failure or bad response from the remote service.
    Remote,
    /// Input image data failed validation.
    Encoding,
    /// Local file system failure.
    Io,
}

impl FluxGenError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. } => ErrorCategory::Configuration,
            Self::Unsupported { .. } => ErrorCategory::Unsupported,
            Self::Api { .. }
            | Self::UnexpectedResponse(_)
            | Self::JobFailed { .. }
            | Self::ContentModerated(_)
            | Self::Timeout(_)
            | Self::Network(_)
            | Self::Json(_) => ErrorCategory::Remote,
            Self::Encoding(_) => ErrorCategory::Encoding,
            Self::Io(_) => ErrorCategory::Io,
        }
    }

    /// Returns the offending field name for configuration errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, FluxGenError>;
