//! Request bodies for the generation endpoints.
//!
//! Which optional fields are sent depends on the model's capability entry;
//! unset fields are omitted from the JSON entirely.

use crate::error::{FluxGenError, Result};
use crate::image::types::{Operation, OutputFormat};
use serde::Serialize;

use super::config::{AspectRatio, DriverConfig};
use super::model::VariationInput;

/// The operation being requested, with its encoded inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadRequest {
    /// Prompt only.
    TextToImage,
    /// Prompt plus a source image.
    Variation {
        /// Base64 source image.
        image: String,
    },
    /// Prompt plus image and mask, sent to the fill endpoint.
    Inpainting {
        /// Base64 source image.
        image: String,
        /// Base64 mask.
        mask: String,
    },
    /// Same wire shape and endpoint as [`PayloadRequest::Inpainting`].
    Outpainting {
        /// Base64 source image.
        image: String,
        /// Base64 mask.
        mask: String,
    },
}

impl PayloadRequest {
    /// Returns the operation this request performs.
    pub fn operation(&self) -> Operation {
        match self {
            Self::TextToImage => Operation::TextToImage,
            Self::Variation { .. } => Operation::Variation,
            Self::Inpainting { .. } => Operation::Inpainting,
            Self::Outpainting { .. } => Operation::Outpainting,
        }
    }
}

/// JSON body posted to `/v1/{model}` or `/v1/{model}-fill`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FluxPayload {
    pub(crate) prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) safety_tolerance: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) output_format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) aspect_ratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) image_prompt_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) raw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) guidance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) prompt_upsampling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) image_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) control_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) mask: Option<String>,
}

/// Joins prompt fragments with single spaces.
pub fn join_prompts(prompts: &[String]) -> String {
    prompts.join(" ")
}

impl FluxPayload {
    /// Builds the body for `request` under `config`.
    ///
    /// Fails with [`FluxGenError::Unsupported`] when the model has no payload
    /// shape for the requested operation.
    pub fn build(config: &DriverConfig, prompt: String, request: PayloadRequest) -> Result<Self> {
        let model = config.model;
        let caps = model.capabilities();
        let operation = request.operation();

        if !caps.supports(operation) {
            return Err(FluxGenError::Unsupported {
                model: model.as_str().to_string(),
                operation,
            });
        }

        let mut payload = Self {
            prompt,
            seed: config.seed,
            safety_tolerance: config.safety_tolerance,
            output_format: config.output_format,
            ..Default::default()
        };

        if caps.ultra_params {
            if let Some(aspect_ratio) = config.aspect_ratio {
                payload.aspect_ratio = Some(aspect_ratio);
                payload.image_prompt_strength = Some(config.image_prompt_strength);
            }
            payload.raw = config.raw;
        }

        if caps.interval {
            payload.interval = config.interval;
        }

        if caps.sampling {
            payload.guidance = config.guidance;
            payload.steps = config.steps;
            payload.prompt_upsampling = config.prompt_upsampling;
        }

        if caps.explicit_size {
            payload.width = Some(config.width);
            payload.height = Some(config.height);
        }

        match request {
            PayloadRequest::TextToImage => {}
            PayloadRequest::Variation { image } => match caps.variation {
                Some(VariationInput::ControlImage) => {
                    payload.control_image = Some(image);
                    if config.guidance_canny.is_some() {
                        payload.guidance = config.guidance_canny;
                    }
                }
                Some(VariationInput::ImagePrompt) => payload.image_prompt = Some(image),
                // Rejected by the capability check above.
                None => {}
            },
            PayloadRequest::Inpainting { image, mask }
            | PayloadRequest::Outpainting { image, mask } => {
                payload.image = Some(image);
                payload.mask = Some(mask);
            }
        }

        tracing::trace!(model = %model, %operation, "built payload");

        Ok(payload)
    }
}
