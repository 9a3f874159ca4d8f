//! Flux model variants and what each one accepts.

use crate::error::{FluxGenError, Result};
use crate::image::types::Operation;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Flux model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FluxModel {
    /// FLUX1.1 [pro].
    #[default]
    #[serde(rename = "flux-pro-1.1")]
    FluxPro11,
    /// FLUX1.1 [pro] Ultra, sized by aspect ratio.
    #[serde(rename = "flux-pro-1.1-ultra")]
    FluxPro11Ultra,
    /// FLUX.1 [pro].
    #[serde(rename = "flux-pro")]
    FluxPro,
    /// FLUX.1 [dev].
    #[serde(rename = "flux-dev")]
    FluxDev,
    /// FLUX.1 Canny [pro], conditioned on an edge map.
    #[serde(rename = "flux-pro-1.0-canny")]
    FluxPro10Canny,
    /// FLUX.1 Depth [pro], conditioned on a depth map.
    #[serde(rename = "flux-pro-1.0-depth")]
    FluxPro10Depth,
    /// FLUX.1 Fill [pro], served from the `-fill` endpoint.
    #[serde(rename = "flux-pro-1.0")]
    FluxPro10,
}

/// Field that carries the source image of a variation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariationInput {
    /// `control_image`: spatial conditioning for canny/depth models.
    ControlImage,
    /// `image_prompt`: loose visual reference.
    ImagePrompt,
}

impl VariationInput {
    /// Returns the JSON field name.
    pub fn field(&self) -> &'static str {
        match self {
            Self::ControlImage => "control_image",
            Self::ImagePrompt => "image_prompt",
        }
    }
}

/// Operations and optional parameters a model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCapabilities {
    /// Prompt-only generation.
    pub text_to_image: bool,
    /// How a variation source image is sent, if variation is supported.
    pub variation: Option<VariationInput>,
    /// Inpainting/outpainting through `{model}-fill`.
    pub fill: bool,
    /// `width` and `height` are always sent.
    pub explicit_size: bool,
    /// `aspect_ratio`, `image_prompt_strength` and `raw`.
    pub ultra_params: bool,
    /// `interval`.
    pub interval: bool,
    /// `guidance`, `steps` and `prompt_upsampling`.
    pub sampling: bool,
}

impl ModelCapabilities {
    const NONE: Self = Self {
        text_to_image: false,
        variation: None,
        fill: false,
        explicit_size: false,
        ultra_params: false,
        interval: false,
        sampling: false,
    };

    /// Returns true if the operation has a payload shape for this model.
    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::TextToImage => self.text_to_image,
            Operation::Variation => self.variation.is_some(),
            Operation::Inpainting | Operation::Outpainting => self.fill,
        }
    }
}

impl FluxModel {
    /// All known models.
    pub const ALL: [FluxModel; 7] = [
        Self::FluxPro11,
        Self::FluxPro11Ultra,
        Self::FluxPro,
        Self::FluxDev,
        Self::FluxPro10Canny,
        Self::FluxPro10Depth,
        Self::FluxPro10,
    ];

    /// Returns the API identifier, which is also the endpoint path segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FluxPro11 => "flux-pro-1.1",
            Self::FluxPro11Ultra => "flux-pro-1.1-ultra",
            Self::FluxPro => "flux-pro",
            Self::FluxDev => "flux-dev",
            Self::FluxPro10Canny => "flux-pro-1.0-canny",
            Self::FluxPro10Depth => "flux-pro-1.0-depth",
            Self::FluxPro10 => "flux-pro-1.0",
        }
    }

    /// Returns the capability table entry for this model.
    pub const fn capabilities(&self) -> ModelCapabilities {
        use VariationInput::*;

        match self {
            Self::FluxPro11 => ModelCapabilities {
                text_to_image: true,
                variation: Some(ImagePrompt),
                explicit_size: true,
                ..ModelCapabilities::NONE
            },
            Self::FluxPro11Ultra => ModelCapabilities {
                text_to_image: true,
                variation: Some(ImagePrompt),
                ultra_params: true,
                ..ModelCapabilities::NONE
            },
            Self::FluxPro => ModelCapabilities {
                text_to_image: true,
                variation: Some(ImagePrompt),
                explicit_size: true,
                interval: true,
                sampling: true,
                ..ModelCapabilities::NONE
            },
            Self::FluxDev => ModelCapabilities {
                text_to_image: true,
                variation: Some(ImagePrompt),
                explicit_size: true,
                sampling: true,
                ..ModelCapabilities::NONE
            },
            Self::FluxPro10Canny | Self::FluxPro10Depth => ModelCapabilities {
                variation: Some(ControlImage),
                sampling: true,
                ..ModelCapabilities::NONE
            },
            Self::FluxPro10 => ModelCapabilities {
                fill: true,
                ..ModelCapabilities::NONE
            },
        }
    }

    /// Returns the endpoint path segment used for `operation`.
    pub fn endpoint(&self, operation: Operation) -> String {
        match operation {
            Operation::Inpainting | Operation::Outpainting => format!("{}-fill", self.as_str()),
            Operation::TextToImage | Operation::Variation => self.as_str().to_string(),
        }
    }
}

impl FromStr for FluxModel {
    type Err = FluxGenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|m| m.as_str()).collect();
                FluxGenError::invalid(
                    "model",
                    format!("unknown model {s:?}, expected one of {}", known.join(", ")),
                )
            })
    }
}

impl std::fmt::Display for FluxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
