//! Image generation driver trait.

use crate::error::{FluxGenError, Result};
use crate::image::encoding::ImageInput;
use crate::image::types::{ImageArtifact, Operation};
use async_trait::async_trait;

/// Trait for image generation drivers.
///
/// Each operation takes the prompt as an ordered list of fragments. Negative
/// prompts are accepted for interface compatibility; drivers may ignore them.
/// The default implementations reject the operation, so a driver only
/// overrides what its backend can do.
#[async_trait]
pub trait ImageGenerationDriver: Send + Sync {
    /// Returns the identifier of the model this driver targets.
    fn model(&self) -> &str;

    /// Generates an image from the prompt alone.
    async fn try_text_to_image(
        &self,
        prompts: &[String],
        negative_prompts: Option<&[String]>,
    ) -> Result<ImageArtifact> {
        let _ = (prompts, negative_prompts);
        Err(self.unsupported(Operation::TextToImage))
    }

    /// Generates an image conditioned on `image`.
    async fn try_image_variation(
        &self,
        prompts: &[String],
        image: &dyn ImageInput,
        negative_prompts: Option<&[String]>,
    ) -> Result<ImageArtifact> {
        let _ = (prompts, image, negative_prompts);
        Err(self.unsupported(Operation::Variation))
    }

    /// Repaints the region of `image` selected by `mask`.
    async fn try_image_inpainting(
        &self,
        prompts: &[String],
        image: &dyn ImageInput,
        mask: &dyn ImageInput,
        negative_prompts: Option<&[String]>,
    ) -> Result<ImageArtifact> {
        let _ = (prompts, image, mask, negative_prompts);
        Err(self.unsupported(Operation::Inpainting))
    }

    /// Extends `image` into the region selected by `mask`.
    async fn try_image_outpainting(
        &self,
        prompts: &[String],
        image: &dyn ImageInput,
        mask: &dyn ImageInput,
        negative_prompts: Option<&[String]>,
    ) -> Result<ImageArtifact> {
        let _ = (prompts, image, mask, negative_prompts);
        Err(self.unsupported(Operation::Outpainting))
    }

    /// Builds the error returned for an operation this driver cannot run.
    fn unsupported(&self, operation: Operation) -> FluxGenError {
        FluxGenError::Unsupported {
            model: self.model().to_string(),
            operation,
        }
    }
}
