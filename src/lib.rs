#![warn(missing_docs)]
//! fluxgen - image generation driver for Black Forest Labs' Flux models.
//!
//! The driver turns a prompt (and, depending on the model, a source image
//! and mask) into a model-specific request, submits it, polls the job until
//! it is ready and returns the resulting image bytes.
//!
//! # Quick Start
//!
//! ```no_run
//! use fluxgen::{BlackForestDriver, FluxModel, ImageGenerationDriver};
//!
//! #[tokio::main]
//! async fn main() -> fluxgen::Result<()> {
//!     let driver = BlackForestDriver::builder()
//!         .model(FluxModel::FluxPro11)
//!         .size(1024, 768)
//!         .build()?;
//!     let prompts = vec!["A golden retriever puppy".to_string()];
//!     let image = driver.try_text_to_image(&prompts, None).await?;
//!     image.save("puppy.jpg")?;
//!     Ok(())
//! }
//! ```
//!
//! # Operations
//!
//! Which operations a driver accepts depends on its model; see
//! [`FluxModel::capabilities`]. Unsupported combinations fail with
//! [`FluxGenError::Unsupported`] before any request is sent.
//!
//! - text-to-image: `flux-pro-1.1`, `flux-pro-1.1-ultra`, `flux-pro`, `flux-dev`
//! - variation: the above via `image_prompt`, `flux-pro-1.0-canny` and
//!   `flux-pro-1.0-depth` via `control_image`
//! - inpainting / outpainting: `flux-pro-1.0` via `flux-pro-1.0-fill`
//!
//! # Features
//!
//! - `cli`: the `fluxgen` command-line tool (enabled by default)

mod error;
pub mod image;

// Re-export error types at crate root
pub use error::{ErrorCategory, FluxGenError, Result};

pub use image::drivers::{
    AspectRatio, BlackForestDriver, BlackForestDriverBuilder, DriverConfig, FluxModel,
    ModelCapabilities, PayloadRequest, VariationInput,
};
pub use image::{
    EncodedImage, GenerationMetadata, ImageArtifact, ImageFormat, ImageGenerationDriver,
    ImageInput, Operation, OutputFormat,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{FluxGenError, Result};
    pub use crate::image::drivers::{BlackForestDriver, FluxModel};
    pub use crate::image::{EncodedImage, ImageArtifact, ImageGenerationDriver, ImageInput};
}
