//! Image generation module.

mod driver;
pub mod drivers;
mod encoding;
mod types;

pub use driver::ImageGenerationDriver;
pub use encoding::{is_valid_base64, EncodedImage, ImageInput};
pub use types::{GenerationMetadata, ImageArtifact, ImageFormat, Operation, OutputFormat};
