//! Variation conditioned on a control image with the canny model.
//!
//! Run with: `cargo run --example canny_variation -- <control_image.jpg>`
//!
//! Requires `BFL_API_KEY` environment variable.

use fluxgen::{BlackForestDriver, FluxModel, ImageArtifact, ImageGenerationDriver};

#[tokio::main]
async fn main() -> fluxgen::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: canny_variation <control_image.jpg>");

    let control = ImageArtifact::load(&input_path)?;

    let driver = BlackForestDriver::builder()
        .model(FluxModel::FluxPro10Canny)
        .guidance_canny(30.0)
        .build()?;

    let prompts = vec!["Childrens messy crayon drawing of a dog on a skateboard".to_string()];
    let image = driver.try_image_variation(&prompts, &control, None).await?;
    image.save("canny.jpg")?;
    println!("Variation saved to canny.jpg ({} bytes)", image.size());

    Ok(())
}
