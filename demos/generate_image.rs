//! Basic text-to-image example.
//!
//! Run with: `cargo run --example generate_image`
//!
//! Requires `BFL_API_KEY` environment variable.

use fluxgen::{BlackForestDriver, FluxModel, ImageGenerationDriver};

#[tokio::main]
async fn main() -> fluxgen::Result<()> {
    let driver = BlackForestDriver::builder()
        .model(FluxModel::FluxPro11)
        .size(1024, 768)
        .build()?;

    let prompts = vec!["A golden retriever puppy playing in snow".to_string()];
    let image = driver.try_text_to_image(&prompts, None).await?;

    image.save("output.jpg")?;
    println!(
        "Generated image: {} bytes, format: {:?}",
        image.size(),
        image.format
    );

    Ok(())
}
