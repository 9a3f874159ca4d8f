//! Inpainting example - replaces the masked region of an image.
//!
//! Run with: `cargo run --example inpaint_image -- <image.jpg> <mask.jpg>`
//!
//! Requires `BFL_API_KEY` environment variable.

use fluxgen::{BlackForestDriver, FluxModel, ImageArtifact, ImageGenerationDriver};

#[tokio::main]
async fn main() -> fluxgen::Result<()> {
    let mut args = std::env::args().skip(1);
    let (image_path, mask_path) = match (args.next(), args.next()) {
        (Some(image), Some(mask)) => (image, mask),
        _ => {
            eprintln!("Usage: inpaint_image <image.jpg> <mask.jpg>");
            std::process::exit(2);
        }
    };

    let image = ImageArtifact::load(&image_path)?;
    let mask = ImageArtifact::load(&mask_path)?;

    let driver = BlackForestDriver::builder()
        .model(FluxModel::FluxPro10)
        .build()?;

    let prompts = vec!["A dog on a skateboard on a boat at sea".to_string()];
    let result = driver
        .try_image_inpainting(&prompts, &image, &mask, None)
        .await?;
    result.save("inpainted.jpg")?;
    println!("Inpainted image saved to inpainted.jpg ({} bytes)", result.size());

    Ok(())
}
