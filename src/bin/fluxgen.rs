//! CLI for fluxgen - Flux image generation.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fluxgen::{
    AspectRatio, BlackForestDriver, FluxModel, ImageArtifact, ImageGenerationDriver, OutputFormat,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fluxgen")]
#[command(about = "Generate images with Black Forest Labs' Flux models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    driver: DriverArgs,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log requests and poll statuses to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a text prompt
    Generate(PromptArgs),

    /// Generate an image conditioned on a source image
    Vary {
        #[command(flatten)]
        prompt: PromptArgs,

        /// Source image (image prompt, or control image for canny/depth)
        #[arg(short, long)]
        image: PathBuf,
    },

    /// Repaint the masked region of an image
    Inpaint(FillArgs),

    /// Extend an image into the masked region
    Outpaint(FillArgs),

    /// List models and the operations they support
    Models,
}

#[derive(Args)]
struct PromptArgs {
    /// The text prompt describing the image
    #[arg(required = true)]
    prompt: Vec<String>,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct FillArgs {
    #[command(flatten)]
    prompt: PromptArgs,

    /// Source image
    #[arg(short, long)]
    image: PathBuf,

    /// Mask image; white marks the region to generate
    #[arg(short, long)]
    mask: PathBuf,
}

#[derive(Args)]
struct DriverArgs {
    /// Model identifier
    #[arg(long, global = true, default_value = "flux-pro-1.1")]
    model: String,

    /// API root
    #[arg(long, global = true, env = "BFL_BASE_URL", default_value = "https://api.bfl.ml")]
    base_url: String,

    /// Image width in pixels (multiple of 32, 256-1440)
    #[arg(long, global = true, default_value_t = 1024)]
    width: u32,

    /// Image height in pixels (multiple of 32, 256-1440)
    #[arg(long, global = true, default_value_t = 768)]
    height: u32,

    /// Aspect ratio for the ultra model, e.g. 16:9
    #[arg(long, global = true)]
    aspect_ratio: Option<String>,

    /// Moderation tolerance, 0 (strict) to 6
    #[arg(long, global = true)]
    safety_tolerance: Option<u8>,

    /// Seed for reproducible results
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Let the service rewrite the prompt
    #[arg(long, global = true)]
    prompt_upsampling: bool,

    /// Diffusion steps (1-50)
    #[arg(long, global = true)]
    steps: Option<u32>,

    /// Guidance scale (1.5-5)
    #[arg(long, global = true)]
    guidance: Option<f64>,

    /// Guidance scale for canny/depth variations (1-100)
    #[arg(long, global = true)]
    guidance_canny: Option<f64>,

    /// Guidance interval for flux-pro (1-4)
    #[arg(long, global = true)]
    interval: Option<u32>,

    /// Less processed output (ultra model)
    #[arg(long, global = true)]
    raw: bool,

    /// Output format: jpeg or png
    #[arg(long, global = true)]
    output_format: Option<String>,

    /// Image prompt weight for the ultra model (0-1)
    #[arg(long, global = true)]
    image_prompt_strength: Option<f64>,

    /// Delay between status polls in milliseconds
    #[arg(long, global = true, default_value_t = 500)]
    sleep_interval_ms: u64,

    /// Give up after this many seconds of polling
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

impl DriverArgs {
    fn build(&self) -> anyhow::Result<BlackForestDriver> {
        let model: FluxModel = self.model.parse()?;

        let mut builder = BlackForestDriver::builder()
            .model(model)
            .base_url(&self.base_url)
            .size(self.width, self.height)
            .sleep_interval(Duration::from_millis(self.sleep_interval_ms));

        if let Some(ar) = &self.aspect_ratio {
            builder = builder.aspect_ratio(ar.parse::<AspectRatio>()?);
        }
        if let Some(t) = self.safety_tolerance {
            builder = builder.safety_tolerance(t);
        }
        if let Some(s) = self.seed {
            builder = builder.seed(s);
        }
        if self.prompt_upsampling {
            builder = builder.prompt_upsampling(true);
        }
        if let Some(s) = self.steps {
            builder = builder.steps(s);
        }
        if let Some(g) = self.guidance {
            builder = builder.guidance(g);
        }
        if let Some(g) = self.guidance_canny {
            builder = builder.guidance_canny(g);
        }
        if let Some(i) = self.interval {
            builder = builder.interval(i);
        }
        if self.raw {
            builder = builder.raw(true);
        }
        if let Some(f) = &self.output_format {
            builder = builder.output_format(f.parse::<OutputFormat>()?);
        }
        if let Some(s) = self.image_prompt_strength {
            builder = builder.image_prompt_strength(s);
        }
        if let Some(t) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(t));
        }

        Ok(builder.build()?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "fluxgen=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (image, output) = match cli.command {
        Commands::Models => return list_models(cli.json),
        Commands::Generate(args) => {
            let driver = cli.driver.build()?;
            let image = driver.try_text_to_image(&args.prompt, None).await?;
            (image, args.output)
        }
        Commands::Vary { prompt, image } => {
            let driver = cli.driver.build()?;
            let source = load(&image)?;
            let result = driver
                .try_image_variation(&prompt.prompt, &source, None)
                .await?;
            (result, prompt.output)
        }
        Commands::Inpaint(args) => {
            let driver = cli.driver.build()?;
            let (source, mask) = (load(&args.image)?, load(&args.mask)?);
            let result = driver
                .try_image_inpainting(&args.prompt.prompt, &source, &mask, None)
                .await?;
            (result, args.prompt.output)
        }
        Commands::Outpaint(args) => {
            let driver = cli.driver.build()?;
            let (source, mask) = (load(&args.image)?, load(&args.mask)?);
            let result = driver
                .try_image_outpainting(&args.prompt.prompt, &source, &mask, None)
                .await?;
            (result, args.prompt.output)
        }
    };

    image.save(&output)?;
    report(&image, &output, cli.json)
}

fn load(path: &Path) -> anyhow::Result<ImageArtifact> {
    ImageArtifact::load(path).with_context(|| format!("reading {}", path.display()))
}

fn report(image: &ImageArtifact, output: &Path, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "output": output.display().to_string(),
            "size_bytes": image.size(),
            "format": image.format.extension(),
            "width": image.width,
            "height": image.height,
            "model": image.metadata.model,
            "job_id": image.metadata.job_id,
            "seed": image.metadata.seed,
            "duration_ms": image.metadata.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated image: {} ({} bytes) via {}",
            output.display(),
            image.size(),
            image.metadata.model.as_deref().unwrap_or("flux")
        );
        if let Some(duration) = image.metadata.duration_ms {
            println!("Duration: {}ms", duration);
        }
    }

    Ok(())
}

fn list_models(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ModelInfo {
        model: &'static str,
        text_to_image: bool,
        variation: Option<&'static str>,
        fill: bool,
        explicit_size: bool,
    }

    let models: Vec<ModelInfo> = FluxModel::ALL
        .iter()
        .map(|m| {
            let caps = m.capabilities();
            ModelInfo {
                model: m.as_str(),
                text_to_image: caps.text_to_image,
                variation: caps.variation.map(|v| v.field()),
                fill: caps.fill,
                explicit_size: caps.explicit_size,
            }
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        println!("Available models (API key: {}):\n", fluxgen::image::drivers::API_KEY_ENV);
        for m in &models {
            let mut ops = Vec::new();
            if m.text_to_image {
                ops.push("generate".to_string());
            }
            if let Some(field) = m.variation {
                ops.push(format!("vary ({field})"));
            }
            if m.fill {
                ops.push("inpaint".to_string());
                ops.push("outpaint".to_string());
            }
            println!("  {:<20} {}", m.model, ops.join(", "));
        }
    }

    Ok(())
}
