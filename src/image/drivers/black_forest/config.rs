//! Validated driver configuration.

use crate::error::{FluxGenError, Result};
use crate::image::types::OutputFormat;
use serde::{Serialize, Serializer};
use std::str::FromStr;
use std::time::Duration;

use super::model::FluxModel;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.bfl.ml";

/// Image aspect ratio in "W:H" form, each side between 9 and 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    const SIDE: std::ops::RangeInclusive<u32> = 9..=21;

    /// Creates an aspect ratio, validating both sides.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if !Self::SIDE.contains(&width) || !Self::SIDE.contains(&height) {
            return Err(FluxGenError::invalid(
                "aspect_ratio",
                format!("both sides must be between 9 and 21, got {width}:{height}"),
            ));
        }
        Ok(Self { width, height })
    }

    /// Width component.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height component.
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl FromStr for AspectRatio {
    type Err = FluxGenError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed =
            || FluxGenError::invalid("aspect_ratio", format!("expected \"W:H\", got {s:?}"));

        let (w, h) = s.split_once(':').ok_or_else(malformed)?;
        let w = w.trim().parse().map_err(|_| malformed())?;
        let h = h.trim().parse().map_err(|_| malformed())?;
        Self::new(w, h)
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Checks that an image side is a multiple of 32 in `[256, 1440]`.
pub fn validate_dimension(field: &'static str, value: u32) -> Result<()> {
    if value % 32 != 0 {
        return Err(FluxGenError::invalid(
            field,
            format!("must be a multiple of 32, got {value}"),
        ));
    }
    if !(256..=1440).contains(&value) {
        return Err(FluxGenError::invalid(
            field,
            format!("must be between 256 and 1440, got {value}"),
        ));
    }
    Ok(())
}

/// Checks an optional value against an inclusive range. Unset values pass.
pub fn validate_range<T>(field: &'static str, value: Option<T>, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    match value {
        Some(v) if !(v >= min && v <= max) => Err(FluxGenError::invalid(
            field,
            format!("must be between {min} and {max}, got {v}"),
        )),
        _ => Ok(()),
    }
}

/// Driver configuration. Immutable once the driver is built.
#[derive(Debug, Clone, Serialize)]
pub struct DriverConfig {
    /// Model variant; selects the request shape and endpoint.
    pub model: FluxModel,
    /// API root.
    pub base_url: String,
    /// Requested width, sent only by explicitly sized models.
    pub width: u32,
    /// Requested height, sent only by explicitly sized models.
    pub height: u32,
    /// Aspect ratio for the ultra model.
    pub aspect_ratio: Option<AspectRatio>,
    /// Moderation tolerance, 0 (strict) to 6 (permissive).
    pub safety_tolerance: Option<u8>,
    /// Seed for reproducible results.
    pub seed: Option<u64>,
    /// Let the service rewrite the prompt before generating.
    pub prompt_upsampling: Option<bool>,
    /// Diffusion steps, 1 to 50.
    pub steps: Option<u32>,
    /// Guidance scale, 1.5 to 5.
    pub guidance: Option<f64>,
    /// Guidance scale for canny/depth variation, 1 to 100.
    pub guidance_canny: Option<f64>,
    /// Guidance interval for `flux-pro`, 1 to 4.
    pub interval: Option<u32>,
    /// Less processed output for the ultra model.
    pub raw: Option<bool>,
    /// Format of the returned image. The service defaults to JPEG.
    pub output_format: Option<OutputFormat>,
    /// Weight of the image prompt for the ultra model, 0 to 1.
    pub image_prompt_strength: f64,
    /// Delay between status polls.
    #[serde(serialize_with = "serialize_secs")]
    pub sleep_interval: Duration,
    /// Upper bound on total polling time. `None` polls until ready.
    #[serde(serialize_with = "serialize_opt_secs")]
    pub timeout: Option<Duration>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            model: FluxModel::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            width: 1024,
            height: 768,
            aspect_ratio: None,
            safety_tolerance: None,
            seed: None,
            prompt_upsampling: None,
            steps: None,
            guidance: None,
            guidance_canny: None,
            interval: None,
            raw: None,
            output_format: None,
            image_prompt_strength: 0.1,
            sleep_interval: Duration::from_millis(500),
            timeout: None,
        }
    }
}

impl DriverConfig {
    /// Runs every field validator, returning the first failure.
    pub fn validate(&self) -> Result<()> {
        validate_dimension("width", self.width)?;
        validate_dimension("height", self.height)?;
        validate_range("safety_tolerance", self.safety_tolerance, 0, 6)?;
        validate_range("steps", self.steps, 1, 50)?;
        validate_range("guidance", self.guidance, 1.5, 5.0)?;
        validate_range("guidance_canny", self.guidance_canny, 1.0, 100.0)?;
        validate_range("interval", self.interval, 1, 4)?;
        validate_range(
            "image_prompt_strength",
            Some(self.image_prompt_strength),
            0.0,
            1.0,
        )?;

        if self.base_url.trim().is_empty() {
            return Err(FluxGenError::invalid("base_url", "must not be empty"));
        }
        if self.sleep_interval.is_zero() {
            return Err(FluxGenError::invalid("sleep_interval", "must be positive"));
        }
        Ok(())
    }

    /// Joins `path` onto the API root.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

fn serialize_opt_secs<S: Serializer>(
    d: &Option<Duration>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&d.as_secs_f64()),
        None => s.serialize_none(),
    }
}
