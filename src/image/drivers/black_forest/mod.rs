//! Flux (Black Forest Labs) image generation driver.

mod config;
mod model;
pub mod payload;

pub use config::{validate_dimension, validate_range, AspectRatio, DriverConfig};
pub use model::{FluxModel, ModelCapabilities, VariationInput};
pub use payload::{FluxPayload, PayloadRequest};

use crate::error::{FluxGenError, Result};
use crate::image::driver::ImageGenerationDriver;
use crate::image::encoding::{encode_checked, ImageInput};
use crate::image::types::{GenerationMetadata, ImageArtifact, ImageFormat, Operation, OutputFormat};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "BFL_API_KEY";

/// Builder for [`BlackForestDriver`].
#[derive(Debug, Clone, Default)]
pub struct BlackForestDriverBuilder {
    api_key: Option<String>,
    client: Option<reqwest::Client>,
    config: DriverConfig,
}

impl BlackForestDriverBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `BFL_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Uses a preconfigured HTTP client.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the model variant.
    pub fn model(mut self, model: FluxModel) -> Self {
        self.config.model = model;
        self
    }

    /// Sets the API root. Defaults to `https://api.bfl.ml`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Sets the requested width.
    pub fn width(mut self, width: u32) -> Self {
        self.config.width = width;
        self
    }

    /// Sets the requested height.
    pub fn height(mut self, height: u32) -> Self {
        self.config.height = height;
        self
    }

    /// Sets width and height together.
    pub fn size(self, width: u32, height: u32) -> Self {
        self.width(width).height(height)
    }

    /// Sets the aspect ratio used by the ultra model.
    pub fn aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.config.aspect_ratio = Some(aspect_ratio);
        self
    }

    /// Sets the moderation tolerance, 0 (strict) to 6.
    pub fn safety_tolerance(mut self, tolerance: u8) -> Self {
        self.config.safety_tolerance = Some(tolerance);
        self
    }

    /// Sets the seed for reproducible results.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Lets the service rewrite the prompt before generating.
    pub fn prompt_upsampling(mut self, enabled: bool) -> Self {
        self.config.prompt_upsampling = Some(enabled);
        self
    }

    /// Sets the number of diffusion steps, 1 to 50.
    pub fn steps(mut self, steps: u32) -> Self {
        self.config.steps = Some(steps);
        self
    }

    /// Sets the guidance scale, 1.5 to 5.
    pub fn guidance(mut self, guidance: f64) -> Self {
        self.config.guidance = Some(guidance);
        self
    }

    /// Guidance used instead of `guidance` for canny/depth variations.
    pub fn guidance_canny(mut self, guidance: f64) -> Self {
        self.config.guidance_canny = Some(guidance);
        self
    }

    /// Sets the guidance interval used by `flux-pro`, 1 to 4.
    pub fn interval(mut self, interval: u32) -> Self {
        self.config.interval = Some(interval);
        self
    }

    /// Requests less processed output from the ultra model.
    pub fn raw(mut self, raw: bool) -> Self {
        self.config.raw = Some(raw);
        self
    }

    /// Sets the format of the returned image.
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = Some(format);
        self
    }

    /// Sets the image prompt weight for the ultra model, 0 to 1.
    pub fn image_prompt_strength(mut self, strength: f64) -> Self {
        self.config.image_prompt_strength = strength;
        self
    }

    /// Sets the delay between status polls.
    pub fn sleep_interval(mut self, interval: Duration) -> Self {
        self.config.sleep_interval = interval;
        self
    }

    /// Bounds the total polling time. Without it, polling continues until
    /// the job is ready.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the configuration and builds the driver.
    pub fn build(self) -> Result<BlackForestDriver> {
        self.config.validate()?;

        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                FluxGenError::invalid("api_key", "BFL_API_KEY not set and no API key provided")
            })?;

        Ok(BlackForestDriver {
            client: self.client.unwrap_or_default(),
            api_key,
            config: self.config,
        })
    }
}

/// Flux image generation driver.
///
/// Each call submits one job, polls until it is ready and downloads the
/// result. Requests within a call are sequential.
#[derive(Clone)]
pub struct BlackForestDriver {
    client: reqwest::Client,
    api_key: String,
    config: DriverConfig,
}

impl std::fmt::Debug for BlackForestDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlackForestDriver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BlackForestDriver {
    /// Returns a builder with default settings.
    pub fn builder() -> BlackForestDriverBuilder {
        BlackForestDriverBuilder::new()
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Returns the capability entry of the configured model.
    pub fn capabilities(&self) -> ModelCapabilities {
        self.config.model.capabilities()
    }

    /// Builds the request body for `request` without sending it.
    pub fn payload(&self, prompts: &[String], request: PayloadRequest) -> Result<FluxPayload> {
        FluxPayload::build(&self.config, payload::join_prompts(prompts), request)
    }

    async fn run(&self, prompts: &[String], request: PayloadRequest) -> Result<ImageArtifact> {
        let start = Instant::now();
        let operation = request.operation();
        let body = self.payload(prompts, request)?;

        let job_id = self.submit(operation, &body).await?;
        tracing::debug!(job_id = %job_id, %operation, "submitted generation request");

        let result = self.poll_until_ready(&job_id).await?;
        tracing::debug!(url = %result.sample, "generation complete");

        let data = self.download(&result.sample).await?;

        let format = self
            .config
            .output_format
            .map(ImageFormat::from)
            .unwrap_or_default();

        Ok(
            ImageArtifact::new(data, format, self.config.width, self.config.height).with_metadata(
                GenerationMetadata {
                    model: Some(self.config.model.as_str().to_string()),
                    job_id: Some(job_id),
                    seed: result.seed,
                    duration_ms: Some(start.elapsed().as_millis() as u64),
                },
            ),
        )
    }

    async fn submit(&self, operation: Operation, body: &FluxPayload) -> Result<String> {
        let url = self.config.url(&self.config.model.endpoint(operation));

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .header("x-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FluxGenError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let submit: SubmitResponse = response.json().await?;
        submit
            .id
            .ok_or_else(|| FluxGenError::UnexpectedResponse("submit response has no `id`".into()))
    }

    async fn poll_until_ready(&self, job_id: &str) -> Result<FluxResult> {
        let url = self.config.url("get_result");
        let start = Instant::now();

        loop {
            let response = self
                .client
                .get(&url)
                .query(&[("id", job_id)])
                .header("accept", "application/json")
                .header("x-key", &self.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(FluxGenError::Api {
                    status: status.as_u16(),
                    message: text,
                });
            }

            let text = response.text().await?;
            let poll: PollResponse = serde_json::from_str(&text)?;
            tracing::debug!(job_id, status = %poll.status, "polled job");

            match poll.status.as_str() {
                "Ready" => return poll.sample_result(job_id),
                "Content Moderated" | "Request Moderated" => {
                    return Err(FluxGenError::ContentModerated(poll.status.clone()));
                }
                "Error" | "Failed" | "Task not found" => {
                    return Err(FluxGenError::JobFailed {
                        id: job_id.to_string(),
                        status: poll.status.clone(),
                        message: poll.error_message(),
                    });
                }
                _ => {}
            }

            if let Some(timeout) = self.config.timeout {
                match start.elapsed().checked_add(self.config.sleep_interval) {
                    Some(next) if next <= timeout => {}
                    _ => return Err(FluxGenError::Timeout(timeout)),
                }
            }
            tokio::time::sleep(self.config.sleep_interval).await;
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FluxGenError::Api {
                status: status.as_u16(),
                message: format!("failed to download image from {url}"),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageGenerationDriver for BlackForestDriver {
    fn model(&self) -> &str {
        self.config.model.as_str()
    }

    async fn try_text_to_image(
        &self,
        prompts: &[String],
        _negative_prompts: Option<&[String]>,
    ) -> Result<ImageArtifact> {
        self.run(prompts, PayloadRequest::TextToImage).await
    }

    async fn try_image_variation(
        &self,
        prompts: &[String],
        image: &dyn ImageInput,
        _negative_prompts: Option<&[String]>,
    ) -> Result<ImageArtifact> {
        if !self.capabilities().supports(Operation::Variation) {
            return Err(self.unsupported(Operation::Variation));
        }
        let image = encode_checked("image", image)?;
        self.run(prompts, PayloadRequest::Variation { image }).await
    }

    async fn try_image_inpainting(
        &self,
        prompts: &[String],
        image: &dyn ImageInput,
        mask: &dyn ImageInput,
        _negative_prompts: Option<&[String]>,
    ) -> Result<ImageArtifact> {
        if !self.capabilities().supports(Operation::Inpainting) {
            return Err(self.unsupported(Operation::Inpainting));
        }
        let image = encode_checked("image", image)?;
        let mask = encode_checked("mask", mask)?;
        self.run(prompts, PayloadRequest::Inpainting { image, mask })
            .await
    }

    async fn try_image_outpainting(
        &self,
        prompts: &[String],
        image: &dyn ImageInput,
        mask: &dyn ImageInput,
        _negative_prompts: Option<&[String]>,
    ) -> Result<ImageArtifact> {
        if !self.capabilities().supports(Operation::Outpainting) {
            return Err(self.unsupported(Operation::Outpainting));
        }
        let image = encode_checked("image", image)?;
        let mask = encode_checked("mask", mask)?;
        self.run(prompts, PayloadRequest::Outpainting { image, mask })
            .await
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    status: String,
    // Shape varies by status; only a ready job carries a sample.
    #[serde(default)]
    result: Option<serde_json::Value>,
}

impl PollResponse {
    fn sample_result(&self, job_id: &str) -> Result<FluxResult> {
        let missing = || {
            FluxGenError::UnexpectedResponse(format!(
                "job {job_id} is ready but has no `result.sample`"
            ))
        };
        let result = self.result.as_ref().ok_or_else(missing)?;
        FluxResult::deserialize(result).map_err(|_| missing())
    }

    fn error_message(&self) -> Option<String> {
        match self.result.as_ref()? {
            serde_json::Value::String(message) => Some(message.clone()),
            serde_json::Value::Object(fields) => fields
                .get("error")
                .or_else(|| fields.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FluxResult {
    sample: String,
    #[serde(default)]
    seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::image::encoding::EncodedImage;

    fn prompts() -> Vec<String> {
        vec!["a dog".to_string(), "on a skateboard".to_string()]
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let driver = BlackForestDriver::builder()
            .api_key("test-key")
            .model(FluxModel::FluxDev)
            .size(512, 512)
            .steps(28)
            .build()
            .unwrap();
        assert_eq!(driver.config().model, FluxModel::FluxDev);
        assert_eq!(driver.config().width, 512);
        assert_eq!(driver.config().steps, Some(28));
        assert_eq!(driver.model(), "flux-dev");
    }

    #[test]
    fn test_builder_defaults() {
        let driver = BlackForestDriver::builder().api_key("k").build().unwrap();
        let config = driver.config();
        assert_eq!(config.model, FluxModel::FluxPro11);
        assert_eq!(config.base_url, "https://api.bfl.ml");
        assert_eq!(config.sleep_interval, Duration::from_millis(500));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let err = BlackForestDriver::builder()
            .api_key("k")
            .width(1000)
            .build()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.field(), Some("width"));

        let err = BlackForestDriver::builder()
            .api_key("k")
            .guidance_canny(0.5)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("guidance_canny"));
    }

    #[test]
    fn test_builder_missing_api_key() {
        std::env::remove_var(API_KEY_ENV);

        let err = BlackForestDriver::builder().build().unwrap_err();
        assert_eq!(err.field(), Some("api_key"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let driver = BlackForestDriver::builder()
            .api_key("super-secret")
            .build()
            .unwrap();
        assert!(!format!("{driver:?}").contains("super-secret"));
    }

    #[test]
    fn test_payload_preview() {
        let driver = BlackForestDriver::builder()
            .api_key("k")
            .size(1024, 768)
            .build()
            .unwrap();
        let payload = driver
            .payload(&prompts(), PayloadRequest::TextToImage)
            .unwrap();
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            serde_json::json!({"prompt": "a dog on a skateboard", "width": 1024, "height": 768})
        );
    }

    #[tokio::test]
    async fn test_unsupported_operations_fail_without_network() {
        // Unroutable base URL: any request would surface as a network error.
        let driver = BlackForestDriver::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:9")
            .model(FluxModel::FluxPro11)
            .build()
            .unwrap();
        let image = EncodedImage::new("dGVzdA==");

        let err = driver
            .try_image_inpainting(&prompts(), &image, &image, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FluxGenError::Unsupported {
                operation: Operation::Inpainting,
                ..
            }
        ));

        let canny = BlackForestDriver::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:9")
            .model(FluxModel::FluxPro10Canny)
            .build()
            .unwrap();
        let err = canny.try_text_to_image(&prompts(), None).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Unsupported);
    }

    #[tokio::test]
    async fn test_invalid_base64_fails_before_request() {
        let driver = BlackForestDriver::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:9")
            .model(FluxModel::FluxPro10)
            .build()
            .unwrap();

        let err = driver
            .try_image_outpainting(
                &prompts(),
                &EncodedImage::new("dGVzdA=="),
                &EncodedImage::new("abc"),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Encoding);
    }

    #[test]
    fn test_poll_response_deserialization() {
        let json = r#"{"id": "abc", "status": "Ready", "result": {"sample": "https://example.com/a.jpg", "seed": 9, "prompt": "x"}}"#;
        let poll: PollResponse = serde_json::from_str(json).unwrap();
        assert_eq!(poll.status, "Ready");
        let result = poll.sample_result("abc").unwrap();
        assert_eq!(result.sample, "https://example.com/a.jpg");
        assert_eq!(result.seed, Some(9));

        let pending: PollResponse =
            serde_json::from_str(r#"{"id": "abc", "status": "Pending", "result": null}"#).unwrap();
        assert!(pending.result.is_none());
    }

    #[test]
    fn test_poll_response_with_object_result_before_ready() {
        let pending: PollResponse =
            serde_json::from_str(r#"{"id": "abc", "status": "Pending", "result": {}}"#).unwrap();
        assert_eq!(pending.status, "Pending");
        assert_eq!(pending.error_message(), None);

        let failed: PollResponse = serde_json::from_str(
            r#"{"id": "abc", "status": "Error", "result": {"error": "worker crashed"}}"#,
        )
        .unwrap();
        assert_eq!(failed.error_message().as_deref(), Some("worker crashed"));

        let missing_result: PollResponse =
            serde_json::from_str(r#"{"id": "abc", "status": "Ready"}"#).unwrap();
        assert!(matches!(
            missing_result.sample_result("abc"),
            Err(FluxGenError::UnexpectedResponse(_))
        ));

        let no_sample: PollResponse =
            serde_json::from_str(r#"{"id": "abc", "status": "Ready", "result": {}}"#).unwrap();
        assert!(matches!(
            no_sample.sample_result("abc"),
            Err(FluxGenError::UnexpectedResponse(_))
        ));
    }
}
