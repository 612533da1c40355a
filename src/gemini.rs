use crate::{config::AppConfig, models::LayoutRequest, prompt::build_prompt};
use async_trait::async_trait;
use base64::Engine;
use image::{GrayImage, ImageFormat, Luma};
use reqwest::Client;
use serde_json::{json, Value};
use std::{io::Cursor, sync::Arc};
use thiserror::Error;
use tracing::{info, error, warn};

/// Failures surfaced to callers of [`LayoutClient::generate_layout`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("API Rate Limit Exceeded. Please wait a moment and try again, or check your Google AI Studio plan and billing details.")]
    RateLimited,
    #[error("The AI model failed to generate a layout. This can happen due to high demand or complex requests. Please try again.")]
    GenerationFailed,
    #[error("An unknown error occurred while communicating with the Gemini API.")]
    Unknown,
}

/// Raw failure of the remote call, before classification.
#[derive(Debug, Error, Clone)]
pub enum BackendFailure {
    /// Transport errors, non-2xx responses and responses without an image.
    #[error("{0}")]
    Error(String),
    /// The remote answered with something that is not a response envelope at all.
    #[error("unexpected response: {0}")]
    Unshaped(Value),
}

/// Maps a raw failure onto the user-facing taxonomy.
///
/// Rate limiting is recognised by substring only, matching the error text of
/// the Generative Language API.
pub fn classify_failure(failure: &BackendFailure) -> LayoutError {
    match failure {
        BackendFailure::Error(msg) if msg.contains("RESOURCE_EXHAUSTED") || msg.contains("\"code\":429") => {
            LayoutError::RateLimited
        }
        BackendFailure::Error(_) => LayoutError::GenerationFailed,
        BackendFailure::Unshaped(_) => LayoutError::Unknown,
    }
}

/// Something that turns a prompt into one base64-encoded square PNG.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate_png(&self, prompt: &str) -> Result<String, BackendFailure>;
}

// Helper function to truncate base64 data in JSON for cleaner logging
fn truncate_base64_in_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "bytesBase64Encoded" {
                    if let Value::String(s) = val {
                        if s.len() > 100 && s.is_ascii() {
                            *val = Value::String(format!("{}...[truncated {} chars]", &s[..50], s.len() - 50));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

fn preview(data: &str) -> String {
    match data.char_indices().nth(50) {
        Some((cut, _)) => format!("{}...[{} chars total]", &data[..cut], data.len()),
        None => data.to_string(),
    }
}

/// Message for a non-2xx answer. JSON bodies are re-serialised compactly so
/// the status markers read the same regardless of the server's formatting.
fn http_error_message(status: u16, body: &str) -> String {
    let body = match serde_json::from_str::<Value>(body) {
        Ok(value) => value.to_string(),
        Err(_) => body.trim().to_string(),
    };
    format!("got status: {}. {}", status, body)
}

fn extract_first_image_b64(resp: &Value) -> Result<String, BackendFailure> {
    if !resp.is_object() {
        return Err(BackendFailure::Unshaped(resp.clone()));
    }
    let first = resp
        .get("predictions")
        .and_then(Value::as_array)
        .and_then(|predictions| predictions.first())
        .and_then(|prediction| prediction.get("bytesBase64Encoded"))
        .and_then(Value::as_str);
    match first {
        Some(data) => Ok(data.to_string()),
        None => {
            info!("⚠️ No image data found in API response");
            Err(BackendFailure::Error("no image returned in predictions (the prompt may have been filtered)".into()))
        }
    }
}

/// Imagen through the Generative Language REST API.
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self { client: Client::new(), api_key, base_url, model }
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "1:1",
                "outputOptions": { "mimeType": "image/png" }
            }
        })
    }
}

#[async_trait]
impl ImageBackend for GeminiBackend {
    async fn generate_png(&self, prompt: &str) -> Result<String, BackendFailure> {
        let url = format!("{}/models/{}:predict?key={}", self.base_url, self.model, self.api_key);
        info!("🔗 Making request to: {}", url.replace(&self.api_key, "***"));

        let response = self.client
            .post(&url)
            .json(&Self::request_body(prompt))
            .send()
            .await
            .map_err(|e| BackendFailure::Error(e.without_url().to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        let response_text = response.text().await
            .map_err(|e| BackendFailure::Error(e.without_url().to_string()))?;

        if !status.is_success() {
            error!("❌ API Error response: {}", response_text);
            return Err(BackendFailure::Error(http_error_message(status.as_u16(), &response_text)));
        }

        let parsed: Value = serde_json::from_str(&response_text)
            .map_err(|e| BackendFailure::Error(format!("parse error: {}", e)))?;

        let mut logged = parsed.clone();
        truncate_base64_in_json(&mut logged);
        info!("📥 Raw Imagen API response: {}", logged);

        extract_first_image_b64(&parsed)
    }
}

enum Mode {
    Mock { placeholder: String },
    Remote(Arc<dyn ImageBackend>),
}

/// Builds the prompt, calls the backend and maps the outcome.
///
/// No retry, timeout or in-flight guard lives here; callers serialise
/// requests themselves (see `session`).
pub struct LayoutClient {
    mode: Mode,
}

impl LayoutClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, image::ImageError> {
        match &config.api_key {
            Some(key) => Ok(Self::with_backend(Arc::new(GeminiBackend::new(
                key.clone(),
                config.api_base.clone(),
                config.model.clone(),
            )))),
            None => {
                warn!("API key not set. Using mock data.");
                Self::mock()
            }
        }
    }

    pub fn mock() -> Result<Self, image::ImageError> {
        Ok(Self { mode: Mode::Mock { placeholder: render_placeholder()? } })
    }

    pub fn with_backend(backend: Arc<dyn ImageBackend>) -> Self {
        Self { mode: Mode::Remote(backend) }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.mode, Mode::Mock { .. })
    }

    /// Returns a `data:image/png;base64,` URI for the requested floor plan.
    pub async fn generate_layout(&self, request: &LayoutRequest) -> Result<String, LayoutError> {
        let backend = match &self.mode {
            Mode::Mock { placeholder } => {
                info!("Using mock response as API key is not set.");
                return Ok(placeholder.clone());
            }
            Mode::Remote(backend) => backend,
        };

        let prompt = build_prompt(&request.vision, &request.specifications, &request.other_features);
        info!("🎯 Generating layout with prompt: {}", &prompt[..std::cmp::min(100, prompt.len())]);

        match backend.generate_png(&prompt).await {
            Ok(image_data) => {
                info!("✅ Successfully generated layout: {}", preview(&image_data));
                Ok(format!("data:image/png;base64,{}", image_data))
            }
            Err(failure) => {
                error!("❌ Error generating layout with Gemini: {}", failure);
                Err(classify_failure(&failure))
            }
        }
    }
}

const PLACEHOLDER_SIZE: u32 = 512;

fn fill_rect(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, Luma([0]));
        }
    }
}

/// Renders the fixed mock floor plan: outer walls with a front door gap, two
/// partitions with door gaps.
fn render_placeholder() -> Result<String, image::ImageError> {
    let mut img = GrayImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, Luma([255]));
    let (lo, hi, wall) = (48, PLACEHOLDER_SIZE - 48, 6);

    fill_rect(&mut img, lo, lo, hi, lo + wall);
    fill_rect(&mut img, lo, hi - wall, 360, hi);
    fill_rect(&mut img, 420, hi - wall, hi, hi);
    fill_rect(&mut img, lo, lo, lo + wall, hi);
    fill_rect(&mut img, hi - wall, lo, hi, hi);
    // Partitions, each with a door gap.
    fill_rect(&mut img, 256, lo, 256 + wall / 2, 180);
    fill_rect(&mut img, 256, 230, 256 + wall / 2, 300);
    fill_rect(&mut img, lo, 300, 140, 300 + wall / 2);
    fill_rect(&mut img, 190, 300, hi, 300 + wall / 2);

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png.into_inner());
    info!("📦 Rendered placeholder layout: {}", preview(&encoded));
    Ok(format!("data:image/png;base64,{}", encoded))
}
