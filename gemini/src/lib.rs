//! Minimal Google Gemini API client.
//!
//! This crate provides a focused client for the parts of the Gemini REST API
//! a story game needs:
//! - `generateContent` with optional JSON-schema constrained output
//! - Imagen `predict` for single-image generation

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

/// Errors that can occur when using the Gemini client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Response contained no output: {0}")]
    EmptyResponse(String),
}

/// Gemini API client.
#[derive(Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: String,
    model: String,
    image_model: String,
    base_url: String,
}

impl Gemini {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Create a Gemini client from the GEMINI_API_KEY environment variable.
    ///
    /// Falls back to API_KEY, which is what hosted deployments usually set.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| Error::NoApiKey)?;
        if api_key.trim().is_empty() {
            return Err(Error::NoApiKey);
        }
        Ok(Self::new(api_key))
    }

    /// Set the default text model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the default image model for this client.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Point the client at a different API root (e.g. a local gateway).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The default text model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The default image model.
    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    /// Send a `generateContent` request and return the full response.
    pub async fn generate_content(&self, request: Request) -> Result<Response, Error> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        let api_request = build_api_request(&request);
        let url = format!("{}/models/{model}:generateContent", self.base_url);

        tracing::debug!(%model, "gemini generateContent");
        let api_response: ApiResponse = self.post(&url, &api_request).await?;

        parse_response(api_response)
    }

    /// Generate images with an Imagen model.
    pub async fn generate_images(&self, request: ImageRequest) -> Result<Vec<GeneratedImage>, Error> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.image_model.clone());
        let api_request = build_image_request(&request);
        let url = format!("{}/models/{model}:predict", self.base_url);

        tracing::debug!(%model, aspect_ratio = request.aspect_ratio.as_str(), "imagen predict");
        let api_response: ApiImageResponse = self.post(&url, &api_request).await?;

        let images: Vec<GeneratedImage> = api_response
            .predictions
            .into_iter()
            .filter_map(|p| {
                p.bytes_base64_encoded.map(|bytes| GeneratedImage {
                    mime_type: p.mime_type.unwrap_or_else(|| request.mime_type.clone()),
                    bytes_base64: bytes,
                })
            })
            .collect();

        if images.is_empty() {
            return Err(Error::EmptyResponse("no images were generated".to_string()));
        }
        Ok(images)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T, Error> {
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: extract_error_message(&body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A `generateContent` request.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub system: Option<String>,
    pub contents: Vec<Content>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub response_mime_type: Option<String>,
    pub response_schema: Option<serde_json::Value>,
}

impl Request {
    /// Create a new request with the given conversation contents.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            model: None,
            system: None,
            contents,
            temperature: None,
            max_output_tokens: None,
            response_mime_type: None,
            response_schema: None,
        }
    }

    /// Create a single-turn request from one user prompt.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(vec![Content::user(text)])
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Constrain the output to JSON matching `schema` (OpenAPI subset, upper-case type names).
    pub fn with_json_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_mime_type = Some("application/json".to_string());
        self.response_schema = Some(schema);
        self
    }
}

/// One turn of conversation.
#[derive(Debug, Clone)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a user turn with text content.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Create a model turn with text content.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// The role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// A text part of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub text: String,
}

/// A `generateContent` response (first candidate only).
#[derive(Debug, Clone)]
pub struct Response {
    pub model_version: Option<String>,
    pub parts: Vec<Part>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl Response {
    /// Get all text content concatenated.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Parse the (trimmed) text output as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let text = self.text();
        serde_json::from_str(text.trim()).map_err(|e| Error::Parse(format!("{e}: {text}")))
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Other,
}

impl FinishReason {
    fn parse(s: Option<&str>) -> Self {
        match s {
            Some("STOP") | None => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::MaxTokens,
            Some("SAFETY") => FinishReason::Safety,
            Some("RECITATION") => FinishReason::Recitation,
            Some(_) => FinishReason::Other,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub output_tokens: usize,
}

/// Aspect ratios supported by Imagen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    Square,
    /// 3:4, used for standing character portraits.
    Portrait,
    /// 4:3
    Landscape,
    /// 9:16
    Tall,
    /// 16:9, used for scene backgrounds.
    Wide,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Tall => "9:16",
            AspectRatio::Wide => "16:9",
        }
    }
}

/// An Imagen request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: Option<String>,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub mime_type: String,
    pub number_of_images: u32,
}

impl ImageRequest {
    /// A single JPEG image for `prompt`.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::Square,
            mime_type: "image/jpeg".to_string(),
            number_of_images: 1,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_number_of_images(mut self, n: u32) -> Self {
        self.number_of_images = n.max(1);
        self
    }
}

/// A generated image, still base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes_base64: String,
}

impl GeneratedImage {
    /// Render the image as a `data:` URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.bytes_base64)
    }
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    usage_metadata: Option<ApiUsage>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    prompt_feedback: Option<ApiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiImageRequest {
    instances: Vec<ApiImageInstance>,
    parameters: ApiImageParameters,
}

#[derive(Debug, Serialize)]
struct ApiImageInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiImageParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_options: ApiOutputOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiOutputOptions {
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct ApiImageResponse {
    #[serde(default)]
    predictions: Vec<ApiPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPrediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn build_api_request(request: &Request) -> ApiRequest {
    let contents = request
        .contents
        .iter()
        .map(|c| ApiContent {
            role: Some(c.role.as_str().to_string()),
            parts: c
                .parts
                .iter()
                .map(|p| ApiPart {
                    text: Some(p.text.clone()),
                })
                .collect(),
        })
        .collect();

    let system_instruction = request.system.as_ref().map(|s| ApiContent {
        role: None,
        parts: vec![ApiPart {
            text: Some(s.clone()),
        }],
    });

    let generation_config = if request.temperature.is_some()
        || request.max_output_tokens.is_some()
        || request.response_mime_type.is_some()
        || request.response_schema.is_some()
    {
        Some(ApiGenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
            response_mime_type: request.response_mime_type.clone(),
            response_schema: request.response_schema.clone(),
        })
    } else {
        None
    };

    ApiRequest {
        contents,
        system_instruction,
        generation_config,
    }
}

fn build_image_request(request: &ImageRequest) -> ApiImageRequest {
    ApiImageRequest {
        instances: vec![ApiImageInstance {
            prompt: request.prompt.clone(),
        }],
        parameters: ApiImageParameters {
            sample_count: request.number_of_images,
            aspect_ratio: request.aspect_ratio.as_str().to_string(),
            output_options: ApiOutputOptions {
                mime_type: request.mime_type.clone(),
            },
        },
    }
}

fn parse_response(api_response: ApiResponse) -> Result<Response, Error> {
    let Some(candidate) = api_response.candidates.into_iter().next() else {
        let reason = api_response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(Error::EmptyResponse(reason));
    };

    let parts: Vec<Part> = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text.map(|text| Part { text }))
        .collect();

    let usage = api_response
        .usage_metadata
        .map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(Response {
        model_version: api_response.model_version,
        parts,
        finish_reason: FinishReason::parse(candidate.finish_reason.as_deref()),
        usage,
    })
}

/// Pull `error.message` out of a Google error body, or return the body as-is.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = Gemini::new("test-key");
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.image_model(), DEFAULT_IMAGE_MODEL);
    }

    #[test]
    fn test_client_with_models() {
        let client = Gemini::new("test-key")
            .with_model("gemini-2.5-pro")
            .with_image_model("imagen-4.0-generate-001")
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(client.model(), "gemini-2.5-pro");
        assert_eq!(client.image_model(), "imagen-4.0-generate-001");
        assert_eq!(client.base_url, "http://localhost:8080/v1beta");
    }

    #[test]
    fn test_request_builder() {
        let request = Request::prompt("Hello")
            .with_system("You are a storyteller")
            .with_temperature(0.9)
            .with_max_output_tokens(2048)
            .with_json_schema(json!({"type": "OBJECT"}));

        assert_eq!(request.contents.len(), 1);
        assert!(request.system.is_some());
        assert_eq!(request.temperature, Some(0.9));
        assert_eq!(request.max_output_tokens, Some(2048));
        assert_eq!(request.response_mime_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_api_request_shape() {
        let request = Request::new(vec![Content::user("Hi"), Content::model("Hello")])
            .with_system("sys")
            .with_json_schema(json!({"type": "OBJECT"}));

        let value = serde_json::to_value(build_api_request(&request)).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Hi");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_plain_request_has_no_generation_config() {
        let value = serde_json::to_value(build_api_request(&Request::prompt("Hi"))).unwrap();
        assert!(value.get("generationConfig").is_none());
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_image_request_shape() {
        let request = ImageRequest::new("a classroom at sunset")
            .with_aspect_ratio(AspectRatio::Wide);
        let value = serde_json::to_value(build_image_request(&request)).unwrap();
        assert_eq!(value["instances"][0]["prompt"], "a classroom at sunset");
        assert_eq!(value["parameters"]["sampleCount"], 1);
        assert_eq!(value["parameters"]["aspectRatio"], "16:9");
        assert_eq!(value["parameters"]["outputOptions"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn test_parse_response() {
        let api: ApiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": " 1}\n"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5, "totalTokenCount": 17},
            "modelVersion": "gemini-2.5-flash"
        }))
        .unwrap();

        let response = parse_response(api).unwrap();
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.prompt_tokens, 12);
        assert_eq!(response.usage.output_tokens, 5);

        let parsed: serde_json::Value = response.json().unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn test_blocked_prompt_is_empty_response() {
        let api: ApiResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        match parse_response(api) {
            Err(Error::EmptyResponse(reason)) => assert_eq!(reason, "SAFETY"),
            other => panic!("expected EmptyResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_finish_reason_parse() {
        assert_eq!(FinishReason::parse(Some("MAX_TOKENS")), FinishReason::MaxTokens);
        assert_eq!(FinishReason::parse(Some("SAFETY")), FinishReason::Safety);
        assert_eq!(FinishReason::parse(Some("BLOCKLIST")), FinishReason::Other);
        assert_eq!(FinishReason::parse(None), FinishReason::Stop);
    }

    #[test]
    fn test_data_url() {
        let image = GeneratedImage {
            mime_type: "image/jpeg".to_string(),
            bytes_base64: "AAAA".to_string(),
        };
        assert_eq!(image.data_url(), "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(extract_error_message(body), "API key not valid");
        assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
    }
}
