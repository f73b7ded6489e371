//! Gemini REST providers for embedding and generation.
//!
//! Both providers call the Generative Language API directly over
//! `reqwest`. Failures are reported as [`ProviderError`] with rate
//! limiting classified separately, so the pipeline can pick the right
//! fallback message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{AssistantError, ProviderError, Result};
use crate::generation::{GenerationProvider, GenerationRequest};
use crate::text::truncate_text;

/// Base URL of the Generative Language API.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Default output dimensionality for the embedding model.
const DEFAULT_DIMENSIONS: usize = 1536;

/// Default generation model.
const DEFAULT_GENERATION_MODEL: &str = "gemini-2.0-flash";

/// Cap on the serialized-response fallback when no extraction strategy
/// matches.
const RAW_DUMP_CHARS: usize = 2000;

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
    task_type: &'a str,
    output_dimensionality: usize,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Read the provider's error message out of a failure body, falling
/// back to the raw body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ApiErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

// ── Embedding provider ─────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the Gemini `embedContent` endpoint.
///
/// Defaults to `text-embedding-004` with an output dimensionality of
/// 1536 and the `RETRIEVAL_DOCUMENT` task type.
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    task_type: String,
    dimensions: usize,
    base_url: String,
}

impl GeminiEmbeddingProvider {
    /// Create a new provider with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AssistantError::Config("Gemini API key must not be empty".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            task_type: "RETRIEVAL_DOCUMENT".to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Create a new provider from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            AssistantError::Config("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Set the embedding model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the task type (`RETRIEVAL_DOCUMENT`, `RETRIEVAL_QUERY`, ...).
    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    /// Set the output dimensionality (1024 or 1536 for the default model).
    ///
    /// All documents and query-time embeddings in one deployment must
    /// use the same value.
    pub fn with_output_dimensionality(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        debug!(model = %self.model, text_len = text.len(), "embedding text");

        let request = EmbedContentRequest {
            content: Content { role: None, parts: vec![Part { text }] },
            task_type: &self.task_type,
            output_dimensionality: self.dimensions,
        };

        let url = format!("{}/models/{}:embedContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "embedding request failed");
                ProviderError::Unavailable(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(model = %self.model, status, "embedding API error");
            return Err(ProviderError::classify(Some(status), detail));
        }

        let parsed: EmbedContentResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse embedding response");
            ProviderError::Unavailable(format!("malformed response: {e}"))
        })?;

        if parsed.embedding.values.is_empty() {
            return Err(ProviderError::Unavailable("empty embedding returned".to_string()));
        }

        Ok(parsed.embedding.values)
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Generation provider ────────────────────────────────────────────

/// A [`GenerationProvider`] backed by the Gemini `generateContent`
/// endpoint, defaulting to `gemini-2.0-flash`.
pub struct GeminiGenerationProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerationProvider {
    /// Create a new provider with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AssistantError::Config("Gemini API key must not be empty".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_GENERATION_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Create a new provider from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            AssistantError::Config("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Set the generation model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl GenerationProvider for GeminiGenerationProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, ProviderError> {
        debug!(model = %self.model, "generating answer");

        let prompt = if request.contextual_prompt.is_empty() {
            format!("User Question: {}\n\nHotel Assistant Response:", request.question)
        } else {
            format!(
                "{}\n\nUser Question: {}\n\nHotel Assistant Response:",
                request.contextual_prompt, request.question
            )
        };

        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: &request.system_instruction }],
            },
            contents: vec![Content { role: Some("user"), parts: vec![Part { text: &prompt }] }],
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "generation request failed");
                ProviderError::Unavailable(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(model = %self.model, status, "generation API error");
            return Err(ProviderError::classify(Some(status), detail));
        }

        let value: Value = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse generation response");
            ProviderError::Unavailable(format!("malformed response: {e}"))
        })?;

        Ok(extract_response_text(&value))
    }
}

// ── Response-shape extraction ──────────────────────────────────────

/// Candidate-based shape: `candidates[0].content.parts[].text`.
fn extract_candidate_parts(value: &Value) -> Option<String> {
    let parts = value.get("candidates")?.get(0)?.get("content")?.get("parts")?.as_array()?;
    let text: String =
        parts.iter().filter_map(|p| p.get("text").and_then(Value::as_str)).collect();
    if text.is_empty() { None } else { Some(text) }
}

/// Flat shape: a top-level `text` string.
fn extract_flat_text(value: &Value) -> Option<String> {
    let text = value.get("text")?.as_str()?;
    if text.is_empty() { None } else { Some(text.to_string()) }
}

/// Wrapped shape: `response.text` or a plain string under `response`.
fn extract_wrapped_response(value: &Value) -> Option<String> {
    let response = value.get("response")?;
    let text = response.get("text").and_then(Value::as_str).or_else(|| response.as_str())?;
    if text.is_empty() { None } else { Some(text.to_string()) }
}

/// The ordered extraction strategies for provider response shapes.
const EXTRACTORS: &[fn(&Value) -> Option<String>] =
    &[extract_candidate_parts, extract_flat_text, extract_wrapped_response];

/// Extract the generated text from a provider response of unknown shape.
///
/// Tries each strategy in order; when none matches, falls back to a
/// bounded serialization of the raw value. Never fails.
pub(crate) fn extract_response_text(value: &Value) -> String {
    for extract in EXTRACTORS {
        if let Some(text) = extract(value) {
            return text;
        }
    }
    truncate_text(&value.to_string(), RAW_DUMP_CHARS)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_candidate_parts_shape() {
        let value = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Dire " }, { "text": "Hotel" } ] } }
            ]
        });
        assert_eq!(extract_response_text(&value), "Dire Hotel");
    }

    #[test]
    fn extracts_flat_text_shape() {
        let value = json!({ "text": "short answer" });
        assert_eq!(extract_response_text(&value), "short answer");
    }

    #[test]
    fn extracts_wrapped_response_shapes() {
        assert_eq!(
            extract_response_text(&json!({ "response": { "text": "wrapped" } })),
            "wrapped"
        );
        assert_eq!(extract_response_text(&json!({ "response": "plain" })), "plain");
    }

    #[test]
    fn candidate_shape_wins_over_flat_text() {
        let value = json!({
            "text": "ignored",
            "candidates": [ { "content": { "parts": [ { "text": "preferred" } ] } } ]
        });
        assert_eq!(extract_response_text(&value), "preferred");
    }

    #[test]
    fn unknown_shape_falls_back_to_bounded_dump() {
        let value = json!({ "unexpected": "x".repeat(5000) });
        let dumped = extract_response_text(&value);
        assert!(dumped.starts_with("{\"unexpected\""));
        assert!(dumped.chars().count() <= 2000);
    }

    #[test]
    fn empty_candidates_fall_through() {
        let value = json!({ "candidates": [], "text": "fallback" });
        assert_eq!(extract_response_text(&value), "fallback");
    }
}
