//! OpenAI-compatible wire types and the per-attempt HTTP transport

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::config::AttributionConfig;
use crate::error::{AppError, Result};
use crate::provider::registry::ProviderEntry;

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(content: String) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(content),
        }
    }

    pub fn user(content: MessageContent) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// Message content: a plain string, or ordered multimodal parts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One part of a multimodal user message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageUrl {
    pub url: String,
}

/// Chat completion request (OpenAI compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message in a completion response; content is always a string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Assert the reply carries a completion at the expected location and
/// extract it. A missing or empty first-choice content is a format error,
/// distinct in kind from transport failures.
pub fn extract_completion(response: &ChatCompletionResponse) -> Result<String> {
    let content = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .unwrap_or("");

    if content.is_empty() {
        return Err(AppError::MalformedResponse(
            "response has no first-choice message content".to_string(),
        ));
    }

    Ok(content.to_string())
}

/// Single-attempt dispatch to a provider endpoint
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Send one chat completion request. One network call, no retries.
    async fn complete(
        &self,
        entry: &ProviderEntry,
        credential: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;
}

/// reqwest-backed transport shared by all providers
pub struct HttpTransport {
    client: Client,
    referer: HeaderValue,
    title: HeaderValue,
}

impl HttpTransport {
    pub fn new(timeout_ms: u64, attribution: &AttributionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let referer = HeaderValue::from_str(&attribution.referer)
            .map_err(|e| AppError::Internal(format!("Invalid attribution referer: {}", e)))?;
        let title = HeaderValue::from_str(&attribution.title)
            .map_err(|e| AppError::Internal(format!("Invalid attribution title: {}", e)))?;

        Ok(Self {
            client,
            referer,
            title,
        })
    }

    fn headers(&self, credential: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let bearer = HeaderValue::from_str(&format!("Bearer {}", credential))
            .map_err(|e| AppError::Internal(format!("Invalid credential header: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);

        // Product-attribution headers (OpenRouter convention, harmless elsewhere)
        headers.insert(HeaderName::from_static("http-referer"), self.referer.clone());
        headers.insert(HeaderName::from_static("x-title"), self.title.clone());

        Ok(headers)
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn complete(
        &self,
        entry: &ProviderEntry,
        credential: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        let url = format!("{}/chat/completions", entry.endpoint.trim_end_matches('/'));

        debug!(provider = %entry.id, model = %request.model, "Dispatching completion request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers(credential)?)
            .json(request)
            .send()
            .await
            .map_err(AppError::HttpClient)?;

        if response.status().is_success() {
            response.json::<ChatCompletionResponse>().await.map_err(|e| {
                error!(provider = %entry.id, error = %e, "Failed to parse completion response");
                AppError::MalformedResponse(format!("Failed to parse response: {}", e))
            })
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AppError::ProviderError(format!(
                "{} returned {}: {}",
                entry.id, status, body
            )))
        }
    }
}
