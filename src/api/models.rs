//! API request and response models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::provider::ChatMessage;

/// Inline image payload for script generation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImagePayload {
    /// MIME type, e.g. `image/png`
    pub media_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

/// App-script generation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScriptGenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Preferred provider identifier; unrecognized values fall back to the
    /// standard cascade
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub image: Option<ImagePayload>,
    /// Caller identity for credit metering
    #[serde(default)]
    pub user: Option<String>,
}

/// Curriculum generation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurriculumGenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// Successful generation response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationResponse {
    pub success: bool,
    pub content: String,
    pub credits_used: u32,
    /// Channel that produced the completion
    pub provider: String,
    pub model: String,
    pub created: i64,
}

/// Failure response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Provider catalogue entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderInfo {
    pub id: String,
    pub endpoint: String,
    /// Whether a credential was present at startup
    pub configured: bool,
    pub credit_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
}

/// Credit balance response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub user: String,
    pub balance: i64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub providers_configured: usize,
    pub timestamp: i64,
}
