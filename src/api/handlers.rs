//! HTTP request handlers

use axum::extract::{Path, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::models::{
    BalanceResponse, CurriculumGenerationRequest, ErrorResponse, GenerationResponse,
    HealthResponse, ImagePayload, ProviderInfo, ProvidersResponse, ScriptGenerationRequest,
};
use crate::error::AppError;
use crate::generation::{CreditLedger, GenerationRequest, ImageAttachment, TaskKind};
use crate::AppState;

fn caller_identity(user: Option<String>) -> String {
    user.filter(|u| !u.is_empty())
        .unwrap_or_else(|| "anonymous".to_string())
}

fn validate_image(payload: &ImagePayload) -> Result<ImageAttachment, AppError> {
    if payload.media_type.is_empty() || !payload.media_type.starts_with("image/") {
        return Err(AppError::InvalidRequest(format!(
            "Unsupported image media type: '{}'",
            payload.media_type
        )));
    }

    BASE64
        .decode(&payload.data)
        .map_err(|e| AppError::InvalidRequest(format!("Image payload is not valid base64: {}", e)))?;

    Ok(ImageAttachment {
        media_type: payload.media_type.clone(),
        data: payload.data.clone(),
    })
}

fn success_response(outcome: crate::generation::GenerationOutcome) -> GenerationResponse {
    GenerationResponse {
        success: true,
        content: outcome.content,
        credits_used: outcome.credits_used,
        provider: outcome.provider.to_string(),
        model: outcome.model,
        created: Utc::now().timestamp(),
    }
}

/// Generate an app script
#[utoipa::path(
    post,
    path = "/v1/generate/script",
    request_body = ScriptGenerationRequest,
    responses(
        (status = 200, description = "Script generated", body = GenerationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 402, description = "Insufficient credits", body = ErrorResponse),
        (status = 502, description = "All providers exhausted", body = ErrorResponse),
    ),
    tag = "Generation"
)]
pub async fn generate_script(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScriptGenerationRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::InvalidRequest("Prompt cannot be empty".to_string()));
    }

    let request_id = Uuid::new_v4();
    info!(
        request_id = %request_id,
        provider = request.provider.as_deref().unwrap_or("-"),
        has_image = request.image.is_some(),
        "Received script generation request"
    );

    let image = request.image.as_ref().map(validate_image).transpose()?;

    let generation = GenerationRequest {
        task: TaskKind::Script,
        prompt: request.prompt,
        history: request.history,
        provider: request.provider,
        model: request.model,
        image,
        user: caller_identity(request.user),
    };

    let outcome = state.generator.generate(generation).await?;

    info!(
        request_id = %request_id,
        provider = %outcome.provider,
        credits_used = outcome.credits_used,
        "Script generation completed"
    );

    Ok(Json(success_response(outcome)))
}

/// Generate a curriculum
#[utoipa::path(
    post,
    path = "/v1/generate/curriculum",
    request_body = CurriculumGenerationRequest,
    responses(
        (status = 200, description = "Curriculum generated", body = GenerationResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 402, description = "Insufficient credits", body = ErrorResponse),
        (status = 502, description = "All providers exhausted", body = ErrorResponse),
    ),
    tag = "Generation"
)]
pub async fn generate_curriculum(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CurriculumGenerationRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::InvalidRequest("Prompt cannot be empty".to_string()));
    }

    let request_id = Uuid::new_v4();
    info!(
        request_id = %request_id,
        provider = request.provider.as_deref().unwrap_or("-"),
        "Received curriculum generation request"
    );

    let generation = GenerationRequest {
        task: TaskKind::Curriculum,
        prompt: request.prompt,
        history: request.history,
        provider: request.provider,
        model: request.model,
        image: None,
        user: caller_identity(request.user),
    };

    let outcome = state.generator.generate(generation).await?;

    info!(
        request_id = %request_id,
        provider = %outcome.provider,
        credits_used = outcome.credits_used,
        "Curriculum generation completed"
    );

    Ok(Json(success_response(outcome)))
}

/// List the provider catalogue with credential presence
#[utoipa::path(
    get,
    path = "/v1/providers",
    responses(
        (status = 200, description = "Provider catalogue", body = ProvidersResponse),
    ),
    tag = "Providers"
)]
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProvidersResponse>, AppError> {
    let providers = state
        .registry
        .entries()
        .iter()
        .map(|entry| ProviderInfo {
            id: entry.id.to_string(),
            endpoint: entry.endpoint.clone(),
            configured: entry.has_credential(),
            credit_cost: entry.id.credit_cost(),
        })
        .collect();

    Ok(Json(ProvidersResponse { providers }))
}

/// Current credit balance for a user
#[utoipa::path(
    get,
    path = "/v1/credits/{user}",
    params(("user" = String, Path, description = "Caller identity")),
    responses(
        (status = 200, description = "Credit balance", body = BalanceResponse),
    ),
    tag = "Credits"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    // Users unseen by the ledger still hold the starting balance
    let balance = state
        .ledger
        .balance(&user)
        .await
        .unwrap_or(state.settings.credits.starting_balance);

    Ok(Json(BalanceResponse { user, balance }))
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Gateway is healthy", body = HealthResponse),
    ),
    tag = "Health"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, AppError> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers_configured: state.registry.configured_count(),
        timestamp: Utc::now().timestamp(),
    }))
}
