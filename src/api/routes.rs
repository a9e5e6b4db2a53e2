//! HTTP route definitions

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::api::models::*;
use crate::provider::{ChatMessage, ContentPart, ImageUrl, MessageContent};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "EduGen Gateway API",
        version = "0.1.0",
        description = "Credit-metered AI generation gateway with provider fallback cascade.",
        license(name = "MIT"),
    ),
    paths(
        handlers::generate_script,
        handlers::generate_curriculum,
        handlers::list_providers,
        handlers::get_balance,
        handlers::health_check,
    ),
    components(schemas(
        ScriptGenerationRequest,
        CurriculumGenerationRequest,
        ImagePayload,
        GenerationResponse,
        ErrorResponse,
        ProviderInfo,
        ProvidersResponse,
        BalanceResponse,
        HealthResponse,
        ChatMessage,
        MessageContent,
        ContentPart,
        ImageUrl,
    )),
    tags(
        (name = "Generation", description = "Script and curriculum generation endpoints"),
        (name = "Providers", description = "Provider catalogue"),
        (name = "Credits", description = "Credit balance endpoints"),
        (name = "Health", description = "Health and monitoring endpoints"),
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    let api_routes = Router::new()
        .route("/generate/script", post(handlers::generate_script))
        .route("/generate/curriculum", post(handlers::generate_curriculum))
        .route("/providers", get(handlers::list_providers))
        .route("/credits/:user", get(handlers::get_balance));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/v1", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
