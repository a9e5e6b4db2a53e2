//! Main entry point for the EduGen Gateway

use edugen_gateway::{
    api,
    config::Settings,
    generation::{GenerationService, InMemoryCreditLedger},
    provider::{HttpTransport, ProviderRegistry},
    AppState,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    if settings.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    info!("Starting EduGen Gateway");

    // Resolve the provider catalogue once; credential presence is fixed
    // for the process lifetime
    let registry = Arc::new(ProviderRegistry::from_settings(&settings));
    info!(
        configured = registry.configured_count(),
        "Provider registry initialized"
    );

    let ledger = Arc::new(InMemoryCreditLedger::new(settings.credits.starting_balance));

    let transport = Arc::new(HttpTransport::new(
        settings.generation.timeout_ms,
        &settings.generation.attribution,
    )?);

    let generator = Arc::new(GenerationService::new(
        registry.clone(),
        ledger.clone(),
        transport,
        settings.generation.default_model.clone(),
        settings.generation.fallback_model.clone(),
    ));

    let settings = Arc::new(settings);
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        registry,
        ledger,
        generator,
    });

    let app = api::routes::create_router(app_state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
