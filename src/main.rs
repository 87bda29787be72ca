//! Sample API host with automatic model validation enabled

use axum::http::HeaderValue;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use model_validation::common::{AppConfig, AppState};
use model_validation::samples;
use model_validation::validation::ValidatorCollection;

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = AppConfig::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        lifetime = ?config.validator_lifetime,
        automatic_validation = config.automatic_validation,
        "Configuration loaded"
    );

    // ========================================================================
    // VALIDATOR REGISTRATION
    // ========================================================================

    let mut validators = ValidatorCollection::new();
    validators.add_validators_from(samples::validator_module(), config.validator_lifetime);
    let registry = Arc::new(validators.build()?);
    info!(?registry, "Model validators ready");

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let bind_addr = config.bind_addr;
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let state = Arc::new(AppState::new(config, registry)?);

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = model_validation::app_router(state)
        .layer(CorsLayer::new().allow_origin(origins))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
