//! Pluggable model validation for axum services.
//!
//! Validators are registered per model type at startup, resolved by the
//! dispatch service, and run automatically over handler arguments through the
//! [`validation::Validated`] extractor.

pub mod common;
pub mod logging_middleware;
pub mod samples;
pub mod validation;

use axum::{extract::Extension, middleware, Router};
use std::sync::Arc;

use common::{ApiError, AppState};

/// Composes the application router with the layers model validation needs
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(samples::samples_routes())
        .fallback(|| async { ApiError::NotFound("route not found".to_string()) })
        .layer(middleware::from_fn(
            logging_middleware::log_validation_rejections,
        ))
        .layer(Extension(state.validation_filter.clone()))
        .layer(Extension(state))
}
