use super::handlers;
use axum::{routing::post, Router};

/// Creates the samples router
pub fn samples_routes() -> Router {
    Router::new()
        .route(
            "/samples",
            post(handlers::create_sample).put(handlers::update_sample),
        )
        .route("/samples/:id", post(handlers::create_sample_with_id))
}
