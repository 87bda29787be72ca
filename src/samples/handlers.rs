use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;
use tracing::info;

use super::models::{
    SampleCreateRequest, SampleLookupResponse, SampleReadRequest, SampleUpdateRequest,
};
use crate::common::{ApiError, AppState};
use crate::validation::Validated;

// ============================================================================
// Sample Handlers
// ============================================================================

/// POST /samples - Echo a create request once it passes model validation
pub async fn create_sample(
    Validated(Json(request)): Validated<Json<SampleCreateRequest>>,
) -> Json<SampleCreateRequest> {
    info!(name = %request.name, "Sample create request accepted");
    Json(request)
}

/// POST /samples/:id - Validates every bound argument; the path model has
/// no validator
pub async fn create_sample_with_id(
    Validated((Path(read), Json(request))): Validated<(
        Path<SampleReadRequest>,
        Json<SampleCreateRequest>,
    )>,
) -> Json<SampleLookupResponse> {
    Json(SampleLookupResponse {
        id: read.id,
        request,
    })
}

/// PUT /samples - Validates explicitly through the dispatch service
pub async fn update_sample(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<SampleUpdateRequest>,
) -> Result<Json<SampleUpdateRequest>, ApiError> {
    state.validator_service.validate_and_raise(&request)?;

    info!(id = %request.id, "Sample update request accepted");
    Ok(Json(request))
}
