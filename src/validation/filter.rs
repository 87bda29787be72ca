//! Per-request hook that runs model validation over bound arguments

use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{debug, info};

use super::registry::ValidatorRegistry;
use super::service::ModelValidatorService;
use crate::common::validation::ValidationContext;
use crate::common::{ApiError, ModelValidationError, ValidationReport};

/// Per-request view handed to the filter
///
/// `model_state` may already hold structural errors recorded by the host.
/// The filter fills it with model failures and sets `result` to short-circuit
/// the request.
pub struct ActionExecutingContext<'a> {
    pub arguments: Vec<ValidationContext<'a>>,
    pub model_state: ValidationReport,
    pub result: Option<Response>,
}

impl<'a> ActionExecutingContext<'a> {
    pub fn new(arguments: Vec<ValidationContext<'a>>) -> Self {
        Self {
            arguments,
            model_state: ValidationReport::new(),
            result: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.model_state.is_empty()
    }
}

#[derive(Clone)]
pub struct ModelValidationFilter {
    service: ModelValidatorService,
    enabled: bool,
}

impl ModelValidationFilter {
    pub fn new(service: ModelValidatorService) -> Self {
        Self {
            service,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn service(&self) -> &ModelValidatorService {
        &self.service
    }

    pub fn on_action_executing(&self, context: &mut ActionExecutingContext<'_>) {
        if !self.enabled {
            return;
        }

        // Structural validation already rejected the request.
        if !context.is_valid() {
            debug!(
                fields = context.model_state.len(),
                "Skipping model validation for already invalid request"
            );
            return;
        }

        for argument in &context.arguments {
            let model_key = argument.model_type().name();
            let failures = match self.service.validate_context(argument) {
                Ok(failures) => failures,
                Err(e) => {
                    context.result = Some(ApiError::from(e).into_response());
                    return;
                }
            };
            for failure in failures {
                context.model_state.add_failure(&failure, model_key);
            }
        }

        if !context.is_valid() {
            info!(
                fields = context.model_state.len(),
                "Rejecting request with model validation failures"
            );
            context.result =
                Some(ApiError::ValidationFailed(context.model_state.clone()).into_response());
        }
    }
}

/// Builds the filter that enables automatic model validation
///
/// Fails with `ServiceNotRegistered` if no validator module was ever added to
/// the registry's collection.
pub fn use_automatic_model_validation(
    registry: &Arc<ValidatorRegistry>,
) -> Result<ModelValidationFilter, ModelValidationError> {
    Ok(ModelValidationFilter::new(registry.validator_service()?))
}
