// Application state shared across all modules

use std::sync::Arc;

use super::config::AppConfig;
use super::error::ModelValidationError;
use crate::validation::{
    use_automatic_model_validation, ModelValidationFilter, ModelValidatorService, ValidatorRegistry,
};

/// Application state containing configuration and the validation services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub validator_service: ModelValidatorService,
    pub validation_filter: Arc<ModelValidationFilter>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        registry: Arc<ValidatorRegistry>,
    ) -> Result<Self, ModelValidationError> {
        let validator_service = registry.validator_service()?;
        let validation_filter = use_automatic_model_validation(&registry)?
            .with_enabled(config.automatic_validation);

        Ok(Self {
            config,
            validator_service,
            validation_filter: Arc::new(validation_filter),
        })
    }
}
