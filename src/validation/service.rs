//! Runtime facade that resolves and runs validators

use std::sync::Arc;
use tracing::{debug, warn};

use super::registry::ValidatorRegistry;
use crate::common::validation::{short_type_name, ValidationContext};
use crate::common::{ModelValidationError, ModelValidator, ValidationFailures, DEFAULT_SCENARIO};

/// Resolves validators by model type and runs them
///
/// The typed entry points use a strict lookup and fail with
/// `MissingValidator` when nothing is registered. `validate_context` is the
/// lenient path used by automatic validation, where most argument types have
/// no validator.
#[derive(Clone)]
pub struct ModelValidatorService {
    registry: Arc<ValidatorRegistry>,
}

impl ModelValidatorService {
    pub fn new(registry: Arc<ValidatorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Returns the validator for `T`, or `None` if one does not exist
    pub fn get_validator<T: 'static>(&self) -> Option<Arc<dyn ModelValidator<T>>> {
        self.registry.get::<T>()
    }

    /// Validates `model` with its registered validator
    pub fn validate<T: 'static>(&self, model: &T) -> Result<ValidationFailures, ModelValidationError> {
        match self.registry.try_get::<T>()? {
            Some(validator) => Ok(validator.validate(model, DEFAULT_SCENARIO)),
            None => {
                warn!(model = short_type_name::<T>(), "No validator registered for model");
                Err(ModelValidationError::MissingValidator {
                    type_name: short_type_name::<T>(),
                })
            }
        }
    }

    /// Validates the model held by `context`; returns no failures if its
    /// type has no validator
    ///
    /// A registered validator that cannot be constructed is an error, never
    /// a skip.
    pub fn validate_context(
        &self,
        context: &ValidationContext<'_>,
    ) -> Result<ValidationFailures, ModelValidationError> {
        match self.registry.get_erased(&context.model_type())? {
            Some(validator) => Ok(validator.validate_context(context)),
            None => {
                debug!(model = %context.model_type(), "No validator for model, skipping");
                Ok(Vec::new())
            }
        }
    }

    /// Validates `model` and raises `ValidationFailed` if it is invalid
    pub fn validate_and_raise<T: 'static>(&self, model: &T) -> Result<(), ModelValidationError> {
        let validator = self.registry.require::<T>().inspect_err(|e| {
            warn!(model = short_type_name::<T>(), error = %e, "Unable to resolve validator for model");
        })?;
        validator.validate_and_raise(model)
    }
}
