//! Validators for the sample request models

use std::sync::Arc;
use uuid::Uuid;

use super::models::*;
use crate::common::helpers::{is_blank, is_email_address, is_phone_number, is_url};
use crate::common::{
    ModelValidationError, ModelValidator, ScenarioCode, ValidationFailure, ValidationFailures,
    DEFAULT_SCENARIO,
};
use crate::validation::{ValidatorCandidate, ValidatorModule, ValidatorRegistry};

// ============================================================================
// Field names
// ============================================================================

pub const FIELD_ID: &str = "Id";
pub const FIELD_NAME: &str = "Name";
pub const FIELD_EMAIL: &str = "Email";
pub const FIELD_PHONE: &str = "Phone";
pub const FIELD_WEBSITE: &str = "Website";

// ============================================================================
// Create Request Validator
// ============================================================================

#[derive(Debug, Default)]
pub struct SampleCreateRequestValidator;

impl ModelValidator<SampleCreateRequest> for SampleCreateRequestValidator {
    fn validate(&self, data: &SampleCreateRequest, _scenario: ScenarioCode) -> ValidationFailures {
        let mut failures = Vec::new();
        let mut all_fields_valid = true;

        if is_blank(&data.name) {
            all_fields_valid = false;
            failures.push(ValidationFailure::new("Name is a required value", &[FIELD_NAME]));
        }

        if !is_blank(&data.email) && !is_email_address(&data.email) {
            all_fields_valid = false;
            failures.push(ValidationFailure::new("Not a valid email address", &[FIELD_EMAIL]));
        }

        if !is_blank(&data.phone) && !is_phone_number(&data.phone) {
            all_fields_valid = false;
            failures.push(ValidationFailure::new("Not a valid phone number", &[FIELD_PHONE]));
        }

        if !is_blank(&data.website) && !is_url(&data.website) {
            all_fields_valid = false;
            failures.push(ValidationFailure::new("Invalid website url", &[FIELD_WEBSITE]));
        }

        // Cross-field rules only make sense once every field is well formed.
        if all_fields_valid {
            if is_blank(&data.email) && is_blank(&data.phone) {
                failures.push(ValidationFailure::new(
                    "Either an email address or a phone number is required",
                    &[FIELD_EMAIL, FIELD_PHONE],
                ));
            }

            if data.auto_redirect && is_blank(&data.website) {
                failures.push(ValidationFailure::new(
                    "A website url is required to use auto redirect",
                    &[FIELD_WEBSITE],
                ));
            }
        }

        failures
    }
}

// ============================================================================
// Update Request Validator
// ============================================================================

/// Checks the id, then re-yields the create validator's failures for the
/// embedded fields
pub struct SampleUpdateRequestValidator {
    create_request_validator: Arc<dyn ModelValidator<SampleCreateRequest>>,
}

impl SampleUpdateRequestValidator {
    pub fn new(create_request_validator: Arc<dyn ModelValidator<SampleCreateRequest>>) -> Self {
        Self {
            create_request_validator,
        }
    }
}

impl ModelValidator<SampleUpdateRequest> for SampleUpdateRequestValidator {
    fn validate(&self, data: &SampleUpdateRequest, _scenario: ScenarioCode) -> ValidationFailures {
        let mut failures = Vec::new();

        if data.id == Uuid::nil() {
            failures.push(ValidationFailure::new("Id is a required field", &[FIELD_ID]));
        }

        // Scenario codes are local to each validator, so the delegate runs its default.
        failures.extend(
            self.create_request_validator
                .validate(&data.fields, DEFAULT_SCENARIO),
        );

        failures
    }
}

// ============================================================================
// Scenario Validator
// ============================================================================

/// Alternate rule sets for create requests selected by scenario code
#[derive(Debug, Default)]
pub struct SampleScenarioValidator;

impl SampleScenarioValidator {
    pub const DEFAULT_SCENARIO: ScenarioCode = DEFAULT_SCENARIO;
    pub const SCENARIO_A: ScenarioCode = 1;
    pub const SCENARIO_B: ScenarioCode = 2;

    fn default_scenario_validation(&self, _data: &SampleCreateRequest) -> ValidationFailures {
        Vec::new()
    }

    fn scenario_a_validation(&self, data: &SampleCreateRequest) -> ValidationFailures {
        let mut failures = Vec::new();
        if is_blank(&data.website) {
            failures.push(ValidationFailure::new(
                "Website is a required value",
                &[FIELD_WEBSITE],
            ));
        }
        failures
    }

    fn scenario_b_validation(&self, data: &SampleCreateRequest) -> ValidationFailures {
        let mut failures = Vec::new();
        if is_blank(&data.phone) {
            failures.push(ValidationFailure::new("Phone is a required value", &[FIELD_PHONE]));
        }
        failures
    }
}

impl ModelValidator<SampleCreateRequest> for SampleScenarioValidator {
    fn validate(&self, data: &SampleCreateRequest, scenario: ScenarioCode) -> ValidationFailures {
        match scenario {
            Self::SCENARIO_A => self.scenario_a_validation(data),
            Self::SCENARIO_B => self.scenario_b_validation(data),
            _ => self.default_scenario_validation(data),
        }
    }
}

// ============================================================================
// Registration
// ============================================================================

fn build_update_validator(
    registry: &ValidatorRegistry,
) -> Result<SampleUpdateRequestValidator, ModelValidationError> {
    Ok(SampleUpdateRequestValidator::new(
        registry.require::<SampleCreateRequest>()?,
    ))
}

/// Validators shipped with the sample API
///
/// `SampleScenarioValidator` also targets `SampleCreateRequest`; it comes
/// after `SampleCreateRequestValidator` and is therefore never registered.
pub fn validator_module() -> ValidatorModule {
    ValidatorModule::new("samples")
        .with(ValidatorCandidate::of::<SampleCreateRequest, SampleCreateRequestValidator>())
        .with(ValidatorCandidate::concrete::<SampleUpdateRequest, _, _>(
            build_update_validator,
        ))
        .with(ValidatorCandidate::of::<SampleCreateRequest, SampleScenarioValidator>())
}
