// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::error;

use super::validation::ValidationReport;

/// Errors raised by the model validation core
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Strict lookup found no validator for the requested model type
    #[error(
        "The validator registry does not contain a registered implementation for \
         ModelValidator<{type_name}>. Either it has not been created or it has not been \
         registered in the validator collection."
    )]
    MissingValidator { type_name: &'static str },

    /// A validator depends, directly or through others, on itself
    #[error(
        "A circular dependency was detected while constructing the validator for \
         ModelValidator<{type_name}>."
    )]
    CircularDependency { type_name: &'static str },

    #[error("Model validation failed.")]
    ValidationFailed(ValidationReport),

    #[error(
        "Unable to resolve ModelValidatorService. You may have forgotten to register model \
         validators before enabling automatic model validation."
    )]
    ServiceNotRegistered,
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    InternalServer(String),
    Configuration(String),
    ValidationFailed(ValidationReport),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::Configuration(msg) => write!(f, "Configuration Error: {}", msg),
            ApiError::ValidationFailed(report) => {
                write!(f, "Validation Failed: {} field(s)", report.len())
            }
        }
    }
}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            ApiError::ValidationFailed(report) => {
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(report)).into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::InternalServer(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "INTERNAL_SERVER_ERROR",
            ),
            ApiError::Configuration(msg) => {
                error!(error = %msg, "Model validation is misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Model validation is misconfigured".to_string(),
                    "CONFIGURATION_ERROR",
                )
            }
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<ModelValidationError> for ApiError {
    fn from(err: ModelValidationError) -> Self {
        match err {
            ModelValidationError::ValidationFailed(report) => ApiError::ValidationFailed(report),
            other => ApiError::Configuration(other.to_string()),
        }
    }
}
