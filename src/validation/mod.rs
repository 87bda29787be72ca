//! # Model Validation Module
//!
//! Registry, dispatch and request integration for per-type model validators:
//! - `registry`: startup registration with first-wins semantics
//! - `service`: strict and lenient validator dispatch
//! - `filter`: per-request aggregation into a field-keyed report
//! - `extractors`: the `Validated<A>` axum extractor

pub mod extractors;
pub mod filter;
pub mod registry;
pub mod service;

#[cfg(test)]
mod tests;

pub use extractors::{ActionArguments, Validated};
pub use filter::{use_automatic_model_validation, ActionExecutingContext, ModelValidationFilter};
pub use registry::{
    ServiceLifetime, ValidatorCandidate, ValidatorCollection, ValidatorModule, ValidatorRegistry,
};
pub use service::ModelValidatorService;
