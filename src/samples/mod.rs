//! # Samples Module
//!
//! Demonstration models, validators and routes for the model validation
//! layer:
//! - Automatic validation of JSON bodies and path models
//! - Validator composition (update delegates to create)
//! - Scenario-based rule sets
//! - Explicit validation from a handler

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use routes::samples_routes;
pub use validators::validator_module;
