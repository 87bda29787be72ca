// Common validation types and traits

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::any::{type_name, Any, TypeId};
use std::fmt;

use super::error::ModelValidationError;

/// Integer selector for an alternate rule subset within one validator
pub type ScenarioCode = i32;

pub const DEFAULT_SCENARIO: ScenarioCode = 0;

/// One violated rule
///
/// An empty `field_names` list marks a model-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub message: String,
    pub field_names: Vec<String>,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>, field_names: &[&str]) -> Self {
        Self {
            message: message.into(),
            field_names: field_names.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn model_level(message: impl Into<String>) -> Self {
        Self::new(message, &[])
    }

    pub fn is_model_level(&self) -> bool {
        self.field_names.is_empty()
    }
}

pub type ValidationFailures = Vec<ValidationFailure>;

/// Field-keyed view of all failures for one validation pass
///
/// Keys keep their first-insertion order so the serialized report lists
/// failures in the order they were detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    entries: Vec<(String, Vec<String>)>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a report from a failure sequence, filing model-level failures
    /// under `model_key`.
    pub fn from_failures(failures: &[ValidationFailure], model_key: &str) -> Self {
        let mut report = Self::new();
        for failure in failures {
            report.add_failure(failure, model_key);
        }
        report
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        match self.entries.iter_mut().find(|(key, _)| key == field) {
            Some((_, messages)) => messages.push(message.to_string()),
            None => self
                .entries
                .push((field.to_string(), vec![message.to_string()])),
        }
    }

    pub fn add_failure(&mut self, failure: &ValidationFailure, model_key: &str) {
        if failure.is_model_level() {
            self.add_error(model_key, &failure.message);
        } else {
            for field in &failure.field_names {
                self.add_error(field, &failure.message);
            }
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        for (field, messages) in other.entries {
            for message in messages {
                self.add_error(&field, &message);
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, messages)| (key.as_str(), messages.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ValidationReport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, messages) in &self.entries {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}

/// Type tag identifying a class of validatable models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelType {
    id: TypeId,
    name: &'static str,
}

impl ModelType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Returns the unqualified name of `T`, without module path or generic
/// arguments (`crate::samples::models::SampleCreateRequest` becomes
/// `SampleCreateRequest`).
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    };
    base.rsplit("::").next().unwrap_or(base)
}

/// Type-erased model instance together with its declared type
///
/// Used by the lenient dispatch path where the model type is only known at
/// runtime.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    instance: &'a dyn Any,
    model_type: ModelType,
}

impl<'a> ValidationContext<'a> {
    pub fn new<T: Any>(instance: &'a T) -> Self {
        Self {
            instance,
            model_type: ModelType::of::<T>(),
        }
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn downcast<T: Any>(&self) -> Option<&'a T> {
        self.instance.downcast_ref::<T>()
    }
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("model_type", &self.model_type)
            .finish_non_exhaustive()
    }
}

/// Validator for one model type
///
/// Implementations hold no per-call state. Invalid data is reported through
/// the returned failures, never through errors.
pub trait ModelValidator<T: 'static>: Send + Sync {
    fn validate(&self, model: &T, scenario: ScenarioCode) -> ValidationFailures;

    /// Runs the default scenario and raises `ValidationFailed` with the full
    /// report if anything failed.
    fn validate_and_raise(&self, model: &T) -> Result<(), ModelValidationError> {
        let failures = self.validate(model, DEFAULT_SCENARIO);
        if failures.is_empty() {
            return Ok(());
        }

        Err(ModelValidationError::ValidationFailed(
            ValidationReport::from_failures(&failures, short_type_name::<T>()),
        ))
    }
}


#[cfg(test)]
impl<T: 'static> std::fmt::Debug for dyn ModelValidator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModelValidator<{}>", short_type_name::<T>())
    }
}
