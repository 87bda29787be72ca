//! Tests for the validation module
//!
//! These tests verify:
//! - First-registration-wins semantics and abstract candidate skipping
//! - Strict versus lenient lookup
//! - Validator lifetimes and composition through the registry
//! - Per-request aggregation in the filter

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::common::validation::ValidationContext;
    use crate::common::{
        ModelValidationError, ModelValidator, ScenarioCode, ValidationFailure,
        ValidationFailures,
    };
    use crate::validation::*;

    // ========================================================================
    // Test models and validators
    // ========================================================================

    #[derive(Debug, Default)]
    struct Widget {
        label: String,
    }

    #[derive(Debug, Default)]
    struct Gadget {
        serial: String,
    }

    /// No validator is ever registered for this type
    #[derive(Debug, Default)]
    struct Unvalidated;

    #[derive(Default)]
    struct WidgetValidator;

    impl ModelValidator<Widget> for WidgetValidator {
        fn validate(&self, model: &Widget, _scenario: ScenarioCode) -> ValidationFailures {
            let mut failures = Vec::new();
            if model.label.is_empty() {
                failures.push(ValidationFailure::new("Label is required", &["Label"]));
            }
            failures
        }
    }

    #[derive(Default)]
    struct StrictWidgetValidator;

    impl ModelValidator<Widget> for StrictWidgetValidator {
        fn validate(&self, _model: &Widget, _scenario: ScenarioCode) -> ValidationFailures {
            vec![ValidationFailure::model_level("strict validator rejects everything")]
        }
    }

    #[derive(Default)]
    struct GadgetValidator;

    impl ModelValidator<Gadget> for GadgetValidator {
        fn validate(&self, model: &Gadget, _scenario: ScenarioCode) -> ValidationFailures {
            if model.serial.is_empty() {
                vec![ValidationFailure::model_level("Gadget has no serial")]
            } else {
                Vec::new()
            }
        }
    }

    /// Handles two model types from one implementation
    #[derive(Default)]
    struct SharedValidator;

    impl ModelValidator<Widget> for SharedValidator {
        fn validate(&self, _model: &Widget, _scenario: ScenarioCode) -> ValidationFailures {
            vec![ValidationFailure::new("shared widget", &["Label"])]
        }
    }

    impl ModelValidator<Gadget> for SharedValidator {
        fn validate(&self, _model: &Gadget, _scenario: ScenarioCode) -> ValidationFailures {
            vec![ValidationFailure::new("shared gadget", &["Serial"])]
        }
    }

    /// Gadget validator that also checks a widget through the registry
    struct CompositeGadgetValidator {
        widgets: Arc<dyn ModelValidator<Widget>>,
    }

    impl ModelValidator<Gadget> for CompositeGadgetValidator {
        fn validate(&self, model: &Gadget, scenario: ScenarioCode) -> ValidationFailures {
            let widget = Widget {
                label: model.serial.clone(),
            };
            self.widgets.validate(&widget, scenario)
        }
    }

    /// Widget validator that depends on the gadget validator
    struct CompositeWidgetValidator {
        gadgets: Arc<dyn ModelValidator<Gadget>>,
    }

    impl ModelValidator<Widget> for CompositeWidgetValidator {
        fn validate(&self, model: &Widget, scenario: ScenarioCode) -> ValidationFailures {
            let gadget = Gadget {
                serial: model.label.clone(),
            };
            self.gadgets.validate(&gadget, scenario)
        }
    }

    fn mutually_dependent_module() -> ValidatorModule {
        ValidatorModule::new("cycle")
            .with(ValidatorCandidate::concrete::<Gadget, _, _>(|registry| {
                Ok(CompositeGadgetValidator {
                    widgets: registry.require::<Widget>()?,
                })
            }))
            .with(ValidatorCandidate::concrete::<Widget, _, _>(|registry| {
                Ok(CompositeWidgetValidator {
                    gadgets: registry.require::<Gadget>()?,
                })
            }))
    }

    fn build(module: ValidatorModule) -> Arc<ValidatorRegistry> {
        let mut collection = ValidatorCollection::new();
        collection.add_validators(module);
        Arc::new(collection.build().unwrap())
    }

    fn service(module: ValidatorModule) -> ModelValidatorService {
        build(module).validator_service().unwrap()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    #[test]
    fn test_first_registration_wins() {
        let registry = build(
            ValidatorModule::new("test")
                .with(ValidatorCandidate::of::<Widget, WidgetValidator>())
                .with(ValidatorCandidate::of::<Widget, StrictWidgetValidator>()),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.implementation_of::<Widget>(), Some("WidgetValidator"));
        let failures = registry
            .require::<Widget>()
            .unwrap()
            .validate(&Widget { label: "ok".into() }, 0);
        assert!(failures.is_empty());
    }

    #[test]
    fn test_first_registration_wins_in_swapped_order() {
        let registry = build(
            ValidatorModule::new("test")
                .with(ValidatorCandidate::of::<Widget, StrictWidgetValidator>())
                .with(ValidatorCandidate::of::<Widget, WidgetValidator>()),
        );

        assert_eq!(
            registry.implementation_of::<Widget>(),
            Some("StrictWidgetValidator")
        );
        let failures = registry
            .require::<Widget>()
            .unwrap()
            .validate(&Widget { label: "ok".into() }, 0);
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn test_first_registration_wins_across_modules() {
        let mut collection = ValidatorCollection::new();
        collection
            .add_validators(ValidatorModule::new("first").with(ValidatorCandidate::of::<
                Widget,
                StrictWidgetValidator,
            >()))
            .add_validators(
                ValidatorModule::new("second")
                    .with(ValidatorCandidate::of::<Widget, WidgetValidator>())
                    .with(ValidatorCandidate::of::<Gadget, GadgetValidator>()),
            );

        let registry = collection.build().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.implementation_of::<Widget>(),
            Some("StrictWidgetValidator")
        );
        assert_eq!(registry.implementation_of::<Gadget>(), Some("GadgetValidator"));
    }

    #[test]
    fn test_try_add_validator_reports_whether_it_was_added() {
        let mut collection = ValidatorCollection::new();

        assert!(collection.try_add_validator::<Widget, _, _>(ServiceLifetime::Singleton, |_| {
            Ok(WidgetValidator)
        }));
        assert!(!collection.try_add_validator::<Widget, _, _>(ServiceLifetime::Singleton, |_| {
            Ok(StrictWidgetValidator)
        }));
        assert!(collection.contains::<Widget>());
        assert!(!collection.contains::<Gadget>());
        assert!(!collection.has_validator_service());
    }

    #[test]
    fn test_abstract_candidates_are_skipped() {
        let candidate = ValidatorCandidate::abstract_base("ModelValidatorBase");
        assert!(candidate.is_abstract());
        assert_eq!(candidate.name(), "ModelValidatorBase");

        let registry = build(
            ValidatorModule::new("test")
                .with(candidate)
                .with(ValidatorCandidate::of::<Widget, WidgetValidator>()),
        );

        assert_eq!(registry.len(), 1);
        assert!(registry.contains::<Widget>());
    }

    #[test]
    fn test_candidate_may_declare_several_model_types() {
        let registry = build(
            ValidatorModule::new("test").with(
                ValidatorCandidate::of::<Widget, SharedValidator>()
                    .also_validates::<Gadget, SharedValidator, _>(|_| Ok(SharedValidator)),
            ),
        );

        assert_eq!(registry.implementation_of::<Widget>(), Some("SharedValidator"));
        assert_eq!(registry.implementation_of::<Gadget>(), Some("SharedValidator"));
        let gadget_failures = registry
            .require::<Gadget>()
            .unwrap()
            .validate(&Gadget::default(), 0);
        assert_eq!(gadget_failures[0].message, "shared gadget");
    }

    #[test]
    fn test_service_descriptor_keeps_first_lifetime() {
        let mut collection = ValidatorCollection::new();
        collection
            .add_validators_from(
                ValidatorModule::new("first").with(ValidatorCandidate::of::<Widget, WidgetValidator>()),
                ServiceLifetime::Transient,
            )
            .add_validators_from(
                ValidatorModule::new("second").with(ValidatorCandidate::of::<Gadget, GadgetValidator>()),
                ServiceLifetime::Singleton,
            );

        assert!(collection.has_validator_service());
        let registry = collection.build().unwrap();
        assert_eq!(registry.service_lifetime(), Some(ServiceLifetime::Transient));
    }

    // ========================================================================
    // Lifetimes and composition
    // ========================================================================

    #[test]
    fn test_singleton_is_constructed_once() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = constructed.clone();

        let mut collection = ValidatorCollection::new();
        collection.try_add_validator::<Widget, _, _>(ServiceLifetime::Singleton, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(WidgetValidator)
        });
        let registry = collection.build().unwrap();

        for _ in 0..3 {
            assert!(registry.get::<Widget>().is_some());
        }
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transient_is_constructed_per_resolution() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = constructed.clone();

        let mut collection = ValidatorCollection::new();
        collection.try_add_validator::<Widget, _, _>(ServiceLifetime::Transient, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(WidgetValidator)
        });
        let registry = collection.build().unwrap();
        let after_build = constructed.load(Ordering::SeqCst);

        registry.get::<Widget>();
        registry.get::<Widget>();
        assert_eq!(constructed.load(Ordering::SeqCst), after_build + 2);
    }

    #[test]
    fn test_composed_validator_resolves_dependency_registered_later() {
        let registry = build(
            ValidatorModule::new("test")
                .with(ValidatorCandidate::concrete::<Gadget, _, _>(|registry| {
                    Ok(CompositeGadgetValidator {
                        widgets: registry.require::<Widget>()?,
                    })
                }))
                .with(ValidatorCandidate::of::<Widget, WidgetValidator>()),
        );

        let failures = registry
            .require::<Gadget>()
            .unwrap()
            .validate(&Gadget::default(), 0);
        assert_eq!(failures, vec![ValidationFailure::new("Label is required", &["Label"])]);
    }

    #[test]
    fn test_build_fails_when_dependency_is_missing() {
        let mut collection = ValidatorCollection::new();
        collection.add_validators(ValidatorModule::new("test").with(
            ValidatorCandidate::concrete::<Gadget, _, _>(|registry| {
                Ok(CompositeGadgetValidator {
                    widgets: registry.require::<Widget>()?,
                })
            }),
        ));

        let err = collection.build().unwrap_err();
        assert_eq!(
            err,
            ModelValidationError::MissingValidator { type_name: "Widget" }
        );
    }

    // ========================================================================
    // Dispatch service
    // ========================================================================

    #[test]
    fn test_missing_validator_strict_and_lenient() {
        let service = service(
            ValidatorModule::new("test").with(ValidatorCandidate::of::<Widget, WidgetValidator>()),
        );

        assert!(service.get_validator::<Unvalidated>().is_none());
        assert!(service
            .validate_context(&ValidationContext::new(&Unvalidated))
            .unwrap()
            .is_empty());
        assert_eq!(
            service.validate(&Unvalidated).unwrap_err(),
            ModelValidationError::MissingValidator {
                type_name: "Unvalidated"
            }
        );
        assert_eq!(
            service.validate_and_raise(&Unvalidated).unwrap_err(),
            ModelValidationError::MissingValidator {
                type_name: "Unvalidated"
            }
        );
    }

    #[test]
    fn test_missing_validator_error_names_the_type() {
        let message = ModelValidationError::MissingValidator {
            type_name: "Unvalidated",
        }
        .to_string();
        assert!(message.contains("ModelValidator<Unvalidated>"));
    }

    #[test]
    fn test_validate_returns_failures_as_data() {
        let service = service(
            ValidatorModule::new("test").with(ValidatorCandidate::of::<Widget, WidgetValidator>()),
        );

        let failures = service.validate(&Widget::default()).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field_names, vec!["Label".to_string()]);

        let context_failures = service
            .validate_context(&ValidationContext::new(&Widget::default()))
            .unwrap();
        assert_eq!(context_failures, failures);
    }

    #[test]
    fn test_build_fails_on_mutual_dependency() {
        for lifetime in [ServiceLifetime::Singleton, ServiceLifetime::Transient] {
            let mut collection = ValidatorCollection::new();
            collection.add_validators_from(mutually_dependent_module(), lifetime);

            let err = collection.build().unwrap_err();
            assert!(
                matches!(err, ModelValidationError::CircularDependency { .. }),
                "unexpected error under {lifetime:?}: {err:?}"
            );
        }

        // Nothing is left marked as under construction after the failure.
        assert_eq!(build_widget_registry().len(), 1);
    }

    #[test]
    fn test_build_fails_on_self_dependency() {
        let mut collection = ValidatorCollection::new();
        collection.add_validators(ValidatorModule::new("self").with(
            ValidatorCandidate::concrete::<Widget, _, _>(|registry| {
                registry.require::<Widget>()?;
                Ok(WidgetValidator)
            }),
        ));

        let err = collection.build().unwrap_err();
        assert_eq!(
            err,
            ModelValidationError::CircularDependency { type_name: "Widget" }
        );
        assert!(err.to_string().contains("ModelValidator<Widget>"));
    }

    fn build_widget_registry() -> Arc<ValidatorRegistry> {
        build(ValidatorModule::new("test").with(ValidatorCandidate::of::<Widget, WidgetValidator>()))
    }

    /// Transient gadget validator whose factory only succeeds once
    fn flaky_gadget_registry() -> Arc<ValidatorRegistry> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut collection = ValidatorCollection::new();
        collection.try_add_validator::<Gadget, _, _>(ServiceLifetime::Transient, move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(ModelValidationError::MissingValidator { type_name: "Widget" });
            }
            Ok(GadgetValidator)
        });
        Arc::new(collection.build().unwrap())
    }

    #[test]
    fn test_construction_failure_after_build_is_propagated() {
        let registry = flaky_gadget_registry();
        let construction_error = ModelValidationError::MissingValidator { type_name: "Widget" };

        assert_eq!(registry.require::<Gadget>().unwrap_err(), construction_error);
        assert_eq!(registry.try_get::<Gadget>().unwrap_err(), construction_error);
        assert!(registry.get::<Gadget>().is_none());

        let service = ModelValidatorService::new(registry);
        assert_eq!(service.validate(&Gadget::default()).unwrap_err(), construction_error);
        assert_eq!(
            service.validate_and_raise(&Gadget::default()).unwrap_err(),
            construction_error
        );
        assert_eq!(
            service
                .validate_context(&ValidationContext::new(&Gadget::default()))
                .unwrap_err(),
            construction_error
        );
    }

    #[test]
    fn test_filter_fails_request_when_validator_cannot_be_constructed() {
        let filter = ModelValidationFilter::new(ModelValidatorService::new(flaky_gadget_registry()));
        let gadget = Gadget::default();
        let mut context = ActionExecutingContext::new(vec![ValidationContext::new(&gadget)]);

        filter.on_action_executing(&mut context);

        assert!(context.is_valid());
        let response = context.result.expect("request should be short-circuited");
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validate_and_raise_report_keys_match_failures() {
        let service = service(
            ValidatorModule::new("test")
                .with(ValidatorCandidate::of::<Widget, WidgetValidator>())
                .with(ValidatorCandidate::of::<Gadget, GadgetValidator>()),
        );

        match service.validate_and_raise(&Widget::default()) {
            Err(ModelValidationError::ValidationFailed(report)) => {
                assert_eq!(report.keys().collect::<Vec<_>>(), vec!["Label"]);
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }

        match service.validate_and_raise(&Gadget::default()) {
            Err(ModelValidationError::ValidationFailed(report)) => {
                assert_eq!(report.keys().collect::<Vec<_>>(), vec!["Gadget"]);
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }

        assert!(service
            .validate_and_raise(&Widget {
                label: "ok".into()
            })
            .is_ok());
    }

    #[test]
    fn test_service_requires_registration() {
        let registry = Arc::new(ValidatorCollection::new().build().unwrap());

        assert!(matches!(
            registry.validator_service(),
            Err(ModelValidationError::ServiceNotRegistered)
        ));
        assert!(matches!(
            use_automatic_model_validation(&registry),
            Err(ModelValidationError::ServiceNotRegistered)
        ));
    }

    #[test]
    fn test_service_handles_share_one_registry() {
        let mut collection = ValidatorCollection::new();
        collection.add_validators_from(
            ValidatorModule::new("test").with(ValidatorCandidate::of::<Widget, WidgetValidator>()),
            ServiceLifetime::Transient,
        );
        let registry = Arc::new(collection.build().unwrap());

        let first = registry.validator_service().unwrap();
        let second = registry.validator_service().unwrap();

        assert_eq!(registry.service_lifetime(), Some(ServiceLifetime::Transient));
        assert!(std::ptr::eq(first.registry(), second.registry()));
        assert!(std::ptr::eq(first.registry(), &*registry));
        assert_eq!(
            first.validate(&Widget::default()).unwrap(),
            second.validate(&Widget::default()).unwrap()
        );
    }

    #[test]
    fn test_empty_module_still_registers_service() {
        let registry = build(ValidatorModule::new("empty"));

        assert!(registry.is_empty());
        assert!(registry.validator_service().is_ok());
    }

    // ========================================================================
    // Filter
    // ========================================================================

    fn filter() -> ModelValidationFilter {
        use_automatic_model_validation(&build(
            ValidatorModule::new("test")
                .with(ValidatorCandidate::of::<Widget, WidgetValidator>())
                .with(ValidatorCandidate::of::<Gadget, GadgetValidator>()),
        ))
        .unwrap()
    }

    #[test]
    fn test_filter_reports_only_arguments_with_validators() {
        let widget = Widget::default();
        let unvalidated = Unvalidated;
        let mut context = ActionExecutingContext::new(vec![
            ValidationContext::new(&widget),
            ValidationContext::new(&unvalidated),
        ]);

        filter().on_action_executing(&mut context);

        assert_eq!(context.model_state.len(), 1);
        assert_eq!(
            context.model_state.get("Label"),
            Some(&["Label is required".to_string()][..])
        );
        let response = context.result.expect("request should be short-circuited");
        assert_eq!(response.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_filter_keys_model_level_failures_by_type_name() {
        let gadget = Gadget::default();
        let widget = Widget::default();
        let mut context = ActionExecutingContext::new(vec![
            ValidationContext::new(&gadget),
            ValidationContext::new(&widget),
        ]);

        filter().on_action_executing(&mut context);

        assert_eq!(
            context.model_state.keys().collect::<Vec<_>>(),
            vec!["Gadget", "Label"]
        );
    }

    #[test]
    fn test_filter_passes_valid_arguments() {
        let widget = Widget {
            label: "ok".into(),
        };
        let mut context = ActionExecutingContext::new(vec![ValidationContext::new(&widget)]);

        filter().on_action_executing(&mut context);

        assert!(context.is_valid());
        assert!(context.result.is_none());
    }

    #[test]
    fn test_filter_skips_when_structural_validation_failed() {
        let widget = Widget::default();
        let mut context = ActionExecutingContext::new(vec![ValidationContext::new(&widget)]);
        context.model_state.add_error("body", "malformed");

        filter().on_action_executing(&mut context);

        assert_eq!(context.model_state.keys().collect::<Vec<_>>(), vec!["body"]);
        assert!(context.result.is_none());
    }

    #[test]
    fn test_disabled_filter_does_nothing() {
        let widget = Widget::default();
        let mut context = ActionExecutingContext::new(vec![ValidationContext::new(&widget)]);

        let filter = filter().with_enabled(false);
        assert!(!filter.is_enabled());
        filter.on_action_executing(&mut context);

        assert!(context.is_valid());
        assert!(context.result.is_none());
    }

    #[test]
    fn test_lifetime_parses_from_config_strings() {
        assert_eq!(
            "Singleton".parse::<ServiceLifetime>(),
            Ok(ServiceLifetime::Singleton)
        );
        assert_eq!(
            " transient ".parse::<ServiceLifetime>(),
            Ok(ServiceLifetime::Transient)
        );
        assert!("scoped".parse::<ServiceLifetime>().is_err());
    }
}
