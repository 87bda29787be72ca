//! Validator registration and lookup
//!
//! Validators are collected once at startup into a [`ValidatorCollection`]
//! from explicit candidate lists ([`ValidatorModule`]). Each model type keeps
//! the first validator registered for it. The collection is then frozen into
//! a read-only [`ValidatorRegistry`] shared by all requests.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info};

use super::service::ModelValidatorService;
use crate::common::validation::{short_type_name, ModelType, ValidationContext};
use crate::common::{ModelValidationError, ModelValidator, ValidationFailures, DEFAULT_SCENARIO};

/// How long a resolved validator instance lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// Built once and shared for the life of the process
    #[default]
    Singleton,
    /// Built again on every resolution
    Transient,
}

impl FromStr for ServiceLifetime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "singleton" => Ok(ServiceLifetime::Singleton),
            "transient" => Ok(ServiceLifetime::Transient),
            other => Err(format!(
                "unknown service lifetime '{}', expected 'singleton' or 'transient'",
                other
            )),
        }
    }
}

/// Validator with its model type erased, used by the lenient lookup path
pub(crate) trait ErasedValidator: Send + Sync {
    fn validate_context(&self, context: &ValidationContext<'_>) -> ValidationFailures;

    fn as_any(&self) -> &dyn Any;
}

struct TypedValidator<T: 'static> {
    inner: Arc<dyn ModelValidator<T>>,
}

impl<T: 'static> ErasedValidator for TypedValidator<T> {
    fn validate_context(&self, context: &ValidationContext<'_>) -> ValidationFailures {
        match context.downcast::<T>() {
            Some(model) => self.inner.validate(model, DEFAULT_SCENARIO),
            None => {
                error!(
                    expected = short_type_name::<T>(),
                    actual = %context.model_type(),
                    "Validation context does not hold the validator's model type"
                );
                Vec::new()
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type ValidatorFactory = Box<
    dyn Fn(&ValidatorRegistry) -> Result<Arc<dyn ErasedValidator>, ModelValidationError>
        + Send
        + Sync,
>;

/// One model type a candidate validates, with the constructor to build it
struct ValidatorDeclaration {
    model_type: ModelType,
    factory: ValidatorFactory,
}

impl ValidatorDeclaration {
    fn new<T, V, F>(factory: F) -> Self
    where
        T: 'static,
        V: ModelValidator<T> + 'static,
        F: Fn(&ValidatorRegistry) -> Result<V, ModelValidationError> + Send + Sync + 'static,
    {
        Self {
            model_type: ModelType::of::<T>(),
            factory: Box::new(move |registry| {
                let inner: Arc<dyn ModelValidator<T>> = Arc::new(factory(registry)?);
                Ok(Arc::new(TypedValidator { inner }) as Arc<dyn ErasedValidator>)
            }),
        }
    }
}

/// A validator implementation offered for registration
///
/// Abstract candidates carry no declarations and are skipped during
/// registration.
pub struct ValidatorCandidate {
    name: &'static str,
    declarations: Option<Vec<ValidatorDeclaration>>,
}

impl ValidatorCandidate {
    /// Concrete validator for `T` built by `factory`
    ///
    /// The factory receives the registry so it can resolve validators it
    /// composes with.
    pub fn concrete<T, V, F>(factory: F) -> Self
    where
        T: 'static,
        V: ModelValidator<T> + 'static,
        F: Fn(&ValidatorRegistry) -> Result<V, ModelValidationError> + Send + Sync + 'static,
    {
        Self {
            name: short_type_name::<V>(),
            declarations: Some(vec![ValidatorDeclaration::new::<T, V, F>(factory)]),
        }
    }

    /// Concrete validator for `T` with no dependencies
    pub fn of<T, V>() -> Self
    where
        T: 'static,
        V: ModelValidator<T> + Default + 'static,
    {
        Self::concrete::<T, V, _>(|_| Ok(V::default()))
    }

    /// Base or placeholder type that cannot be instantiated
    pub fn abstract_base(name: &'static str) -> Self {
        Self {
            name,
            declarations: None,
        }
    }

    /// Declares an additional model type handled by the same implementation
    pub fn also_validates<T, V, F>(mut self, factory: F) -> Self
    where
        T: 'static,
        V: ModelValidator<T> + 'static,
        F: Fn(&ValidatorRegistry) -> Result<V, ModelValidationError> + Send + Sync + 'static,
    {
        if let Some(declarations) = self.declarations.as_mut() {
            declarations.push(ValidatorDeclaration::new::<T, V, F>(factory));
        }
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.declarations.is_none()
    }
}

/// A closed, ordered set of validator candidates
#[derive(Default)]
pub struct ValidatorModule {
    name: &'static str,
    candidates: Vec<ValidatorCandidate>,
}

impl ValidatorModule {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            candidates: Vec::new(),
        }
    }

    pub fn with(mut self, candidate: ValidatorCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

struct ValidatorDescriptor {
    model_type: ModelType,
    implementation: &'static str,
    lifetime: ServiceLifetime,
    factory: ValidatorFactory,
}

/// Mutable registration phase of the registry
#[derive(Default)]
pub struct ValidatorCollection {
    descriptors: Vec<ValidatorDescriptor>,
    index: HashMap<TypeId, usize>,
    service_lifetime: Option<ServiceLifetime>,
}

impl ValidatorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every concrete candidate of `module` with the default
    /// singleton lifetime
    pub fn add_validators(&mut self, module: ValidatorModule) -> &mut Self {
        self.add_validators_from(module, ServiceLifetime::default())
    }

    /// Registers every concrete candidate of `module`
    ///
    /// A model type that already has a validator keeps it; later candidates
    /// for the same type are dropped. The dispatch service descriptor is
    /// added with `lifetime` unless an earlier call already added one.
    pub fn add_validators_from(
        &mut self,
        module: ValidatorModule,
        lifetime: ServiceLifetime,
    ) -> &mut Self {
        let module_name = module.name;
        let mut added = 0usize;

        for candidate in module.candidates {
            let Some(declarations) = candidate.declarations else {
                debug!(
                    module = module_name,
                    candidate = candidate.name,
                    "Skipping abstract validator candidate"
                );
                continue;
            };

            for declaration in declarations {
                if self.try_add(candidate.name, declaration, lifetime) {
                    added += 1;
                }
            }
        }

        if self.service_lifetime.is_none() {
            self.service_lifetime = Some(lifetime);
        }

        info!(
            module = module_name,
            added,
            total = self.descriptors.len(),
            ?lifetime,
            "Model validators registered"
        );
        self
    }

    /// Registers a single validator for `T` unless one already exists
    pub fn try_add_validator<T, V, F>(&mut self, lifetime: ServiceLifetime, factory: F) -> bool
    where
        T: 'static,
        V: ModelValidator<T> + 'static,
        F: Fn(&ValidatorRegistry) -> Result<V, ModelValidationError> + Send + Sync + 'static,
    {
        self.try_add(
            short_type_name::<V>(),
            ValidatorDeclaration::new::<T, V, F>(factory),
            lifetime,
        )
    }

    fn try_add(
        &mut self,
        implementation: &'static str,
        declaration: ValidatorDeclaration,
        lifetime: ServiceLifetime,
    ) -> bool {
        let model_type = declaration.model_type;

        if let Some(&existing) = self.index.get(&model_type.id()) {
            debug!(
                model = %model_type,
                kept = self.descriptors[existing].implementation,
                dropped = implementation,
                "Validator already registered for model type"
            );
            return false;
        }

        debug!(model = %model_type, implementation, ?lifetime, "Registering validator");
        self.index.insert(model_type.id(), self.descriptors.len());
        self.descriptors.push(ValidatorDescriptor {
            model_type,
            implementation,
            lifetime,
            factory: declaration.factory,
        });
        true
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    pub fn has_validator_service(&self) -> bool {
        self.service_lifetime.is_some()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Freezes the collection into a read-only registry
    ///
    /// Every validator is constructed once here so that unresolvable
    /// dependencies fail at startup instead of on the first request.
    pub fn build(self) -> Result<ValidatorRegistry, ModelValidationError> {
        let entries = self
            .descriptors
            .into_iter()
            .map(|descriptor| {
                (
                    descriptor.model_type.id(),
                    RegistryEntry {
                        model_type: descriptor.model_type,
                        implementation: descriptor.implementation,
                        lifetime: descriptor.lifetime,
                        factory: descriptor.factory,
                        instance: OnceLock::new(),
                    },
                )
            })
            .collect();

        let registry = ValidatorRegistry {
            entries,
            service_lifetime: self.service_lifetime,
        };

        for entry in registry.entries.values() {
            registry.instantiate(entry)?;
        }

        info!(validators = registry.len(), "Validator registry built");
        Ok(registry)
    }
}

struct RegistryEntry {
    model_type: ModelType,
    implementation: &'static str,
    lifetime: ServiceLifetime,
    factory: ValidatorFactory,
    instance: OnceLock<Arc<dyn ErasedValidator>>,
}

/// Read-only mapping from model type to validator
pub struct ValidatorRegistry {
    entries: HashMap<TypeId, RegistryEntry>,
    service_lifetime: Option<ServiceLifetime>,
}

thread_local! {
    // Validators under construction on this thread, keyed by registry address.
    static CONSTRUCTING: RefCell<Vec<(usize, TypeId)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a model type as under construction until dropped
struct ConstructionGuard {
    key: (usize, TypeId),
}

impl ConstructionGuard {
    fn enter(
        registry: &ValidatorRegistry,
        model_type: &ModelType,
    ) -> Result<Self, ModelValidationError> {
        let key = (registry as *const ValidatorRegistry as usize, model_type.id());
        CONSTRUCTING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                return Err(ModelValidationError::CircularDependency {
                    type_name: model_type.name(),
                });
            }
            stack.push(key);
            Ok(Self { key })
        })
    }
}

impl Drop for ConstructionGuard {
    fn drop(&mut self) {
        CONSTRUCTING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(position) = stack.iter().rposition(|key| *key == self.key) {
                stack.remove(position);
            }
        });
    }
}

impl ValidatorRegistry {
    fn instantiate(
        &self,
        entry: &RegistryEntry,
    ) -> Result<Arc<dyn ErasedValidator>, ModelValidationError> {
        if entry.lifetime == ServiceLifetime::Singleton {
            if let Some(instance) = entry.instance.get() {
                return Ok(instance.clone());
            }
        }

        let instance = {
            let _guard = ConstructionGuard::enter(self, &entry.model_type)?;
            (entry.factory)(self)?
        };

        match entry.lifetime {
            ServiceLifetime::Transient => Ok(instance),
            ServiceLifetime::Singleton => Ok(entry.instance.get_or_init(|| instance).clone()),
        }
    }

    fn resolve(&self, id: &TypeId) -> Result<Option<Arc<dyn ErasedValidator>>, ModelValidationError> {
        let Some(entry) = self.entries.get(id) else {
            return Ok(None);
        };
        self.instantiate(entry).map(Some).inspect_err(|e| {
            error!(
                model = %entry.model_type,
                implementation = entry.implementation,
                error = %e,
                "Failed to construct validator"
            );
        })
    }

    /// Returns the validator for `T`, or `None` if there is none or it
    /// could not be constructed
    pub fn get<T: 'static>(&self) -> Option<Arc<dyn ModelValidator<T>>> {
        self.try_get::<T>().ok().flatten()
    }

    /// Returns the validator for `T` if one is registered, propagating any
    /// construction failure
    pub fn try_get<T: 'static>(
        &self,
    ) -> Result<Option<Arc<dyn ModelValidator<T>>>, ModelValidationError> {
        let Some(erased) = self.resolve(&TypeId::of::<T>())? else {
            return Ok(None);
        };
        Ok(erased
            .as_any()
            .downcast_ref::<TypedValidator<T>>()
            .map(|typed| typed.inner.clone()))
    }

    /// Returns the validator for `T`, failing with `MissingValidator` if
    /// there is none
    pub fn require<T: 'static>(&self) -> Result<Arc<dyn ModelValidator<T>>, ModelValidationError> {
        self.try_get::<T>()?
            .ok_or(ModelValidationError::MissingValidator {
                type_name: short_type_name::<T>(),
            })
    }

    pub(crate) fn get_erased(
        &self,
        model_type: &ModelType,
    ) -> Result<Option<Arc<dyn ErasedValidator>>, ModelValidationError> {
        self.resolve(&model_type.id())
    }

    /// Name of the implementation registered for `T`
    pub fn implementation_of<T: 'static>(&self) -> Option<&'static str> {
        self.entries
            .get(&TypeId::of::<T>())
            .map(|entry| entry.implementation)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn service_lifetime(&self) -> Option<ServiceLifetime> {
        self.service_lifetime
    }

    /// Resolves the dispatch service over this registry
    ///
    /// The service is a stateless handle over the shared registry, so each
    /// call returns a new handle whatever the recorded lifetime. Validator
    /// instances still follow their own lifetime.
    pub fn validator_service(
        self: &Arc<Self>,
    ) -> Result<ModelValidatorService, ModelValidationError> {
        if self.service_lifetime.is_none() {
            return Err(ModelValidationError::ServiceNotRegistered);
        }
        Ok(ModelValidatorService::new(self.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in self.entries.values() {
            map.entry(&entry.model_type.name(), &entry.implementation);
        }
        map.finish()
    }
}
