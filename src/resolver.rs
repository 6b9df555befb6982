//! Materialization of registration entries.
//!
//! The resolver dispatches on the entry kind. Factories are invoked with the container.
//! Type names are auto-wired from their declared parameter manifest, and every
//! capability parameter is resolved through the container's caching path, so nested
//! dependencies are shared. Recipes are auto-wired first, then their literals are
//! assigned field by field.

use std::cell::RefCell;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{Erased, TypeDescriptor};
use crate::{
    Arguments, Container, ContainerError, Instance, ParameterKind, RegistrationEntry,
    UntypedParameterPolicy,
};

/// Label used as the capability of an untyped parameter in errors.
const UNTYPED: &str = "<untyped>";

thread_local! {
    /// Keys being materialized on this thread, tagged with their container id.
    static RESOLUTION_STACK: RefCell<Vec<(u64, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as in flight on the current thread for as long as it lives.
pub(crate) struct ResolutionGuard(());

impl ResolutionGuard {
    /// # Errors
    ///
    /// - [`ContainerError::CircularDependency`] if the key is already in flight on this
    ///   thread for the same container
    pub(crate) fn enter(container_id: u64, key: &str) -> Result<Self, ContainerError> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(start) = stack
                .iter()
                .position(|(id, k)| *id == container_id && k == key)
            {
                let mut chain: Vec<String> = stack[start..]
                    .iter()
                    .filter(|(id, _)| *id == container_id)
                    .map(|(_, k)| k.clone())
                    .collect();
                chain.push(key.to_string());
                warn!(chain = %chain.join(" -> "), "circular dependency");
                return Err(ContainerError::CircularDependency { chain });
            }
            stack.push((container_id, key.to_string()));
            Ok(ResolutionGuard(()))
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    policy: UntypedParameterPolicy,
}

impl Resolver {
    pub fn new(policy: UntypedParameterPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UntypedParameterPolicy {
        self.policy
    }

    /// Builds an instance for `key` from its entry. Never touches the cache itself.
    pub fn materialize(
        &self,
        container: &Container,
        key: &str,
        entry: &RegistrationEntry,
    ) -> Result<Instance, ContainerError> {
        match entry {
            RegistrationEntry::Factory(factory) => factory(container),
            RegistrationEntry::TypeName(type_name) => {
                let descriptor = Self::descriptor(container, key, type_name)?;
                self.autowire(container, &descriptor).map(Arc::from)
            }
            RegistrationEntry::Recipe { type_name, fields } => {
                let descriptor = Self::descriptor(container, key, type_name)?;
                let mut value = self.autowire(container, &descriptor)?;
                for (field, literal) in fields {
                    descriptor.set_field(&mut value, field, literal)?;
                }
                Ok(Arc::from(value))
            }
        }
    }

    fn descriptor(
        container: &Container,
        key: &str,
        type_name: &str,
    ) -> Result<Arc<TypeDescriptor>, ContainerError> {
        container
            .catalog()
            .get(type_name)
            .ok_or_else(|| ContainerError::InvalidEntry {
                key: key.to_string(),
                reason: format!("type '{type_name}' is not declared"),
            })
    }

    /// Collects every declared parameter, then constructs once.
    fn autowire(
        &self,
        container: &Container,
        descriptor: &TypeDescriptor,
    ) -> Result<Erased, ContainerError> {
        let type_name = descriptor.type_name();
        let mut args = Arguments::new(type_name);

        for parameter in descriptor.parameters() {
            let unresolved = |capability: &str| ContainerError::UnresolvedDependency {
                capability: capability.to_string(),
                parameter: parameter.name().to_string(),
                type_name: type_name.to_string(),
            };

            let value = match parameter.kind() {
                ParameterKind::Capability(capability) => match container.resolve(capability)? {
                    Some(instance) => Some(instance),
                    None => parameter
                        .default_value()
                        .ok_or_else(|| unresolved(capability))?,
                },
                ParameterKind::Untyped => match self.policy {
                    UntypedParameterPolicy::UseDefault => {
                        parameter.default_value().ok_or_else(|| unresolved(UNTYPED))?
                    }
                    UntypedParameterPolicy::ShortCircuit => {
                        debug!(
                            type_name,
                            parameter = parameter.name(),
                            "untyped parameter, using no-argument form"
                        );
                        return descriptor
                            .default_form()
                            .ok_or_else(|| unresolved(UNTYPED));
                    }
                },
            };
            args.push(parameter.name(), value);
        }

        descriptor.construct(&args)
    }
}
