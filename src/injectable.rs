//! Statically declared constructor manifests.
//!
//! A type takes part in auto-wiring by implementing [`Injectable`]: it lists its
//! constructor parameters in order and builds itself from the collected [`Arguments`].
//! The resolver never inspects a type beyond what the manifest declares.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::{ContainerError, Instance};

/// A type the container can build from a declared parameter manifest.
///
/// # Examples
///
/// ```rust
/// use autowire::{Arguments, Container, ContainerError, Injectable, Parameter};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn construct(_: &Arguments) -> Result<Self, ContainerError> {
///         Ok(Clock)
///     }
/// }
///
/// struct Scheduler {
///     clock: Arc<Clock>,
/// }
/// impl Injectable for Scheduler {
///     fn parameters() -> Vec<Parameter> {
///         vec![Parameter::capability("clock", "Clock")]
///     }
///     fn construct(args: &Arguments) -> Result<Self, ContainerError> {
///         Ok(Scheduler { clock: args.required(0)? })
///     }
/// }
///
/// let container = Container::new();
/// container.declare_type::<Clock>("Clock").unwrap();
/// container.declare_type::<Scheduler>("Scheduler").unwrap();
/// container.register_type("Clock", "Clock").unwrap();
/// container.register_type("Scheduler", "Scheduler").unwrap();
///
/// let scheduler: Arc<Scheduler> = container.resolve_as("Scheduler").unwrap().unwrap();
/// let clock: Arc<Clock> = container.resolve_as("Clock").unwrap().unwrap();
/// assert!(Arc::ptr_eq(&scheduler.clock, &clock));
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Constructor parameters in positional order. Empty means a no-argument constructor.
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    /// Builds the value from arguments collected for [`Injectable::parameters`].
    fn construct(args: &Arguments) -> Result<Self, ContainerError>;

    /// The no-argument form, used when an untyped parameter short-circuits auto-wiring.
    fn default_form() -> Option<Self> {
        None
    }

    /// Assigns a recipe literal onto a field after construction.
    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), FieldError> {
        let _ = (field, value);
        Err(FieldError::Unknown)
    }
}

/// Why a recipe literal could not be assigned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field")]
    Unknown,
    #[error("{0}")]
    Invalid(String),
}

/// Strictly deserializes a recipe literal into a field's type. No coercion is applied.
pub fn literal<T: DeserializeOwned>(value: &Value) -> Result<T, FieldError> {
    serde_json::from_value(value.clone()).map_err(|e| FieldError::Invalid(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// Declared as a registered capability key.
    Capability(String),
    /// No class-like type; a primitive or legacy untyped parameter.
    Untyped,
}

/// What to pass when a parameter cannot be resolved.
#[derive(Debug, Clone)]
pub enum Fallback {
    Required,
    /// Pass no value; the constructor reads it with [`Arguments::optional`].
    Absent,
    Value(Instance),
}

/// One entry of a constructor manifest.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    fallback: Fallback,
}

impl Parameter {
    pub fn capability(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Capability(key.into()),
            fallback: Fallback::Required,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Untyped,
            fallback: Fallback::Required,
        }
    }

    pub fn with_default<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.with_default_instance(Arc::new(value))
    }

    pub fn with_default_instance(mut self, value: Instance) -> Self {
        self.fallback = Fallback::Value(value);
        self
    }

    /// Marks the parameter optional with an absent default.
    pub fn optional(mut self) -> Self {
        self.fallback = Fallback::Absent;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    /// The default to use, or `None` if the parameter is required.
    pub(crate) fn default_value(&self) -> Option<Option<Instance>> {
        match &self.fallback {
            Fallback::Required => None,
            Fallback::Absent => Some(None),
            Fallback::Value(value) => Some(Some(value.clone())),
        }
    }
}

/// Positional arguments collected for one construction.
#[derive(Debug)]
pub struct Arguments {
    type_name: String,
    names: Vec<String>,
    values: Vec<Option<Instance>>,
}

impl Arguments {
    pub(crate) fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, name: &str, value: Option<Instance>) {
        self.names.push(name.to_string());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The argument at `index`, or `None` if its parameter fell back to an absent default.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::InvalidEntry`] if no parameter was collected at `index`
    /// - [`ContainerError::TypeMismatch`] if the argument is not a `T`
    pub fn optional<T: Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<Option<Arc<T>>, ContainerError> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| ContainerError::InvalidEntry {
                key: self.type_name.clone(),
                reason: format!("no argument at position {index}"),
            })?;

        match value {
            None => Ok(None),
            Some(instance) => instance.clone().downcast::<T>().map(Some).map_err(|_| {
                ContainerError::TypeMismatch {
                    key: format!("{}({})", self.type_name, self.names[index]),
                    expected: std::any::type_name::<T>(),
                }
            }),
        }
    }

    /// The argument at `index`, which must be present.
    pub fn required<T: Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<Arc<T>, ContainerError> {
        self.optional(index)?
            .ok_or_else(|| ContainerError::UnresolvedDependency {
                capability: std::any::type_name::<T>().to_string(),
                parameter: self.names[index].clone(),
                type_name: self.type_name.clone(),
            })
    }
}
