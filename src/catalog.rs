//! Type catalog: declared type name → type-erased constructor manifest.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::{Arguments, ContainerError, FieldError, Injectable, Parameter};

/// A value under construction, before it is frozen behind an `Arc`.
pub type Erased = Box<dyn Any + Send + Sync>;

type ConstructFn = fn(&Arguments) -> Result<Erased, ContainerError>;
type DefaultFormFn = fn() -> Option<Erased>;
type SetFieldFn = fn(&mut Erased, &str, &Value) -> Result<(), FieldError>;

/// Everything the resolver knows about a declared type.
pub struct TypeDescriptor {
    type_name: String,
    parameters: Vec<Parameter>,
    construct: ConstructFn,
    default_form: DefaultFormFn,
    set_field: SetFieldFn,
}

impl TypeDescriptor {
    pub fn of<T: Injectable>(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            parameters: T::parameters(),
            construct: construct_erased::<T>,
            default_form: default_form_erased::<T>,
            set_field: set_field_erased::<T>,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn construct(&self, args: &Arguments) -> Result<Erased, ContainerError> {
        (self.construct)(args)
    }

    pub(crate) fn default_form(&self) -> Option<Erased> {
        (self.default_form)()
    }

    pub(crate) fn set_field(
        &self,
        target: &mut Erased,
        field: &str,
        value: &Value,
    ) -> Result<(), ContainerError> {
        (self.set_field)(target, field, value).map_err(|e| match e {
            FieldError::Unknown => ContainerError::UnknownField {
                type_name: self.type_name.clone(),
                field: field.to_string(),
            },
            FieldError::Invalid(reason) => ContainerError::InvalidFieldValue {
                type_name: self.type_name.clone(),
                field: field.to_string(),
                reason,
            },
        })
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

fn construct_erased<T: Injectable>(args: &Arguments) -> Result<Erased, ContainerError> {
    T::construct(args).map(|value| Box::new(value) as Erased)
}

fn default_form_erased<T: Injectable>() -> Option<Erased> {
    T::default_form().map(|value| Box::new(value) as Erased)
}

fn set_field_erased<T: Injectable>(
    target: &mut Erased,
    field: &str,
    value: &Value,
) -> Result<(), FieldError> {
    match (**target).downcast_mut::<T>() {
        Some(target) => target.set_field(field, value),
        None => Err(FieldError::Invalid(format!(
            "target is not a {}",
            std::any::type_name::<T>()
        ))),
    }
}

/// Declared types of one container. Declarations are write-once like registrations.
#[derive(Default)]
pub struct TypeCatalog {
    types: RwLock<HashMap<String, Arc<TypeDescriptor>>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&self, descriptor: TypeDescriptor) -> Result<(), ContainerError> {
        let mut types = self.types.write().unwrap_or_else(|p| p.into_inner());
        if types.contains_key(descriptor.type_name()) {
            return Err(ContainerError::DuplicateType {
                type_name: descriptor.type_name().to_string(),
            });
        }
        debug!(
            type_name = descriptor.type_name(),
            parameters = descriptor.parameters().len(),
            "declared type"
        );
        types.insert(descriptor.type_name().to_string(), Arc::new(descriptor));
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(type_name)
            .cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(type_name)
    }
}
