//! Registration entries: how the container builds an instance for a key.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::{Container, ContainerError};

/// A materialized, type-erased instance. Identity is `Arc::ptr_eq`.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A factory receives the container so it can resolve its own dependencies.
pub type FactoryFn = dyn Fn(&Container) -> Result<Instance, ContainerError> + Send + Sync;

/// Recipe literals, assigned onto fields in declared order.
pub type Fields = Vec<(String, Value)>;

/// Name of the recipe field that selects the target type in configuration literals.
pub const CLASS_FIELD: &str = "class";

/// The recipe telling the resolver how to build an instance for a key.
#[derive(Clone)]
pub enum RegistrationEntry {
    /// Invoke the callable with the container and return its result verbatim.
    Factory(Arc<FactoryFn>),

    /// Auto-wire `type_name`, then overwrite `fields` on the result.
    Recipe { type_name: String, fields: Fields },

    /// Auto-wire the declared type with this name.
    TypeName(String),
}

impl RegistrationEntry {
    /// Wraps a typed factory. The returned value is stored behind an `Arc`.
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        RegistrationEntry::Factory(Arc::new(move |container: &Container| {
            factory(container).map(|value| Arc::new(value) as Instance)
        }))
    }

    /// Wraps a factory that already produces a type-erased instance.
    pub fn factory_instance<F>(factory: F) -> Self
    where
        F: Fn(&Container) -> Result<Instance, ContainerError> + Send + Sync + 'static,
    {
        RegistrationEntry::Factory(Arc::new(factory))
    }

    pub fn type_name(type_name: impl Into<String>) -> Self {
        RegistrationEntry::TypeName(type_name.into())
    }

    /// A recipe entry. A `class` member among the fields is dropped, as in
    /// [`RegistrationEntry::from_literal`].
    pub fn recipe<K, I>(type_name: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        RegistrationEntry::Recipe {
            type_name: type_name.into(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .filter(|(k, _): &(String, Value)| k != CLASS_FIELD)
                .collect(),
        }
    }

    /// Interprets a configuration literal.
    ///
    /// A string names a type; an object with a string `class` member is a recipe whose
    /// remaining members are the field literals. Anything else is an invalid entry.
    pub fn from_literal(key: &str, literal: Value) -> Result<Self, ContainerError> {
        match literal {
            Value::String(type_name) => Ok(RegistrationEntry::TypeName(type_name)),
            Value::Object(mut map) => {
                let type_name = match map.shift_remove(CLASS_FIELD) {
                    Some(Value::String(name)) => name,
                    Some(other) => {
                        return Err(ContainerError::InvalidEntry {
                            key: key.to_string(),
                            reason: format!("'{CLASS_FIELD}' must be a string, found {other}"),
                        })
                    }
                    None => {
                        return Err(ContainerError::InvalidEntry {
                            key: key.to_string(),
                            reason: format!("recipe is missing the '{CLASS_FIELD}' member"),
                        })
                    }
                };
                Ok(RegistrationEntry::Recipe {
                    type_name,
                    fields: map.into_iter().collect(),
                })
            }
            other => Err(ContainerError::InvalidEntry {
                key: key.to_string(),
                reason: format!("expected a type name or a recipe, found {other}"),
            }),
        }
    }

    /// Short label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistrationEntry::Factory(_) => "factory",
            RegistrationEntry::Recipe { .. } => "recipe",
            RegistrationEntry::TypeName(_) => "type",
        }
    }
}

impl fmt::Debug for RegistrationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationEntry::Factory(_) => f.write_str("Factory(..)"),
            RegistrationEntry::Recipe { type_name, fields } => f
                .debug_struct("Recipe")
                .field("type_name", type_name)
                .field("fields", fields)
                .finish(),
            RegistrationEntry::TypeName(name) => f.debug_tuple("TypeName").field(name).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_literal_is_type_name() {
        let entry = RegistrationEntry::from_literal("A", json!("Mailer")).unwrap();
        assert!(matches!(entry, RegistrationEntry::TypeName(ref n) if n == "Mailer"));
    }

    #[test]
    fn test_object_literal_is_recipe_without_class_field() {
        let literal = json!({ "class": "Smtp", "host": "localhost", "port": 25 });
        let entry = RegistrationEntry::from_literal("Mailer", literal).unwrap();
        match entry {
            RegistrationEntry::Recipe { type_name, fields } => {
                assert_eq!(type_name, "Smtp");
                let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(names, vec!["host", "port"]);
            }
            other => panic!("expected recipe, got {other:?}"),
        }
    }

    #[test]
    fn test_recipe_without_class_is_invalid() {
        let err = RegistrationEntry::from_literal("Mailer", json!({ "host": "x" })).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidEntry { ref key, .. } if key == "Mailer"));
    }

    #[test]
    fn test_non_string_class_is_invalid() {
        let err = RegistrationEntry::from_literal("Mailer", json!({ "class": 3 })).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidEntry { .. }));
    }

    #[test]
    fn test_number_literal_is_invalid() {
        let err = RegistrationEntry::from_literal("N", json!(42)).unwrap_err();
        assert_eq!(
            err,
            ContainerError::InvalidEntry {
                key: "N".into(),
                reason: "expected a type name or a recipe, found 42".into(),
            }
        );
    }

    #[test]
    fn test_recipe_drops_class_field() {
        let entry = RegistrationEntry::recipe(
            "Smtp",
            [("class", json!("Other")), ("host", json!("localhost"))],
        );
        match entry {
            RegistrationEntry::Recipe { type_name, fields } => {
                assert_eq!(type_name, "Smtp");
                assert_eq!(fields, vec![("host".to_string(), json!("localhost"))]);
            }
            other => panic!("expected recipe, got {other:?}"),
        }
    }

    #[test]
    fn test_kind_and_debug() {
        let entry = RegistrationEntry::factory(|_| Ok(1u8));
        assert_eq!(entry.kind(), "factory");
        assert_eq!(format!("{entry:?}"), "Factory(..)");
        assert_eq!(RegistrationEntry::type_name("T").kind(), "type");
    }
}
