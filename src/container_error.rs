use thiserror::Error;

/// Errors surfaced by container operations.
///
/// Every variant is reported synchronously to the immediate caller. The container
/// never retries a failed materialization and never caches its partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// The key already has a registration entry.
    #[error("key '{key}' is already registered")]
    DuplicateKey { key: String },

    /// The key has a cached instance, so its entry can no longer be removed.
    #[error("key '{key}' is already materialized and cannot be unregistered")]
    AlreadyMaterialized { key: String },

    /// Auto-wiring could not satisfy a required constructor parameter.
    #[error(
        "cannot resolve '{capability}' for parameter '{parameter}' while constructing '{type_name}'"
    )]
    UnresolvedDependency {
        capability: String,
        parameter: String,
        type_name: String,
    },

    /// An explicit construction was requested for a key that was never registered.
    #[error("key '{key}' is not registered")]
    UnknownKey { key: String },

    /// A registration entry cannot be materialized.
    #[error("invalid entry for '{key}': {reason}")]
    InvalidEntry { key: String, reason: String },

    /// Resolution re-entered a key that is still being materialized.
    #[error("circular dependency: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// A type name was declared twice in the same container.
    #[error("type '{type_name}' is already declared")]
    DuplicateType { type_name: String },

    /// A recipe names a field the target type does not accept.
    #[error("type '{type_name}' has no assignable field '{field}'")]
    UnknownField { type_name: String, field: String },

    /// A recipe literal does not have the shape the field expects.
    #[error("invalid value for field '{field}' of '{type_name}': {reason}")]
    InvalidFieldValue {
        type_name: String,
        field: String,
        reason: String,
    },

    /// A materialized instance is not of the requested Rust type.
    #[error("instance for '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// Loading a container configuration failed.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_display() {
        let err = ContainerError::DuplicateKey {
            key: "Logger".into(),
        };
        assert_eq!(err.to_string(), "key 'Logger' is already registered");
    }

    #[test]
    fn test_unresolved_dependency_names_capability_and_type() {
        let err = ContainerError::UnresolvedDependency {
            capability: "Cache".into(),
            parameter: "cache".into(),
            type_name: "UserService".into(),
        };
        let text = err.to_string();
        assert!(text.contains("Cache"));
        assert!(text.contains("UserService"));
    }

    #[test]
    fn test_circular_dependency_display() {
        let err = ContainerError::CircularDependency {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "circular dependency: A -> B -> A");
    }

    #[test]
    fn test_equality() {
        let a = ContainerError::UnknownKey { key: "x".into() };
        assert_eq!(a.clone(), a);
        assert_ne!(
            a,
            ContainerError::AlreadyMaterialized { key: "x".into() }
        );
    }

    #[test]
    fn test_error_trait() {
        let err: &dyn std::error::Error = &ContainerError::UnknownKey { key: "x".into() };
        assert_eq!(err.to_string(), "key 'x' is not registered");
    }
}
