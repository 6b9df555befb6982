//! Container options and bulk registration from JSON or TOML.
//!
//! ```toml
//! [options]
//! untyped_parameters = "short_circuit"
//!
//! [entries]
//! Clock = "SystemClock"
//! Mailer = { class = "SmtpMailer", host = "localhost", port = 25 }
//! ```
//!
//! A string entry names a declared type. A table entry is a recipe: `class` names the
//! type, every other member is assigned onto the built value in declared order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ContainerError, RegistrationEntry};

/// How auto-wiring treats a parameter with no capability type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntypedParameterPolicy {
    /// Use the parameter's declared default and continue with the next parameter.
    #[default]
    UseDefault,
    /// Abandon the walk and build the type from its no-argument form.
    ShortCircuit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    pub untyped_parameters: UntypedParameterPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub options: ContainerOptions,
    /// Key → literal, in declared order.
    pub entries: Map<String, Value>,
}

impl ContainerConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ContainerError> {
        serde_json::from_str(source).map_err(|e| ContainerError::Config(e.to_string()))
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ContainerError> {
        toml::from_str(source).map_err(|e| ContainerError::Config(e.to_string()))
    }

    /// Loads a `.json` or `.toml` file, chosen by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ContainerError::Config(format!("{}: {e}", path.display())))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&source),
            Some("toml") => Self::from_toml_str(&source),
            _ => Err(ContainerError::Config(format!(
                "{}: unsupported configuration format",
                path.display()
            ))),
        }
    }

    /// Interprets every entry literal, in declared order.
    pub fn registrations(&self) -> Result<Vec<(String, RegistrationEntry)>, ContainerError> {
        self.entries
            .iter()
            .map(|(key, literal)| {
                RegistrationEntry::from_literal(key, literal.clone()).map(|e| (key.clone(), e))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContainerConfig::from_json_str("{}").unwrap();
        assert_eq!(
            config.options.untyped_parameters,
            UntypedParameterPolicy::UseDefault
        );
        assert!(config.entries.is_empty());
    }

    #[test]
    fn test_json_entries_keep_order() {
        let config = ContainerConfig::from_json_str(
            r#"{
                "options": { "untyped_parameters": "short_circuit" },
                "entries": {
                    "Zeta": "Z",
                    "Alpha": { "class": "A", "second": 2, "first": 1 }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.options.untyped_parameters,
            UntypedParameterPolicy::ShortCircuit
        );
        let registrations = config.registrations().unwrap();
        assert_eq!(registrations[0].0, "Zeta");
        match &registrations[1].1 {
            RegistrationEntry::Recipe { type_name, fields } => {
                assert_eq!(type_name, "A");
                assert_eq!(fields[0].0, "second");
                assert_eq!(fields[1].0, "first");
            }
            other => panic!("expected recipe, got {other:?}"),
        }
    }

    #[test]
    fn test_toml_entries() {
        let config = ContainerConfig::from_toml_str(
            r#"
            [entries]
            Clock = "SystemClock"
            Mailer = { class = "SmtpMailer", host = "localhost" }
            "#,
        )
        .unwrap();

        let registrations = config.registrations().unwrap();
        assert_eq!(registrations.len(), 2);
        assert!(matches!(
            registrations[0].1,
            RegistrationEntry::TypeName(ref n) if n == "SystemClock"
        ));
        assert!(matches!(registrations[1].1, RegistrationEntry::Recipe { .. }));
    }

    #[test]
    fn test_invalid_literal() {
        let config = ContainerConfig::from_json_str(r#"{ "entries": { "N": [1, 2] } }"#).unwrap();
        assert!(matches!(
            config.registrations(),
            Err(ContainerError::InvalidEntry { ref key, .. }) if key == "N"
        ));
    }

    #[test]
    fn test_bad_policy_is_config_error() {
        let err = ContainerConfig::from_json_str(
            r#"{ "options": { "untyped_parameters": "guess" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ContainerError::Config(_)));
    }
}
