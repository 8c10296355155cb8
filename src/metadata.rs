//! Service descriptors supplied by the configuration-assembly framework

use crate::{LoaderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The capability contract a caller must satisfy to request configuration.
///
/// A descriptor names the service and may flag a local environment. When
/// either flag is set the loader returns an empty mapping without touching
/// the secret store, so local and test runs need neither credentials nor
/// network access.
pub trait ServiceDescriptor {
    /// The logical service name; must not be empty.
    fn name(&self) -> &str;

    fn debug(&self) -> bool {
        false
    }

    fn testing(&self) -> bool {
        false
    }
}

/// The standard descriptor.
///
/// # Example
///
/// ```ignore
/// let metadata = Metadata::new("billing_service").with_testing(true);
/// assert!(metadata.testing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub testing: bool,
}

impl Metadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            debug: false,
            testing: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_testing(mut self, testing: bool) -> Self {
        self.testing = testing;
        self
    }
}

impl ServiceDescriptor for Metadata {
    fn name(&self) -> &str {
        &self.name
    }

    fn debug(&self) -> bool {
        self.debug
    }

    fn testing(&self) -> bool {
        self.testing
    }
}

impl TryFrom<&Value> for Metadata {
    type Error = LoaderError;

    /// Validates an untyped descriptor.
    ///
    /// The value must be an object with a non-empty string `name` and, when
    /// present, boolean `debug` and `testing` flags. A bare string is not
    /// accepted as a service name: it cannot express the environment flags.
    fn try_from(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            LoaderError::InvalidMetadata(format!(
                "expected a service descriptor object, got {}",
                describe(value)
            ))
        })?;

        let name = match object.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            Some(Value::String(_)) => {
                return Err(LoaderError::InvalidMetadata(
                    "descriptor name cannot be empty".to_string(),
                ));
            }
            Some(other) => {
                return Err(LoaderError::InvalidMetadata(format!(
                    "descriptor name must be a string, got {}",
                    describe(other)
                )));
            }
            None => {
                return Err(LoaderError::InvalidMetadata(
                    "descriptor has no name".to_string(),
                ));
            }
        };

        Ok(Self {
            name,
            debug: flag(object, "debug")?,
            testing: flag(object, "testing")?,
        })
    }
}

impl TryFrom<&str> for Metadata {
    type Error = LoaderError;

    /// Parses a descriptor from a JSON document such as
    /// `{"name": "billing", "testing": true}`.
    fn try_from(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s).map_err(|_| {
            LoaderError::InvalidMetadata(format!(
                "expected a JSON service descriptor, got '{}'",
                s
            ))
        })?;
        Self::try_from(&value)
    }
}

fn flag(object: &serde_json::Map<String, Value>, field: &str) -> Result<bool> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(LoaderError::InvalidMetadata(format!(
            "descriptor flag '{}' must be a boolean, got {}",
            field,
            describe(other)
        ))),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
