//! # secretsmanager-loader core settings
//!
//! This crate provides the settings type shared by the loader library and its
//! command line, together with the parsing logic for the optional settings file.
//!
//! A loader is configured by three independent values plus the client backend:
//!
//! - **environment**: the deployment label embedded in every storage key
//!   (`secrets/{environment}/{service}`)
//! - **profile_name**: the credential profile used when acquiring a client
//! - **region**: the target region used when acquiring a client
//! - **client**: a client backend URI such as `aws://` or `file:///srv/secrets`
//!
//! Each value is optional. Missing values are filled from the process
//! environment and then from the settings file, in that order.
//!
//! ## Settings File
//!
//! ```toml
//! [secretsmanager]
//! environment = "prod"
//! profile_name = "ops"
//! region = "us-east-1"
//! client = "aws://"
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable holding the deployment label.
pub const ENVIRONMENT_VAR: &str = "SECRETSMANAGER_ENVIRONMENT";
/// Environment variable holding the credential profile.
pub const PROFILE_VAR: &str = "AWS_PROFILE";
/// Environment variables holding the region, in lookup order.
pub const REGION_VARS: [&str; 2] = ["AWS_REGION", "AWS_DEFAULT_REGION"];
/// Environment variable holding the client backend URI.
pub const CLIENT_VAR: &str = "SECRETSMANAGER_CLIENT";

/// Construction-time configuration of a loader.
///
/// No field is validated when a loader is built from these settings; a
/// missing environment or an unusable profile/region only surfaces once a
/// fetch is attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// Deployment label used in the storage key (e.g., "dev", "prod")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Credential profile selector for client acquisition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    /// Target region for client acquisition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Client backend URI; the `aws` backend is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

impl LoaderSettings {
    /// Builds settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        Self {
            environment: get(ENVIRONMENT_VAR),
            profile_name: get(PROFILE_VAR),
            region: REGION_VARS.iter().find_map(|name| get(*name)),
            client: get(CLIENT_VAR),
        }
    }

    /// Merge another set of settings into this one.
    ///
    /// The current settings take precedence - values from `other`
    /// are only used where this one is unset.
    pub fn merge_with(&mut self, other: LoaderSettings) {
        if self.environment.is_none() {
            self.environment = other.environment;
        }
        if self.profile_name.is_none() {
            self.profile_name = other.profile_name;
        }
        if self.region.is_none() {
            self.region = other.region;
        }
        if self.client.is_none() {
            self.client = other.client;
        }
    }

    /// Validate the settings.
    ///
    /// Ensures that:
    /// - Every value that is present is non-empty
    /// - The environment does not contain a `/`, which would change the
    ///   shape of every storage key
    ///
    /// # Errors
    ///
    /// Returns a `ParseError::Validation` describing the first offending field.
    pub fn validate(&self) -> Result<(), ParseError> {
        let fields = [
            ("environment", &self.environment),
            ("profile_name", &self.profile_name),
            ("region", &self.region),
            ("client", &self.client),
        ];
        for (field, value) in fields {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ParseError::Validation(format!(
                    "'{}' cannot be empty",
                    field
                )));
            }
        }

        match &self.environment {
            Some(environment) => validate_environment(environment),
            None => Ok(()),
        }
    }

    /// Returns the platform-specific location of the default settings file,
    /// typically `~/.config/secretsmanager-loader/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "secretsmanager-loader")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the default settings file if it exists.
    pub fn load_default() -> Result<Option<Self>, ParseError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::try_from(path.as_path()).map(Some),
            _ => Ok(None),
        }
    }
}

/// On-disk layout of the settings file.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    secretsmanager: LoaderSettings,
}

/// Checks that an environment label can be used as a single storage key segment.
pub fn validate_environment(environment: &str) -> Result<(), ParseError> {
    if environment.trim().is_empty() {
        return Err(ParseError::Validation("'environment' cannot be empty".into()));
    }
    if environment.contains('/') {
        return Err(ParseError::Validation(format!(
            "environment '{}' cannot contain '/'",
            environment
        )));
    }
    Ok(())
}

impl FromStr for LoaderSettings {
    type Err = ParseError;

    /// Parse settings from a TOML string.
    ///
    /// A document without a `[secretsmanager]` table yields empty settings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let file: SettingsFile = toml::from_str(s)?;
        file.secretsmanager.validate()?;
        Ok(file.secretsmanager)
    }
}

impl TryFrom<&Path> for LoaderSettings {
    type Error = ParseError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let content = fs::read_to_string(path).map_err(|e| {
            ParseError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read settings file {}: {}", path.display(), e),
            ))
        })?;
        content.parse()
    }
}

/// Errors that can occur when reading loader settings.
#[derive(Debug)]
pub enum ParseError {
    /// I/O error when reading the settings file
    Io(io::Error),
    /// TOML parsing error
    Toml(toml::de::Error),
    /// Validation error
    Validation(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io(e) => write!(f, "I/O error: {}", e),
            ParseError::Toml(e) => write!(f, "TOML parsing error: {}", e),
            ParseError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            ParseError::Toml(e) => Some(e),
            ParseError::Validation(_) => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::Io(e)
    }
}

impl From<toml::de::Error> for ParseError {
    fn from(e: toml::de::Error) -> Self {
        ParseError::Toml(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let settings = LoaderSettings::from_lookup(lookup_from(&[
            ("SECRETSMANAGER_ENVIRONMENT", "prod"),
            ("AWS_PROFILE", "ops"),
            ("AWS_REGION", "eu-west-1"),
            ("SECRETSMANAGER_CLIENT", "file:///srv/secrets"),
        ]));

        assert_eq!(settings.environment.as_deref(), Some("prod"));
        assert_eq!(settings.profile_name.as_deref(), Some("ops"));
        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        assert_eq!(settings.client.as_deref(), Some("file:///srv/secrets"));
    }

    #[test]
    fn test_from_lookup_region_fallback_and_empty_values() {
        let settings = LoaderSettings::from_lookup(lookup_from(&[
            ("SECRETSMANAGER_ENVIRONMENT", ""),
            ("AWS_REGION", ""),
            ("AWS_DEFAULT_REGION", "us-east-2"),
        ]));

        assert_eq!(settings.environment, None);
        assert_eq!(settings.profile_name, None);
        assert_eq!(settings.region.as_deref(), Some("us-east-2"));
    }

    #[test]
    fn test_merge_with_keeps_existing_values() {
        let mut settings = LoaderSettings {
            environment: Some("dev".into()),
            ..Default::default()
        };
        settings.merge_with(LoaderSettings {
            environment: Some("prod".into()),
            region: Some("us-west-2".into()),
            ..Default::default()
        });

        assert_eq!(settings.environment.as_deref(), Some("dev"));
        assert_eq!(settings.region.as_deref(), Some("us-west-2"));
        assert_eq!(settings.profile_name, None);
    }

    #[test]
    fn test_parse_settings_table() {
        let settings: LoaderSettings = r#"
[secretsmanager]
environment = "prod"
profile_name = "ops"
region = "us-east-1"
"#
        .parse()
        .unwrap();

        assert_eq!(settings.environment.as_deref(), Some("prod"));
        assert_eq!(settings.profile_name.as_deref(), Some("ops"));
        assert_eq!(settings.region.as_deref(), Some("us-east-1"));
        assert_eq!(settings.client, None);
    }

    #[test]
    fn test_parse_without_table_is_empty() {
        let settings: LoaderSettings = "".parse().unwrap();
        assert_eq!(settings, LoaderSettings::default());
    }

    #[test]
    fn test_validation_rejects_slash_in_environment() {
        let result = "[secretsmanager]\nenvironment = \"prod/eu\"\n".parse::<LoaderSettings>();
        match result {
            Err(ParseError::Validation(msg)) => assert!(msg.contains("prod/eu")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_environment() {
        assert!(validate_environment("prod").is_ok());
        assert!(validate_environment("Prod_EU").is_ok());
        assert!(matches!(
            validate_environment("prod/eu"),
            Err(ParseError::Validation(_))
        ));
        assert!(matches!(validate_environment(" "), Err(ParseError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_empty_values() {
        let result = "[secretsmanager]\nregion = \"  \"\n".parse::<LoaderSettings>();
        assert!(matches!(result, Err(ParseError::Validation(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = "[secretsmanager\n".parse::<LoaderSettings>();
        assert!(matches!(result, Err(ParseError::Toml(_))));
    }

    #[test]
    fn test_try_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[secretsmanager]\nenvironment = \"staging\"\n").unwrap();

        let settings = LoaderSettings::try_from(path.as_path()).unwrap();
        assert_eq!(settings.environment.as_deref(), Some("staging"));

        let missing = temp_dir.path().join("missing.toml");
        assert!(matches!(
            LoaderSettings::try_from(missing.as_path()),
            Err(ParseError::Io(_))
        ));
    }
}
