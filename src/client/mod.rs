//! # Secret Store Clients
//!
//! The client module is the only seam between the loader and the remote secret
//! store. The loader never talks to a transport directly: it asks a
//! [`ClientFactory`] for a [`SecretsManagerClient`] and issues exactly one
//! "get secret value" call per load.
//!
//! ## Available Backends
//!
//! - [`AwsClient`]: AWS Secrets Manager through the AWS SDK (default)
//! - [`FileClient`]: response envelopes stored as JSON files in a local directory
//!
//! ## URI-Based Configuration
//!
//! Backends are selected by URI scheme:
//!
//! ```text
//! aws://
//! aws://ops@us-east-1
//! aws://?endpoint_url=http://localhost:4566
//! file:///srv/secrets
//! file:fixtures/secrets
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use secretsmanager_loader::client::{create_client, GetSecretValueRequest};
//!
//! let client = create_client("aws://ops@us-east-1", &LoaderSettings::default())?;
//! let output = client.get_secret_value(&GetSecretValueRequest::new("secrets/dev/billing"))?;
//! ```

use crate::{LoaderError, Result};
use secretsmanager_loader_core::LoaderSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub mod aws;
pub mod file;
#[macro_use]
pub mod macros;


pub use aws::{AwsClient, AwsConfig};
pub use file::{FileClient, FileConfig};

pub use macros::{CLIENT_REGISTRY, ClientConstructor, ClientRegistration};

/// Client backend used when the settings do not name one.
pub const DEFAULT_CLIENT: &str = "aws";

/// A point fetch of one secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSecretValueRequest {
    /// The storage key of the secret
    pub secret_id: String,
    /// Version stage to read; the current version when `None`
    pub version_stage: Option<String>,
}

impl GetSecretValueRequest {
    pub fn new(secret_id: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            version_stage: None,
        }
    }

    pub fn with_version_stage(mut self, version_stage: Option<&str>) -> Self {
        self.version_stage = version_stage.map(str::to_string);
        self
    }
}

/// The store's response envelope.
///
/// Field names follow the store's wire format. Only `SecretString` drives the
/// loader; the remaining fields are informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSecretValueOutput {
    #[serde(rename = "ARN", default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "VersionId", default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(rename = "VersionStages", default, skip_serializing_if = "Vec::is_empty")]
    pub version_stages: Vec<String>,
    #[serde(rename = "SecretString", default, skip_serializing_if = "Option::is_none")]
    pub secret_string: Option<String>,
}

impl GetSecretValueOutput {
    /// An envelope carrying only a secret string.
    pub fn with_secret_string(secret_string: impl Into<String>) -> Self {
        Self {
            secret_string: Some(secret_string.into()),
            ..Default::default()
        }
    }
}

/// Store-level failures of a single fetch.
///
/// The loader never retries. Callers that layer their own retry policy can use
/// [`FetchError::is_retryable`] to tell transient failures from permanent ones.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("secret not found: {0}")]
    NotFound(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("request throttled: {0}")]
    Throttled(String),
    #[error("transport failure: {0}")]
    Transport(String),
    /// The store rejected the request itself, e.g. a secret scheduled for
    /// deletion, a bad parameter, or an unrecognized error code.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Throttling and transport failures may succeed when repeated. Missing
    /// secrets, permission and decryption errors, rejected requests and
    /// malformed responses will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Throttled(_) | FetchError::Transport(_))
    }
}

/// Trait implemented by every secret store transport.
///
/// # Thread Safety
///
/// Clients must be `Send + Sync`; a factory is free to hand out a shared,
/// pooled client instead of building one per call.
pub trait SecretsManagerClient: Send + Sync {
    /// Fetches one secret by storage key and optional version stage.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` with `secret_string` set when the secret has a string payload
    /// - `Ok(output)` without `secret_string` for binary or empty secrets
    /// - `Err` when the store cannot return a value
    fn get_secret_value(
        &self,
        request: &GetSecretValueRequest,
    ) -> std::result::Result<GetSecretValueOutput, FetchError>;

    /// Returns the name of this client backend.
    ///
    /// This should match the name registered with the client macro.
    fn name(&self) -> &'static str;
}

/// Information about a client backend.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    /// The canonical name of the backend (e.g., "aws", "file").
    pub name: &'static str,
    /// A human-readable description of the backend.
    pub description: &'static str,
    /// Example URIs showing how to configure this backend.
    pub examples: &'static [&'static str],
}

impl ClientInfo {
    /// Formats the backend information for display, including examples if available.
    pub fn display_with_examples(&self) -> String {
        if self.examples.is_empty() {
            format!("{}: {}", self.name, self.description)
        } else {
            format!(
                "{}: {} (e.g., {})",
                self.name,
                self.description,
                self.examples.join(", ")
            )
        }
    }
}

/// Returns a list of all registered client backends with their metadata.
pub fn clients() -> Vec<ClientInfo> {
    CLIENT_REGISTRY
        .iter()
        .map(|reg| reg.info.clone())
        .collect()
}

/// Creates a client from a backend specification.
///
/// Accepts bare backend names (`aws`, `aws:`), full URIs (`aws://ops@us-east-1`)
/// and path forms (`file:/srv/secrets`, `file:relative/dir`). Profile and
/// region from `settings` apply wherever the URI does not set them.
pub fn create_client(spec: &str, settings: &LoaderSettings) -> Result<Box<dyn SecretsManagerClient>> {
    let (scheme, rest) = match spec.find(':') {
        Some(pos) => (&spec[..pos], &spec[pos + 1..]),
        None => (spec, ""),
    };

    let registration = CLIENT_REGISTRY
        .iter()
        .find(|reg| reg.handles(scheme))
        .ok_or_else(|| LoaderError::ClientNotFound(scheme.to_string()))?;

    let url = match rest {
        // Just scheme name (e.g., "aws")
        "" | ":" => parse_url(spec, &format!("{}://", scheme))?,
        // Standard URI format (e.g., "aws://ops@us-east-1")
        s if s.starts_with("//") => parse_url(spec, &format!("{}:{}", scheme, s))?,
        // Absolute path (e.g., "file:/srv/secrets")
        s if s.starts_with('/') => parse_url(spec, &format!("{}://{}", scheme, s))?,
        // Relative directory for the file backend (e.g., "file:fixtures/secrets")
        s if scheme == "file" => {
            let path = std::env::current_dir()?.join(s);
            Url::from_file_path(&path).map_err(|_| {
                LoaderError::ClientOperationFailed(format!(
                    "Invalid client specification '{}': cannot resolve {}",
                    spec,
                    path.display()
                ))
            })?
        }
        // Everything else - assume it's a host component
        s => parse_url(spec, &format!("{}://{}", scheme, s))?,
    };

    tracing::debug!(client = registration.info.name, "creating secrets manager client");
    (registration.factory)(&url, settings)
}

fn parse_url(spec: &str, url_string: &str) -> Result<Url> {
    Url::parse(url_string).map_err(|e| {
        LoaderError::ClientOperationFailed(format!(
            "Invalid client specification '{}': {}",
            spec, e
        ))
    })
}

/// The seam across which the remote dependency is injected.
///
/// The loader calls [`make_client`](ClientFactory::make_client) once per
/// non-short-circuited load. Closures with the matching signature implement
/// this trait, which keeps test doubles small:
///
/// ```rust,ignore
/// let loader = SecretsManagerLoader::from_settings(settings).with_factory(
///     |_service: &str, _settings: &LoaderSettings| -> Result<Box<dyn SecretsManagerClient>> {
///         Ok(Box::new(FakeClient::default()))
///     },
/// );
/// ```
pub trait ClientFactory: Send + Sync {
    fn make_client(
        &self,
        service: &str,
        settings: &LoaderSettings,
    ) -> Result<Box<dyn SecretsManagerClient>>;
}

impl<F> ClientFactory for F
where
    F: Fn(&str, &LoaderSettings) -> Result<Box<dyn SecretsManagerClient>> + Send + Sync,
{
    fn make_client(
        &self,
        service: &str,
        settings: &LoaderSettings,
    ) -> Result<Box<dyn SecretsManagerClient>> {
        self(service, settings)
    }
}

/// Default factory: resolves `settings.client` (or [`DEFAULT_CLIENT`])
/// through the backend registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryClientFactory;

impl ClientFactory for RegistryClientFactory {
    fn make_client(
        &self,
        service: &str,
        settings: &LoaderSettings,
    ) -> Result<Box<dyn SecretsManagerClient>> {
        let spec = settings.client.as_deref().unwrap_or(DEFAULT_CLIENT);
        tracing::debug!(service, client = spec, "acquiring client");
        create_client(spec, settings)
    }
}
