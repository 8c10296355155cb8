//! Core secret loading functionality

use crate::client::{
    ClientFactory, GetSecretValueRequest, RegistryClientFactory, SecretsManagerClient,
};
use crate::error::{LoaderError, Result};
use crate::metadata::{Metadata, ServiceDescriptor};
use secretsmanager_loader_core::{LoaderSettings, validate_environment};
use serde_json::{Map, Value};

/// The configuration mapping returned by a load.
///
/// Keys keep the order of the decoded payload.
pub type ConfigMap = Map<String, Value>;

/// Builds the storage key for a service in an environment.
///
/// Every underscore in the service name becomes a hyphen; all other
/// characters, including case, are kept. The environment is used verbatim.
/// The rewrite cannot be reversed.
///
/// # Example
///
/// ```ignore
/// assert_eq!(storage_key("prod", "billing_service"), "secrets/prod/billing-service");
/// ```
pub fn storage_key(environment: &str, service: &str) -> String {
    format!("secrets/{}/{}", environment, service.replace('_', "-"))
}

/// The main entry point for the loader library
///
/// `SecretsManagerLoader` turns a service descriptor into the configuration
/// stored under `secrets/{environment}/{service}`. It holds nothing but its
/// construction-time settings and the client factory, so one instance can be
/// shared by every caller and thread.
///
/// # Example
///
/// ```no_run
/// use secretsmanager_loader::{Metadata, SecretsManagerLoader};
///
/// let loader = SecretsManagerLoader::new(Some("prod".into()), None, Some("us-east-1".into()));
/// let config = loader.load(&Metadata::new("billing_service"), None).unwrap();
/// println!("{}", serde_json::Value::Object(config));
/// ```
pub struct SecretsManagerLoader {
    /// Environment label, profile, region and client backend
    settings: LoaderSettings,
    /// Seam used to acquire a client for each fetch
    factory: Box<dyn ClientFactory>,
}

impl SecretsManagerLoader {
    /// Creates a loader from the three construction values.
    ///
    /// Each value that is `None` is defaulted independently from the process
    /// environment (`SECRETSMANAGER_ENVIRONMENT`, `AWS_PROFILE`, `AWS_REGION`
    /// or `AWS_DEFAULT_REGION`). Nothing is validated here; an unusable
    /// combination is reported by the first [`load`](Self::load).
    ///
    /// # Arguments
    ///
    /// * `environment` - Deployment label used in the storage key
    /// * `profile_name` - Credential profile for client acquisition
    /// * `region` - Target region for client acquisition
    pub fn new(
        environment: Option<String>,
        profile_name: Option<String>,
        region: Option<String>,
    ) -> Self {
        let mut settings = LoaderSettings {
            environment,
            profile_name,
            region,
            client: None,
        };
        settings.merge_with(LoaderSettings::from_env());
        Self::from_settings(settings)
    }

    /// Creates a loader from explicit settings without consulting the
    /// process environment.
    pub fn from_settings(settings: LoaderSettings) -> Self {
        Self {
            settings,
            factory: Box::new(RegistryClientFactory),
        }
    }

    /// Replaces the client factory.
    ///
    /// This is the only place a remote dependency enters the loader; tests
    /// substitute a fake here without touching fetch or decode logic.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: ClientFactory + 'static,
    {
        self.factory = Box::new(factory);
        self
    }

    /// The settings this loader was built with.
    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Derives the storage key for a service.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::MissingEnvironment`] when no environment was
    /// configured, and [`LoaderError::Settings`] when the environment is empty
    /// or contains a `/`.
    pub fn keyname(&self, service: &str) -> Result<String> {
        let environment = self.settings.environment.as_deref().ok_or_else(|| {
            LoaderError::MissingEnvironment {
                service: service.to_string(),
            }
        })?;
        validate_environment(environment)?;
        Ok(storage_key(environment, service))
    }

    /// Acquires a client scoped to the configured profile and region.
    pub fn make_client(&self, service: &str) -> Result<Box<dyn SecretsManagerClient>> {
        self.factory.make_client(service, &self.settings)
    }

    /// Loads the configuration for a service.
    ///
    /// The pipeline is:
    /// 1. Reject a descriptor with an empty name
    /// 2. Return an empty mapping for `debug` or `testing` descriptors, with no client call
    /// 3. Derive the storage key and acquire a client
    /// 4. Fetch the secret once, for `version` or the current version
    /// 5. Return an empty mapping when the response has no `SecretString`
    /// 6. Decode the secret string and return its `config` object
    ///
    /// # Arguments
    ///
    /// * `descriptor` - Identity and environment flags of the calling service
    /// * `version` - Optional version stage; an empty label means the current version
    ///
    /// # Errors
    ///
    /// - [`LoaderError::InvalidMetadata`] if the descriptor has no name
    /// - [`LoaderError::MissingEnvironment`] if no environment is configured
    /// - [`LoaderError::Settings`] if the environment cannot form a storage key
    /// - [`LoaderError::SecretFetch`] if the store cannot return the secret
    /// - [`LoaderError::SecretDecode`] if the secret string is not the expected JSON shape
    pub fn load<D>(&self, descriptor: &D, version: Option<&str>) -> Result<ConfigMap>
    where
        D: ServiceDescriptor + ?Sized,
    {
        let service = descriptor.name();
        if service.is_empty() {
            return Err(LoaderError::InvalidMetadata(
                "descriptor name cannot be empty".to_string(),
            ));
        }

        if descriptor.debug() || descriptor.testing() {
            return Ok(ConfigMap::new());
        }

        let version = version.filter(|v| !v.is_empty());
        let key = self.keyname(service)?;
        let client = self.make_client(service)?;

        let request = GetSecretValueRequest::new(key.as_str()).with_version_stage(version);
        let response = client
            .get_secret_value(&request)
            .map_err(|source| LoaderError::SecretFetch {
                key: key.clone(),
                version: version.map(str::to_string),
                source,
            })?;

        let Some(secret_string) = response.secret_string else {
            return Ok(ConfigMap::new());
        };

        decode_config(&secret_string).map_err(|reason| LoaderError::SecretDecode {
            key,
            version: version.map(str::to_string),
            reason,
        })
    }

    /// Loads the configuration for an untyped descriptor.
    ///
    /// This is the boundary for frameworks that hand over descriptors as JSON
    /// values. Anything other than an object with a non-empty string `name`
    /// fails with [`LoaderError::InvalidMetadata`]; a bare string is rejected
    /// rather than treated as a service name.
    pub fn load_value(&self, descriptor: &Value, version: Option<&str>) -> Result<ConfigMap> {
        let metadata = Metadata::try_from(descriptor)?;
        self.load(&metadata, version)
    }
}

/// Decodes a secret string and extracts its `config` object.
///
/// An absent or `null` `config` yields an empty mapping. Text that is not
/// JSON, a top-level value that is not an object, and a `config` that is not
/// an object are errors.
pub fn decode_config(secret_string: &str) -> std::result::Result<ConfigMap, String> {
    let payload: Value = serde_json::from_str(secret_string)
        .map_err(|e| format!("secret string is not valid JSON: {e}"))?;

    let Value::Object(mut payload) = payload else {
        return Err("secret payload is not a JSON object".to_string());
    };

    match payload.remove("config") {
        None | Some(Value::Null) => Ok(ConfigMap::new()),
        Some(Value::Object(config)) => Ok(config),
        Some(_) => Err("'config' entry is not a JSON object".to_string()),
    }
}
