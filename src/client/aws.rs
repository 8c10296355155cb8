use super::{FetchError, GetSecretValueOutput, GetSecretValueRequest, SecretsManagerClient};
use crate::{LoaderError, Result};
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::{
    GetSecretValueError, GetSecretValueOutput as SdkGetSecretValueOutput,
};
use secretsmanager_loader_core::LoaderSettings;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tokio::runtime::{Builder, Handle, Runtime};
use url::Url;

/// Error codes without a dedicated variant that mean the caller lacks permission.
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDeniedException",
    "UnrecognizedClientException",
    "InvalidClientTokenId",
    "InvalidSignatureException",
    "ExpiredTokenException",
];

const THROTTLING_CODES: &[&str] = &[
    "ThrottlingException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
];

/// Configuration for the AWS Secrets Manager client.
///
/// # Examples
///
/// ```ignore
/// use secretsmanager_loader::client::AwsConfig;
///
/// // Use the ambient credential chain
/// let config = AwsConfig::default();
///
/// // Pin a profile and a region
/// let config = AwsConfig {
///     profile_name: Some("ops".to_string()),
///     region: Some("us-east-1".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Named profile from the shared AWS config files.
    pub profile_name: Option<String>,
    /// Region the client talks to.
    pub region: Option<String>,
    /// Alternative endpoint, e.g. a local emulator.
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    /// Creates an `AwsConfig` from a URL and the loader settings.
    ///
    /// Parses URLs in the following formats:
    /// - `aws://` - profile and region from the loader settings
    /// - `aws://region` - explicit region
    /// - `aws://profile@region` - explicit profile and region
    /// - `aws://?endpoint_url=http://localhost:4566` - alternative endpoint
    ///
    /// Values in the URL take precedence over the loader settings.
    pub fn from_url(url: &Url, settings: &LoaderSettings) -> Result<Self> {
        if url.scheme() != "aws" {
            return Err(LoaderError::ClientOperationFailed(format!(
                "Invalid scheme '{}' for aws client",
                url.scheme()
            )));
        }

        let mut config = Self {
            profile_name: settings.profile_name.clone(),
            region: settings.region.clone(),
            endpoint_url: None,
        };

        if !url.username().is_empty() {
            config.profile_name = Some(url.username().to_string());
        }

        if let Some(host) = url.host_str().filter(|host| !host.is_empty()) {
            config.region = Some(host.to_string());
        }

        if let Some(endpoint) = url
            .query_pairs()
            .find(|(key, _)| key == "endpoint_url")
            .map(|(_, value)| value.to_string())
        {
            config.endpoint_url = Some(endpoint);
        }

        Ok(config)
    }
}

/// SDK client together with the runtime that drives it.
struct Connection {
    runtime: Runtime,
    client: Client,
}

/// AWS Secrets Manager client backed by `aws-sdk-secretsmanager`.
///
/// The loader is synchronous, so each client owns a private current-thread
/// tokio runtime and blocks on it for the single `GetSecretValue` call. The
/// runtime and the SDK configuration are built on the first fetch; creating
/// the client does no I/O.
///
/// Credentials come from the standard AWS provider chain, narrowed to the
/// configured profile when one is set.
///
/// Fetching from inside an async runtime fails with
/// [`FetchError::InvalidRequest`]; async callers should run the loader on
/// `tokio::task::spawn_blocking`.
pub struct AwsClient {
    config: AwsConfig,
    connection: OnceLock<std::result::Result<Connection, FetchError>>,
}

crate::register_client! {
    struct: AwsClient,
    config: AwsConfig,
    name: "aws",
    description: "AWS Secrets Manager through the AWS SDK",
    schemes: ["aws"],
    examples: ["aws://", "aws://ops@us-east-1"],
}

impl AwsClient {
    pub fn new(config: AwsConfig) -> Self {
        Self {
            config,
            connection: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &AwsConfig {
        &self.config
    }

    fn connection(&self) -> std::result::Result<&Connection, FetchError> {
        self.connection
            .get_or_init(|| self.connect())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn connect(&self) -> std::result::Result<Connection, FetchError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to start AWS runtime: {e}")))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile_name) = &self.config.profile_name {
            loader = loader.profile_name(profile_name);
        }
        if let Some(region) = &self.config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &self.config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let sdk_config = runtime.block_on(loader.load());
        let client = Client::new(&sdk_config);

        Ok(Connection { runtime, client })
    }
}

impl SecretsManagerClient for AwsClient {
    fn name(&self) -> &'static str {
        Self::CLIENT_NAME
    }

    fn get_secret_value(
        &self,
        request: &GetSecretValueRequest,
    ) -> std::result::Result<GetSecretValueOutput, FetchError> {
        // block_on panics when nested inside another runtime
        if Handle::try_current().is_ok() {
            return Err(FetchError::InvalidRequest(
                "cannot fetch secrets from inside an async runtime; call the loader from spawn_blocking".to_string(),
            ));
        }

        let connection = self.connection()?;
        let response = connection
            .runtime
            .block_on(
                connection
                    .client
                    .get_secret_value()
                    .secret_id(&request.secret_id)
                    .set_version_stage(request.version_stage.clone())
                    .send(),
            )
            .map_err(classify_sdk_error)?;

        Ok(response.into())
    }
}

impl From<SdkGetSecretValueOutput> for GetSecretValueOutput {
    fn from(output: SdkGetSecretValueOutput) -> Self {
        Self {
            arn: output.arn().map(str::to_string),
            name: output.name().map(str::to_string),
            version_id: output.version_id().map(str::to_string),
            version_stages: output.version_stages().to_vec(),
            secret_string: output.secret_string().map(str::to_string),
        }
    }
}

/// Maps an SDK failure to a fetch error kind.
///
/// Service errors are classified by their modeled variant; failures to reach
/// the service at all are transport errors.
pub(crate) fn classify_sdk_error(err: SdkError<GetSecretValueError>) -> FetchError {
    if let Some(service_err) = err.as_service_error() {
        return classify_service_error(service_err);
    }

    let message = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::ConstructionFailure(_) => FetchError::InvalidRequest(message),
        _ => FetchError::Transport(message),
    }
}

pub(crate) fn classify_service_error(err: &GetSecretValueError) -> FetchError {
    let message = DisplayErrorContext(err).to_string();
    match err {
        GetSecretValueError::ResourceNotFoundException(_) => FetchError::NotFound(message),
        // KMS refused to decrypt the secret with the caller's credentials
        GetSecretValueError::DecryptionFailure(_) => FetchError::AccessDenied(message),
        GetSecretValueError::InvalidRequestException(_)
        | GetSecretValueError::InvalidParameterException(_) => {
            FetchError::InvalidRequest(message)
        }
        GetSecretValueError::InternalServiceError(_) => FetchError::Transport(message),
        _ => match err.code() {
            Some(code) if ACCESS_DENIED_CODES.contains(&code) => FetchError::AccessDenied(message),
            Some(code) if THROTTLING_CODES.contains(&code) => FetchError::Throttled(message),
            _ => FetchError::InvalidRequest(message),
        },
    }
}
