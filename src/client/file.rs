use super::{FetchError, GetSecretValueOutput, GetSecretValueRequest, SecretsManagerClient};
use crate::{LoaderError, Result};
use secretsmanager_loader_core::LoaderSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Configuration for the file client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Directory holding one response envelope per secret.
    pub root: PathBuf,
}

impl FileConfig {
    /// Creates a `FileConfig` from a `file://` URL.
    ///
    /// Profile and region do not apply to local files and are ignored.
    pub fn from_url(url: &Url, _settings: &LoaderSettings) -> Result<Self> {
        if url.scheme() != "file" {
            return Err(LoaderError::ClientOperationFailed(format!(
                "Invalid scheme '{}' for file client",
                url.scheme()
            )));
        }

        let root = url.to_file_path().map_err(|_| {
            LoaderError::ClientOperationFailed(format!(
                "File client URI '{}' must point to a local directory",
                url
            ))
        })?;

        Ok(Self { root })
    }
}

/// Client that reads response envelopes from a local directory.
///
/// The storage key maps onto the directory layout, so `secrets/dev/billing`
/// is read from `{root}/secrets/dev/billing.json` and the `AWSPREVIOUS`
/// stage of it from `{root}/secrets/dev/billing.AWSPREVIOUS.json`. Each file
/// holds the same envelope the store returns:
///
/// ```json
/// { "Name": "secrets/dev/billing", "SecretString": "{\"config\": {}}" }
/// ```
///
/// Useful for offline development and for exercising the full loader pipeline
/// in integration tests.
pub struct FileClient {
    config: FileConfig,
}

crate::register_client! {
    struct: FileClient,
    config: FileConfig,
    name: "file",
    description: "Response envelopes stored as JSON files in a local directory",
    schemes: ["file"],
    examples: ["file:///srv/secrets", "file:fixtures/secrets"],
}

impl FileClient {
    pub fn new(config: FileConfig) -> Self {
        Self { config }
    }

    /// Path of the envelope file for a request.
    ///
    /// The secret id may only hold plain path segments and the stage must be
    /// a single file-name fragment, so the result always lies under `root`.
    pub(crate) fn envelope_path(
        &self,
        request: &GetSecretValueRequest,
    ) -> std::result::Result<PathBuf, FetchError> {
        let secret_id = Path::new(&request.secret_id);
        let plain_segments = secret_id
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if request.secret_id.is_empty() || !plain_segments {
            return Err(FetchError::InvalidRequest(format!(
                "secret id '{}' escapes the client root",
                request.secret_id
            )));
        }

        let file_name = match &request.version_stage {
            Some(stage) if stage.contains(['/', '\\']) => {
                return Err(FetchError::InvalidRequest(format!(
                    "version stage '{}' cannot contain a path separator",
                    stage
                )));
            }
            Some(stage) => format!("{}.{}.json", request.secret_id, stage),
            None => format!("{}.json", request.secret_id),
        };
        Ok(self.config.root.join(file_name))
    }
}

impl SecretsManagerClient for FileClient {
    fn name(&self) -> &'static str {
        Self::CLIENT_NAME
    }

    fn get_secret_value(
        &self,
        request: &GetSecretValueRequest,
    ) -> std::result::Result<GetSecretValueOutput, FetchError> {
        let path = self.envelope_path(request)?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(format!(
                    "no envelope at {}",
                    path.display()
                )));
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(FetchError::AccessDenied(format!("{}: {}", path.display(), e)));
            }
            Err(e) => return Err(FetchError::Transport(format!("{}: {}", path.display(), e))),
        };

        serde_json::from_str(&content).map_err(|e| {
            FetchError::InvalidResponse(format!("Failed to parse {}: {e}", path.display()))
        })
    }
}
