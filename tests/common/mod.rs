use secretsmanager_loader::{LoaderSettings, SecretsManagerLoader};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test helper holding a directory of stored secrets for the file client
pub struct TestFixture {
    _temp_dir: TempDir,
    pub base_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            base_path,
        }
    }

    /// Store a response envelope under `key`, optionally for a version stage
    pub fn write_secret(&self, key: &str, stage: Option<&str>, secret_string: &str) {
        self.write_envelope(
            key,
            stage,
            &json!({
                "Name": key,
                "VersionStages": [stage.unwrap_or("AWSCURRENT")],
                "SecretString": secret_string,
            }),
        );
    }

    /// Store an arbitrary envelope, e.g. one carrying only `SecretBinary`
    pub fn write_envelope(&self, key: &str, stage: Option<&str>, envelope: &serde_json::Value) {
        let file_name = match stage {
            Some(stage) => format!("{}.{}.json", key, stage),
            None => format!("{}.json", key),
        };
        let path = self.base_path.join(file_name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, envelope.to_string()).unwrap();
    }

    /// Settings pointing the loader at this fixture
    pub fn settings(&self, environment: &str) -> LoaderSettings {
        LoaderSettings {
            environment: Some(environment.to_string()),
            client: Some(format!("file:{}", self.base_path.display())),
            ..Default::default()
        }
    }

    pub fn loader(&self, environment: &str) -> SecretsManagerLoader {
        SecretsManagerLoader::from_settings(self.settings(environment))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
