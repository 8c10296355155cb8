mod common;

use common::TestFixture;
use secretsmanager_loader::client::FetchError;
use secretsmanager_loader::{LoaderError, LoaderSettings, Metadata, SecretsManagerLoader};
use serde_json::json;
use std::fs;

#[test]
fn test_load_through_file_client() {
    let fixture = TestFixture::new();
    fixture.write_secret(
        "secrets/prod/billing-service",
        None,
        &json!({
            "version": "3",
            "config": {
                "postgres": {"host": "db.internal", "password": "hunter2"},
                "workers": 4,
            },
        })
        .to_string(),
    );

    let loader = fixture.loader("prod");
    let config = loader
        .load(&Metadata::new("billing_service"), None)
        .unwrap();

    assert_eq!(config["postgres"]["host"], "db.internal");
    assert_eq!(config["postgres"]["password"], "hunter2");
    assert_eq!(config["workers"], 4);
    assert_eq!(config.len(), 2);
}

#[test]
fn test_load_version_stage() {
    let fixture = TestFixture::new();
    fixture.write_secret(
        "secrets/prod/dummy",
        None,
        r#"{"config": {"rotation": "current"}}"#,
    );
    fixture.write_secret(
        "secrets/prod/dummy",
        Some("AWSPREVIOUS"),
        r#"{"config": {"rotation": "previous"}}"#,
    );

    let loader = fixture.loader("prod");
    let metadata = Metadata::new("dummy");

    let current = loader.load(&metadata, None).unwrap();
    assert_eq!(current["rotation"], "current");

    let previous = loader.load(&metadata, Some("AWSPREVIOUS")).unwrap();
    assert_eq!(previous["rotation"], "previous");
}

#[test]
fn test_load_environments_are_isolated() {
    let fixture = TestFixture::new();
    fixture.write_secret("secrets/dev/dummy", None, r#"{"config": {"env": "dev"}}"#);
    fixture.write_secret("secrets/prod/dummy", None, r#"{"config": {"env": "prod"}}"#);

    let dev = fixture.loader("dev").load(&Metadata::new("dummy"), None).unwrap();
    let prod = fixture.loader("prod").load(&Metadata::new("dummy"), None).unwrap();

    assert_eq!(dev["env"], "dev");
    assert_eq!(prod["env"], "prod");
}

#[test]
fn test_load_missing_secret() {
    let fixture = TestFixture::new();
    let loader = fixture.loader("prod");

    let err = loader.load(&Metadata::new("unknown"), None).unwrap_err();
    match err {
        LoaderError::SecretFetch {
            key,
            version,
            source,
        } => {
            assert_eq!(key, "secrets/prod/unknown");
            assert_eq!(version, None);
            assert!(matches!(source, FetchError::NotFound(_)));
        }
        other => panic!("Expected SecretFetch, got {:?}", other),
    }
}

#[test]
fn test_load_missing_version_stage() {
    let fixture = TestFixture::new();
    fixture.write_secret("secrets/prod/dummy", None, r#"{"config": {}}"#);

    let err = fixture
        .loader("prod")
        .load(&Metadata::new("dummy"), Some("AWSPENDING"))
        .unwrap_err();
    assert_eq!(err.key(), Some("secrets/prod/dummy"));
    assert_eq!(err.version(), Some("AWSPENDING"));
}

#[test]
fn test_load_cannot_leave_the_secret_directory() {
    let fixture = TestFixture::new();
    let root = fixture.base_path.join("root");
    fs::create_dir_all(root.join("secrets/dev")).unwrap();
    fs::write(
        fixture.base_path.join("outside.json"),
        json!({"SecretString": r#"{"config": {"leaked": true}}"#}).to_string(),
    )
    .unwrap();

    let loader = SecretsManagerLoader::from_settings(LoaderSettings {
        environment: Some("dev".into()),
        client: Some(format!("file:{}", root.display())),
        ..Default::default()
    });

    let err = loader
        .load(&Metadata::new("../../../outside"), None)
        .unwrap_err();
    assert!(matches!(
        err,
        LoaderError::SecretFetch {
            source: FetchError::InvalidRequest(_),
            ..
        }
    ));
}

#[test]
fn test_load_corrupted_secret() {
    let fixture = TestFixture::new();
    fixture.write_secret("secrets/prod/dummy", None, "NotJson");

    let err = fixture
        .loader("prod")
        .load(&Metadata::new("dummy"), None)
        .unwrap_err();
    assert!(matches!(err, LoaderError::SecretDecode { .. }));
    assert!(err.to_string().contains("secrets/prod/dummy"));
}

#[test]
fn test_load_binary_secret_yields_empty_configuration() {
    let fixture = TestFixture::new();
    fixture.write_envelope(
        "secrets/prod/dummy",
        None,
        &json!({"Name": "secrets/prod/dummy", "SecretBinary": "AAEC"}),
    );

    let config = fixture
        .loader("prod")
        .load(&Metadata::new("dummy"), None)
        .unwrap();
    assert!(config.is_empty());
}

#[test]
fn test_load_testing_descriptor_skips_store() {
    // No secrets stored; any fetch would fail with NotFound
    let fixture = TestFixture::new();
    let loader = fixture.loader("prod");

    let config = loader
        .load_value(&json!({"name": "dummy", "testing": true}), None)
        .unwrap();
    assert!(config.is_empty());

    let config = loader
        .load(&Metadata::new("dummy").with_debug(true), None)
        .unwrap();
    assert!(config.is_empty());
}

#[test]
fn test_load_string_descriptor_rejected() {
    let fixture = TestFixture::new();
    fixture.write_secret("secrets/prod/dummy", None, r#"{"config": {"a": 1}}"#);

    let result = fixture.loader("prod").load_value(&json!("dummy"), None);
    assert!(matches!(result, Err(LoaderError::InvalidMetadata(_))));
}

#[test]
fn test_loader_from_settings_file() {
    let fixture = TestFixture::new();
    fixture.write_secret("secrets/staging/dummy", None, r#"{"config": {"ok": true}}"#);

    let settings_path = fixture.base_path.join("config.toml");
    let settings = fixture.settings("staging");
    fs::write(
        &settings_path,
        format!(
            "[secretsmanager]\nenvironment = \"staging\"\nclient = {:?}\n",
            settings.client.unwrap()
        ),
    )
    .unwrap();

    let settings = LoaderSettings::try_from(settings_path.as_path()).unwrap();
    let loader = SecretsManagerLoader::from_settings(settings);

    assert_eq!(loader.keyname("dummy").unwrap(), "secrets/staging/dummy");
    let config = loader.load(&Metadata::new("dummy"), None).unwrap();
    assert_eq!(config["ok"], true);
}

#[test]
fn test_loader_shared_across_threads() {
    let fixture = TestFixture::new();
    fixture.write_secret("secrets/prod/dummy", None, r#"{"config": {"n": 7}}"#);

    let loader = fixture.loader("prod");
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| loader.load(&Metadata::new("dummy"), None).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap()["n"], 7);
        }
    });
}
