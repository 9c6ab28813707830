//! Integration tests for file + env config loading.

use pipeline_telemetry_config::{
    ENV_LOG_LEVEL, ENV_SQLITE_PATH, ENV_STORAGE_PROVIDER, LogFormat, StorageProvider,
    TelemetryConfig, TelemetryEnv, load_telemetry_config_from_path, parse_telemetry_config_json,
    to_pretty_json, to_pretty_toml,
};
use pipeline_telemetry_shared::ErrorCode;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn env_from(pairs: &[(&str, &str)]) -> Result<TelemetryEnv, Box<dyn Error>> {
    let map: BTreeMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    Ok(TelemetryEnv::from_map(&map)?)
}

#[test]
fn toml_fixture_loads_and_normalizes() -> Result<(), Box<dyn Error>> {
    let config = load_telemetry_config_from_path(
        Some(&fixture("telemetry.valid.toml")),
        &TelemetryEnv::default(),
    )?;

    assert_eq!(config.storage.provider, StorageProvider::Sqlite);
    assert_eq!(config.storage.sqlite_path.as_ref(), "data/telemetry.db");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.level.as_ref(), "debug");
    Ok(())
}

#[test]
fn env_wins_over_file() -> Result<(), Box<dyn Error>> {
    let env = env_from(&[
        (ENV_STORAGE_PROVIDER, "sqlite"),
        (ENV_SQLITE_PATH, "/var/lib/telemetry.db"),
        (ENV_LOG_LEVEL, "error"),
    ])?;
    let config = load_telemetry_config_from_path(Some(&fixture("telemetry.valid.json")), &env)?;

    assert_eq!(config.storage.provider, StorageProvider::Sqlite);
    assert_eq!(config.storage.sqlite_path.as_ref(), "/var/lib/telemetry.db");
    assert_eq!(config.logging.level.as_ref(), "error");
    assert_eq!(config.logging.format, LogFormat::Text);
    Ok(())
}

#[test]
fn invalid_file_content_is_reported_with_source() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[storage\nprovider = 1")?;

    let Err(error) = load_telemetry_config_from_path(Some(&path), &TelemetryEnv::default()) else {
        return Err("expected invalid TOML".into());
    };
    assert_eq!(error.code, ErrorCode::config("invalid_toml"));
    assert_eq!(
        error.metadata.get("source").map(String::as_str),
        Some("config")
    );
    Ok(())
}

#[test]
fn pretty_output_parses_back_to_the_same_config() -> Result<(), Box<dyn Error>> {
    let config = TelemetryConfig::default().validate_and_normalize()?;
    let json = to_pretty_json(&config)?;
    assert!(json.ends_with('\n'));
    assert!(json.contains("\"sqlitePath\""));

    let reparsed = parse_telemetry_config_json(&json)?;
    assert_eq!(reparsed, config);

    let toml = to_pretty_toml(&config)?;
    assert!(toml.contains("[storage]"));
    Ok(())
}
