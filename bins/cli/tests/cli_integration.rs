//! CLI integration tests.

use std::path::Path;
use std::process::{Command, Output};

const SELECTOR_ARGS: [&str; 8] = [
    "--category",
    "WEATHER",
    "--sub-category",
    "DAILY",
    "--source-name",
    "load",
    "--process-type",
    "create_data_from_url",
];

fn run_cli(args: &[&str], env: &[(&str, &str)]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ptel"));
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("PIPELINE_TELEMETRY_") || key == "RUST_LOG" {
            command.env_remove(key);
        }
    }
    for (key, value) in env {
        command.env(key, value);
    }
    command.output()
}

fn sqlite_env(path: &Path) -> Vec<(&'static str, String)> {
    vec![
        ("PIPELINE_TELEMETRY_STORAGE_PROVIDER", "sqlite".to_string()),
        (
            "PIPELINE_TELEMETRY_SQLITE_PATH",
            path.to_string_lossy().to_string(),
        ),
    ]
}

fn stdout_json(output: &Output) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn version_flag_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let output = run_cli(&["--version"], &[])?;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("ptel"));
    Ok(())
}

#[test]
fn config_show_reflects_env_overrides() -> Result<(), Box<dyn std::error::Error>> {
    let output = run_cli(
        &["config", "show", "--output", "json", "--no-progress"],
        &[("PIPELINE_TELEMETRY_STORAGE_PROVIDER", "memory")],
    )?;
    assert!(output.status.success());

    let value = stdout_json(&output)?;
    assert_eq!(value["status"], "ok");
    assert_eq!(value["effectiveConfig"]["storage"]["provider"], "memory");
    Ok(())
}

#[test]
fn invalid_env_value_is_an_input_error() -> Result<(), Box<dyn std::error::Error>> {
    let output = run_cli(
        &["config", "check", "--output", "json", "--no-progress"],
        &[("PIPELINE_TELEMETRY_STORAGE_PROVIDER", "postgres")],
    )?;
    assert_eq!(output.status.code(), Some(2));

    let value = stdout_json(&output)?;
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["code"], "config:invalid_env_enum");
    Ok(())
}

#[test]
fn daily_aggregation_is_idempotent_on_sqlite() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let env = sqlite_env(&dir.path().join("telemetry.db"));
    let env: Vec<(&str, &str)> = env.iter().map(|(key, value)| (*key, value.as_str())).collect();

    let mut aggregate = vec!["aggregate", "daily"];
    aggregate.extend(SELECTOR_ARGS);
    aggregate.extend([
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-03",
        "--output",
        "json",
        "--no-progress",
    ]);

    for _ in 0..2 {
        let output = run_cli(&aggregate, &env)?;
        assert!(output.status.success());
        let value = stdout_json(&output)?;
        assert_eq!(value["summary"]["telemetryType"], "DAILY_AGGR");
        assert_eq!(
            value["summary"]["windows"].as_array().map(Vec::len),
            Some(2)
        );
    }

    let mut list = vec!["records", "list"];
    list.extend(SELECTOR_ARGS);
    list.extend([
        "--telemetry-type",
        "DAILY_AGGR",
        "--from",
        "2024-01-01",
        "--to",
        "2024-01-03",
        "--output",
        "json",
        "--no-progress",
    ]);
    let output = run_cli(&list, &env)?;
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)?["count"], 2);
    Ok(())
}

#[test]
fn reversed_span_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = vec!["aggregate", "weekly"];
    args.extend(SELECTOR_ARGS);
    args.extend(["--from", "2024-02-01", "--to", "2024-01-01", "--no-progress"]);

    let output = run_cli(&args, &[("PIPELINE_TELEMETRY_STORAGE_PROVIDER", "memory")])?;
    assert_eq!(output.status.code(), Some(2));
    Ok(())
}

#[test]
fn literal_yesterday_aggregates_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = vec!["aggregate", "yesterday", "--literal"];
    args.extend(SELECTOR_ARGS);
    args.extend(["--output", "json", "--no-progress"]);

    let output = run_cli(&args, &[("PIPELINE_TELEMETRY_STORAGE_PROVIDER", "memory")])?;
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output)?["summary"]["windows"].as_array().map(Vec::len),
        Some(0)
    );
    Ok(())
}
