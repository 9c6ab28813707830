//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod logging;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use commands::{
    run_aggregate_span, run_aggregate_yesterday, run_config_check, run_config_show, run_info,
    run_records_list,
};
use error::{CliError, ExitCode, infra_exit_code};
use format::{OutputArgs, OutputMode};
use pipeline_telemetry_config::{
    TelemetryEnv, ValidatedTelemetryConfig, load_telemetry_config_from_path,
};
use pipeline_telemetry_domain::{TelemetrySelector, TelemetryType};
use pipeline_telemetry_infra::{AggregationFlavor, InfraError, YesterdayMode, is_secret_key};
use pipeline_telemetry_shared::REDACTED;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Prefix of every environment variable the CLI reads.
const ENV_PREFIX: &str = "PIPELINE_TELEMETRY_";

#[derive(Debug, Parser)]
#[command(
    name = "ptel",
    version,
    about = "Pipeline telemetry aggregation CLI",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Optional config file path (JSON/TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build and version details.
    Info,
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Roll stored telemetry up into aggregation windows.
    Aggregate {
        #[command(subcommand)]
        command: AggregateCommands,
    },
    /// Inspect stored telemetry.
    Records {
        #[command(subcommand)]
        command: RecordsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config (defaults, file, env).
    Show,
    /// Validate the effective config.
    Check,
}

#[derive(Debug, Subcommand)]
enum AggregateCommands {
    /// SINGLE runs into one `DAILY_AGGR` record per day.
    Daily(SpanArgs),
    /// SINGLE runs into one `WEEKLY_AGGR` record per Monday-based week.
    Weekly(SpanArgs),
    /// SINGLE runs into one `MONTHLY_AGGR` record per month.
    Monthly(SpanArgs),
    /// PARTIAL records into one SINGLE record per day.
    PartialToSingle(SpanArgs),
    /// Daily rollup of yesterday.
    Yesterday {
        #[command(flatten)]
        selector: SelectorArgs,
        /// Pass (today, yesterday) as (start, end), which aggregates nothing.
        #[arg(long)]
        literal: bool,
    },
}

#[derive(Debug, Subcommand)]
enum RecordsCommands {
    /// List stored records of one type and stream.
    List {
        #[command(flatten)]
        selector: SelectorArgs,
        /// Telemetry type (`PARTIAL`, `SINGLE`, `DAILY_AGGR`, ...).
        #[arg(long, default_value = "SINGLE")]
        telemetry_type: TelemetryType,
        /// First day (YYYY-MM-DD), inclusive.
        #[arg(long)]
        from: NaiveDate,
        /// Last day (YYYY-MM-DD), exclusive.
        #[arg(long)]
        to: NaiveDate,
    },
}

/// Identifies one telemetry stream.
#[derive(Debug, Clone, Args)]
struct SelectorArgs {
    /// Stream category.
    #[arg(long)]
    category: String,
    /// Stream sub-category.
    #[arg(long)]
    sub_category: String,
    /// Stream source name.
    #[arg(long)]
    source_name: String,
    /// Process type name.
    #[arg(long)]
    process_type: String,
}

impl SelectorArgs {
    fn to_selector(&self) -> TelemetrySelector {
        TelemetrySelector::new(
            &self.category,
            &self.sub_category,
            &self.source_name,
            &self.process_type,
        )
    }
}

/// A stream plus the span to aggregate.
#[derive(Debug, Clone, Args)]
struct SpanArgs {
    #[command(flatten)]
    selector: SelectorArgs,
    /// First day of the span (YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,
    /// End of the span (YYYY-MM-DD); the last window ends on or before it.
    #[arg(long)]
    to: NaiveDate,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

impl CliOutput {
    pub(crate) const fn ok(stdout: String, stderr: String) -> Self {
        Self {
            stdout,
            stderr,
            exit_code: ExitCode::Ok,
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    let output = match run(&cli, mode) {
        Ok(output) => output,
        Err(CliError::Infra(error)) => format_error_output(mode, &error),
        Err(error) => return exit_with_error(&error),
    };
    match write_output(&output) {
        Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(cli: &Cli, mode: OutputMode) -> Result<CliOutput, CliError> {
    let config_path = cli.config.as_deref();
    match &cli.command {
        Commands::Info => run_info(mode),
        Commands::Config { command } => match command {
            ConfigCommands::Show => run_config_show(mode, config_path),
            ConfigCommands::Check => run_config_check(mode, config_path),
        },
        Commands::Aggregate { command } => {
            let (flavor, span) = match command {
                AggregateCommands::Daily(span) => (AggregationFlavor::Daily, span),
                AggregateCommands::Weekly(span) => (AggregationFlavor::Weekly, span),
                AggregateCommands::Monthly(span) => (AggregationFlavor::Monthly, span),
                AggregateCommands::PartialToSingle(span) => {
                    (AggregationFlavor::PartialToSingle, span)
                },
                AggregateCommands::Yesterday { selector, literal } => {
                    let yesterday_mode = if *literal {
                        YesterdayMode::Literal
                    } else {
                        YesterdayMode::Window
                    };
                    return run_aggregate_yesterday(
                        mode,
                        config_path,
                        selector.to_selector(),
                        yesterday_mode,
                    );
                },
            };
            run_aggregate_span(
                mode,
                config_path,
                flavor,
                span.selector.to_selector(),
                span.from,
                span.to,
            )
        },
        Commands::Records { command } => match command {
            RecordsCommands::List {
                selector,
                telemetry_type,
                from,
                to,
            } => run_records_list(
                mode,
                config_path,
                *telemetry_type,
                selector.to_selector(),
                *from,
                *to,
            ),
        },
    }
}

/// Load the effective config and install the tracing subscriber it selects.
pub(crate) fn load_runtime_config(
    mode: OutputMode,
    config_path: Option<&Path>,
) -> Result<ValidatedTelemetryConfig, InfraError> {
    let env = TelemetryEnv::from_map(&collect_scoped_env(ENV_PREFIX)).map_err(InfraError::from)?;
    let config = load_telemetry_config_from_path(config_path, &env)?;
    logging::init_tracing(mode, &config.logging);
    Ok(config)
}

pub(crate) fn format_error_output(mode: OutputMode, error: &InfraError) -> CliOutput {
    let meta: BTreeMap<&str, &str> = error
        .metadata
        .iter()
        .map(|(key, value)| {
            let value = if is_secret_key(key) {
                REDACTED
            } else {
                value.as_str()
            };
            (key.as_str(), value)
        })
        .collect();

    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": {
                "code": error.code.to_string(),
                "message": error.message,
                "kind": error.kind.to_string(),
                "meta": meta,
            },
        });

        // This is a CLI boundary, so JSON serialization errors are internal.
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\",\"kind\":\"invariant\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        let mut out = String::new();
        out.push_str("status: error\n");
        out.push_str(&format!("code: {}\n", error.code));
        out.push_str(&format!("message: {}\n", error.message));
        out.push_str(&format!("kind: {}\n", error.kind));
        if !meta.is_empty() {
            out.push_str("meta:\n");
            for (key, value) in &meta {
                out.push_str(&format!("  {key}: {value}\n"));
            }
        }
        out
    };

    CliOutput {
        stdout,
        stderr,
        exit_code: infra_exit_code(error),
    }
}

pub(crate) fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

pub(crate) fn to_pretty_json_line(value: &serde_json::Value) -> Result<String, CliError> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;
    use clap::CommandFactory;
    use pipeline_telemetry_shared::{ErrorCode, ErrorEnvelope};

    #[test]
    fn version_flag_is_supported() {
        let result = Cli::command().try_get_matches_from(["ptel", "--version"]);
        let is_version = matches!(
            result,
            Err(error) if error.kind() == clap::error::ErrorKind::DisplayVersion
        );

        assert!(is_version, "expected clap to render version");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn aggregate_daily_parses_span() -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::try_parse_from([
            "ptel",
            "aggregate",
            "daily",
            "--category",
            "WEATHER",
            "--sub-category",
            "DAILY",
            "--source-name",
            "load",
            "--process-type",
            "create_data_from_url",
            "--from",
            "2024-05-09",
            "--to",
            "2024-05-10",
        ])?;
        let Commands::Aggregate {
            command: AggregateCommands::Daily(span),
        } = cli.command
        else {
            return Err("expected aggregate daily".into());
        };
        assert_eq!(span.from, NaiveDate::from_ymd_opt(2024, 5, 9).ok_or("bad date")?);
        assert_eq!(
            span.selector.to_selector().to_string(),
            "WEATHER/DAILY/load/create_data_from_url"
        );
        Ok(())
    }

    #[test]
    fn records_list_rejects_unknown_type() {
        let result = Cli::try_parse_from([
            "ptel",
            "records",
            "list",
            "--category",
            "a",
            "--sub-category",
            "b",
            "--source-name",
            "c",
            "--process-type",
            "d",
            "--telemetry-type",
            "HOURLY_AGGR",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-02",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn error_output_redacts_secret_metadata() -> Result<(), Box<dyn std::error::Error>> {
        let error = ErrorEnvelope::expected(ErrorCode::config("bad"), "bad config")
            .with_metadata("apiToken", "hunter2")
            .with_metadata("field", "storage");
        let mode = OutputMode {
            format: OutputFormat::Json,
            no_progress: true,
        };

        let output = format_error_output(mode, &error);
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert!(!output.stdout.contains("hunter2"));
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;
        assert_eq!(value["error"]["code"], "config:bad");
        assert_eq!(value["error"]["meta"]["field"], "storage");
        Ok(())
    }

    #[test]
    fn reversed_span_fails_before_loading_config() -> Result<(), Box<dyn std::error::Error>> {
        let mode = OutputMode {
            format: OutputFormat::Json,
            no_progress: true,
        };
        let from = NaiveDate::from_ymd_opt(2024, 2, 1).ok_or("bad date")?;
        let to = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;
        let selector = TelemetrySelector::new("a", "b", "c", "d");

        let result = run_aggregate_span(
            mode,
            Some(Path::new("/nonexistent/telemetry.toml")),
            AggregationFlavor::Weekly,
            selector,
            from,
            to,
        );
        let Err(error) = result else {
            return Err("expected a reversed span error".into());
        };
        assert!(matches!(error, CliError::ReversedSpan { .. }));
        assert_eq!(error.exit_code(), ExitCode::InvalidInput);
        Ok(())
    }

    #[test]
    fn missing_config_file_flows_through_cli_error() -> Result<(), Box<dyn std::error::Error>> {
        let mode = OutputMode {
            format: OutputFormat::Text,
            no_progress: true,
        };
        let result = run_config_check(mode, Some(Path::new("/nonexistent/telemetry.toml")));
        let Err(CliError::Infra(error)) = result else {
            return Err("expected an infra error".into());
        };
        assert_eq!(error.code.to_string(), "config:config_file_not_found");

        let output = format_error_output(mode, &error);
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert!(output.stdout.contains("code: config:config_file_not_found"));
        Ok(())
    }
}
