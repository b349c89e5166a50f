//! # CLI Support
//!
//! Command-line entry for running contract suites, e.g. in CI:
//!
//! ```text
//! httpcontract run --base-url https://jsonplaceholder.typicode.com --format json --report out.json
//! httpcontract list
//! ```
//!
//! Exit codes: 0 when every case passed, 1 when any case failed or errored,
//! 2 for usage and configuration errors.

use std::fmt::Write as _;
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::warn;

use crate::config::{self, ConfigError, EndpointConfig};
use crate::suites;
use crate::testing::{CaseStatus, RunMode, RunReport, Runner};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURES: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "httpcontract", version, about = "Verify HTTP API contracts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a contract suite against a base URL.
    Run(RunArgs),
    /// List the cases of a suite.
    List {
        #[arg(long, default_value = "posts")]
        suite: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Base URL of the service under test.
    #[arg(long, env = "HTTPCONTRACT_BASE_URL", default_value = suites::posts::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "HTTPCONTRACT_TIMEOUT_MS")]
    pub timeout_ms: Option<String>,

    /// Extra request header, `Name: Value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    #[arg(long, default_value = "posts")]
    pub suite: String,

    /// Only run cases whose name contains this text.
    #[arg(long)]
    pub filter: Option<String>,

    /// Run cases concurrently, one connection per case.
    #[arg(long)]
    pub parallel: bool,

    /// Worker threads for `--parallel`. Defaults to the available parallelism.
    #[arg(long)]
    pub jobs: Option<NonZeroUsize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the report to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Output format for CLI reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown suite `{0}` (available: {available})", available = suites::NAMES.join(", "))]
    UnknownSuite(String),
    #[error("invalid header format: `{0}` (expected `Name: Value`)")]
    InvalidHeader(String),
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write report file `{path}`: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        EXIT_USAGE
    }
}

/// What a command printed, and the exit code it asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    /// Problems that did not change the outcome, such as an unwritable report file.
    pub stderr: String,
    pub exit_code: u8,
}

pub fn execute(cli: Cli) -> Result<CommandOutput, CliError> {
    match cli.command {
        Command::Run(args) => run(&args),
        Command::List { suite } => list(&suite),
    }
}

pub fn run(args: &RunArgs) -> Result<CommandOutput, CliError> {
    let cases = suites::by_name(&args.suite).ok_or_else(|| CliError::UnknownSuite(args.suite.clone()))?;
    let config = endpoint_config(args)?;
    let mode = if args.parallel {
        RunMode::Parallel
    } else {
        RunMode::Serial
    };

    let mut runner = Runner::new(&config)
        .with_mode(mode)
        .with_filter(args.filter.clone());
    if let Some(jobs) = args.jobs {
        runner = runner.with_workers(jobs);
    }
    let report = runner.run(&cases);

    let rendered = match args.format {
        OutputFormat::Text => render_text(&report),
        OutputFormat::Json => render_json(&report)?,
    };
    let mut stderr = String::new();
    if let Some(path) = &args.report {
        if let Err(source) = fs::write(path, &rendered) {
            let err = CliError::WriteReport {
                path: path.clone(),
                source,
            };
            warn!(error = %err, "report file not written");
            let _ = writeln!(stderr, "Error: {err}");
        }
    }

    Ok(CommandOutput {
        stdout: rendered,
        stderr,
        exit_code: if report.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURES
        },
    })
}

pub fn list(suite: &str) -> Result<CommandOutput, CliError> {
    let cases = suites::by_name(suite).ok_or_else(|| CliError::UnknownSuite(suite.to_string()))?;
    let mut out = String::new();
    for case in &cases {
        let _ = writeln!(
            out,
            "{:<20} {} {}",
            case.name, case.request.method, case.request.path
        );
        if !case.description.is_empty() {
            let _ = writeln!(out, "    {}", case.description);
        }
        for assertion in &case.assertions {
            let _ = writeln!(out, "    - {assertion}");
        }
    }
    Ok(CommandOutput {
        stdout: out,
        stderr: String::new(),
        exit_code: EXIT_SUCCESS,
    })
}

fn endpoint_config(args: &RunArgs) -> Result<EndpointConfig, CliError> {
    let mut builder = EndpointConfig::builder(&args.base_url);
    if let Some(raw) = &args.timeout_ms {
        builder = builder.timeout(config::parse_timeout_ms(raw)?);
    }
    for raw in &args.headers {
        let (name, value) = parse_header_arg(raw)?;
        builder = builder.header(name, value);
    }
    Ok(builder.build()?)
}

fn parse_header_arg(raw: &str) -> Result<(String, String), CliError> {
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| CliError::InvalidHeader(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::InvalidHeader(raw.to_string()));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    for case in &report.cases {
        let label = match case.status {
            CaseStatus::Passed => "PASS",
            CaseStatus::Failed => "FAIL",
            CaseStatus::Errored => "ERROR",
        };
        let _ = write!(out, "{label:<5} {} ({} {})", case.name, case.method, case.path);
        match (case.http_status, case.elapsed_ms) {
            (Some(status), Some(ms)) => {
                let _ = writeln!(out, " -> {status} in {}", format_ms(ms));
            }
            _ => out.push('\n'),
        }
        for failure in case.failures() {
            let _ = writeln!(out, "      {failure}");
        }
        if let Some(error) = &case.error {
            let _ = writeln!(out, "      {error}");
        }
    }
    let _ = writeln!(
        out,
        "\n{} cases: {} passed, {} failed, {} errored in {}",
        report.total,
        report.passed,
        report.failed,
        report.errored,
        format_ms(report.duration_ms)
    );
    out
}

pub fn render_json(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

fn format_ms(ms: u128) -> String {
    let ms = u64::try_from(ms).unwrap_or(u64::MAX);
    format!("{:?}", Duration::from_millis(ms))
}
