//! Command-line runtime for the ffnode media tool.
//!
//! The module owns argument parsing, configuration bootstrapping, item
//! input, and record output. It can be driven from the binary entrypoint or
//! from tests where configuration loading and IO streams are substituted.
//!
//! Items arrive as a JSON array (from `--input` or standard input); records
//! leave as a JSON array on standard output. Diagnostics and the external
//! tool's own output go to standard error.

use std::ffi::OsString;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use ffnode_config::{Config, FailurePolicy};
use ffnode_core::{
    Item, Operation, Pipeline, PipelineSettings, ResultRecord, ShellExecutor, StagingArea,
};
use tracing::debug;

mod cli;
mod config;
mod errors;
pub mod telemetry;


use cli::Cli;
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use config::split_config_arguments;
use errors::AppError;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: This list must be kept in sync with the fields of
/// `ffnode_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--tool",
    "--probe-tool",
    "--shell",
    "--staging-dir",
    "--timeout-secs",
    "--failure-policy",
    "--log-filter",
    "--log-format",
];

const CLI_TARGET: &str = "ffnode_cli";

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, R: Read, W: Write, E: Write> {
    pub(crate) stdin: &'a mut R,
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, R: Read, W: Write, E: Write> IoStreams<'a, R, W, E> {
    pub(crate) const fn new(stdin: &'a mut R, stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdin, stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, R, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let arguments: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&arguments);

    let cli = match Cli::try_parse_from(command_arguments(&arguments, split.command_start)) {
        Ok(cli) => cli,
        // Help and version output are requests, not failures.
        Err(error) if !error.use_stderr() => {
            drop(write!(io.stdout, "{error}"));
            return ExitCode::SUCCESS;
        }
        Err(error) => return report(io.stderr, &AppError::CliUsage(error)),
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| execute(cli, &config, io));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report(io.stderr, &error),
    }
}

fn execute<R: Read, W: Write, E: Write>(
    cli: Cli,
    config: &Config,
    io: &mut IoStreams<'_, R, W, E>,
) -> Result<(), AppError> {
    telemetry::initialise(config)?;

    let items = read_items(cli.input.as_deref(), &mut *io.stdin)?;
    let operation = Operation::from(cli.operation);
    debug!(
        target: CLI_TARGET,
        operation = operation.label(),
        items = items.len(),
        "parsed input items"
    );

    let pipeline = Pipeline::new(executor_for(config), settings_for(config));
    let records = pipeline.run(&operation, &items)?;
    write_records(&mut *io.stdout, &records, cli.pretty)
}

fn executor_for(config: &Config) -> ShellExecutor {
    let executor = ShellExecutor::new(config.shell());
    if let Some(seconds) = config.timeout_secs() {
        return executor.with_timeout(Duration::from_secs(seconds));
    }
    executor
}

fn settings_for(config: &Config) -> PipelineSettings {
    PipelineSettings::new(config.tool(), config.probe_tool())
        .with_staging(StagingArea::new(config.staging_dir().into_std_path_buf()))
        .with_continue_on_failure(config.failure_policy() == FailurePolicy::Continue)
}

/// Reads the item array; blank input is an empty list.
fn read_items(input: Option<&Path>, stdin: &mut impl Read) -> Result<Vec<Item>, AppError> {
    let text = input.map_or_else(
        || {
            let mut buffer = String::new();
            stdin
                .read_to_string(&mut buffer)
                .map(|_| buffer)
                .map_err(|source| AppError::ReadItems {
                    origin: String::from("standard input"),
                    source,
                })
        },
        |path| {
            fs::read_to_string(path).map_err(|source| AppError::ReadItems {
                origin: path.display().to_string(),
                source,
            })
        },
    )?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(AppError::ParseItems)
}

fn write_records(
    stdout: &mut impl Write,
    records: &[ResultRecord],
    pretty: bool,
) -> Result<(), AppError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(records)
    } else {
        serde_json::to_string(records)
    }
    .map_err(AppError::SerialiseRecords)?;

    writeln!(stdout, "{rendered}")
        .and_then(|()| stdout.flush())
        .map_err(AppError::WriteRecords)
}

/// The program name followed by everything after the configuration flags.
fn command_arguments(arguments: &[OsString], command_start: usize) -> Vec<OsString> {
    let program = arguments
        .first()
        .cloned()
        .unwrap_or_else(|| OsString::from("ffnode"));
    let rest = arguments.get(command_start..).unwrap_or_default();
    std::iter::once(program).chain(rest.iter().cloned()).collect()
}

fn report(stderr: &mut impl Write, error: &AppError) -> ExitCode {
    drop(writeln!(stderr, "{error}"));
    ExitCode::FAILURE
}
