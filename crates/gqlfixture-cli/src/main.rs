//! # gqlfixture
//!
//! Binary entry point for running GraphQL fixture files.
//!
//! This crate provides:
//! - CLI argument parsing using `clap`
//! - `gqlfixture check` to validate a fixture file without a server
//! - `gqlfixture run` to set up fixtures against an endpoint, print what was
//!   captured, and tear them down again

mod report;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use gqlfixture_core::{EndpointConfig, FixtureFile, FixtureSequence, ValidationErrors};
use gqlfixture_http::GraphqlClient;
use report::{RunReport, colors};
use std::io::{self, IsTerminal, Write, stdout};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Color output mode for terminal display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if stdout is a TTY
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorMode {
    /// Returns true if colors should be used based on mode and terminal detection.
    fn should_use_colors(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stdout().is_terminal(),
        }
    }
}

/// Output format for the run command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for programmatic access
    Json,
}

/// gqlfixture - GraphQL fixture setup and teardown
#[derive(Parser, Debug)]
#[command(name = "gqlfixture", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Color output mode (auto, always, never)
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    color: ColorMode,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a fixture file without contacting any server
    Check(CheckArgs),

    /// Set up fixtures against an endpoint, then tear them down
    Run(RunArgs),
}

/// Arguments for the check subcommand.
#[derive(Parser, Debug)]
struct CheckArgs {
    /// Fixture file (YAML or JSON)
    file: PathBuf,
}

/// Arguments for the run subcommand.
#[derive(Parser, Debug)]
struct RunArgs {
    /// Fixture file (YAML or JSON)
    file: PathBuf,

    /// Override the endpoint URL from the fixture file
    #[arg(long)]
    endpoint: Option<String>,

    /// Leave fixtures in place instead of tearing them down
    #[arg(long)]
    keep: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays parseable
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check(args) => check_command(cli.color, &args),
        Commands::Run(args) => run_command(cli.color, args).await,
    }
}

fn load(path: &Path) -> Result<FixtureFile> {
    FixtureFile::from_file(path)
        .with_context(|| format!("Failed to load fixture file {}", path.display()))
}

fn check_command(color_mode: ColorMode, args: &CheckArgs) -> Result<()> {
    let use_colors = color_mode.should_use_colors();
    let file = load(&args.file)?;
    let count = file.fixtures.len();
    let mut sequence = file.into_sequence();

    if let Err(errors) = sequence.parse_result() {
        print_invalid(&mut stdout().lock(), &errors, OutputFormat::Table, use_colors)?;
        bail!(invalid_summary(&args.file, &errors));
    }

    if use_colors {
        println!(
            "{}✓{} {} is valid ({count} fixtures)",
            colors::GREEN,
            colors::RESET,
            args.file.display()
        );
    } else {
        println!("{} is valid ({count} fixtures)", args.file.display());
    }
    Ok(())
}

/// Error message for a file that failed validation. The errors themselves
/// have already been printed.
fn invalid_summary(path: &Path, errors: &ValidationErrors) -> String {
    format!("{} is invalid: {} validation error(s)", path.display(), errors.len())
}

fn print_invalid(
    out: &mut impl Write,
    errors: &ValidationErrors,
    format: OutputFormat,
    use_colors: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let report = RunReport {
                succeeded: false,
                captured: None,
                logs: &[],
                errors: errors.iter().map(ToString::to_string).collect(),
            };
            report::write_json(out, &report)
        }
        OutputFormat::Table => report::write_validation_errors(out, errors, use_colors),
    }
}

/// Endpoint from the file, with the URL replaced by `--endpoint` when given.
fn resolve_endpoint(file: &FixtureFile, url_override: Option<String>) -> Result<EndpointConfig> {
    match (file.endpoint.clone(), url_override) {
        (Some(mut endpoint), Some(url)) => {
            endpoint.url = url;
            Ok(endpoint)
        }
        (None, Some(url)) => Ok(EndpointConfig::new(url)),
        (Some(endpoint), None) => Ok(endpoint),
        (None, None) => bail!("No endpoint configured: add `endpoint.url` to the file or pass --endpoint"),
    }
}

async fn run_command(color_mode: ColorMode, args: RunArgs) -> Result<()> {
    let use_colors = color_mode.should_use_colors();
    let file = load(&args.file)?;
    let endpoint = resolve_endpoint(&file, args.endpoint)?;
    let client = GraphqlClient::from_endpoint(&endpoint).context("Failed to create GraphQL client")?;
    let mut sequence = file.into_sequence();

    if let Err(errors) = sequence.parse_result() {
        print_invalid(&mut stdout().lock(), &errors, args.format, use_colors)?;
        bail!(invalid_summary(&args.file, &errors));
    }

    if let Some(readiness) = &endpoint.readiness {
        info!(url = %endpoint.url, "Waiting for GraphQL endpoint");
        client
            .wait_until_ready(&readiness.query, readiness.max_wait(), readiness.interval())
            .await?;
    }

    let setup = sequence.setup(&client).await;
    if let Err(e) = &setup {
        warn!(error = %e, "Setup failed, tearing down what completed");
    }

    let teardown = if args.keep {
        info!("Keeping fixtures in place");
        None
    } else {
        Some(sequence.teardown(&client).await)
    };

    print_run(&sequence, &setup, teardown.as_ref(), args.format, use_colors)?;

    if let Err(e) = setup {
        return Err(e).context("Fixture setup failed");
    }
    if let Some(Err(e)) = teardown {
        return Err(e).context("Fixture teardown failed");
    }
    Ok(())
}

fn print_run(
    sequence: &FixtureSequence,
    setup: &gqlfixture_core::FixtureResult<()>,
    teardown: Option<&gqlfixture_core::FixtureResult<()>>,
    format: OutputFormat,
    use_colors: bool,
) -> Result<()> {
    let mut out = stdout().lock();

    match format {
        OutputFormat::Json => {
            let errors: Vec<String> = [Some(setup), teardown]
                .into_iter()
                .flatten()
                .filter_map(|r| r.as_ref().err().map(ToString::to_string))
                .collect();
            let report = RunReport {
                succeeded: errors.is_empty(),
                captured: sequence.captured(),
                logs: sequence.logs(),
                errors,
            };
            report::write_json(&mut out, &report)?;
        }
        OutputFormat::Table => {
            if let Some(captured) = sequence.captured() {
                report::write_captured(&mut out, captured, use_colors)?;
            }
            report::write_ledger_table(&mut out, sequence.logs(), use_colors)?;
        }
    }

    Ok(())
}
