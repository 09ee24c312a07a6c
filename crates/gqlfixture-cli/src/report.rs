//! Terminal and JSON rendering of sequence results.

use gqlfixture_core::{CaptureStore, LogEntry, Outcome, ValidationErrors};
use serde::Serialize;
use std::io::{self, Write};

/// ANSI color codes for terminal output.
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Everything a `run` produced, as emitted with `--format json`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub succeeded: bool,
    pub captured: Option<&'a CaptureStore>,
    pub logs: &'a [LogEntry],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

pub fn write_json(out: &mut impl Write, report: &RunReport<'_>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
    writeln!(out, "{json}")
}

fn outcome_color(outcome: &Outcome) -> &'static str {
    use colors::*;
    match outcome {
        Outcome::Completed => GREEN,
        Outcome::Captured(_) => CYAN,
        Outcome::NotExist => DIM,
        Outcome::Failed(_) => RED,
    }
}

fn outcome_text(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Completed => "completed".to_string(),
        Outcome::Captured(n) => format!("captured {n} value(s)"),
        Outcome::NotExist => "not exist".to_string(),
        Outcome::Failed(reason) => format!("failed: {}", reason.replace('\n', " ")),
    }
}

/// Prints the ledger as a table.
pub fn write_ledger_table(
    out: &mut impl Write,
    entries: &[LogEntry],
    use_colors: bool,
) -> io::Result<()> {
    use colors::*;

    if entries.is_empty() {
        if use_colors {
            writeln!(out, "{DIM}No fixture steps were run.{RESET}")?;
        } else {
            writeln!(out, "No fixture steps were run.")?;
        }
        return Ok(());
    }

    if use_colors {
        writeln!(out, "{BOLD}{DIM}  # │ Fixture │ Stage    │ Outcome{RESET}")?;
        writeln!(out, "{DIM}────┼─────────┼──────────┼──────────────────────────{RESET}")?;
    } else {
        writeln!(out, "  # | Fixture | Stage    | Outcome")?;
        writeln!(out, "----|---------|----------|--------------------------")?;
    }

    for (i, entry) in entries.iter().enumerate() {
        let text = outcome_text(&entry.outcome);
        if use_colors {
            let color = outcome_color(&entry.outcome);
            writeln!(
                out,
                "{DIM}{:>3}{RESET} │ {:>7} │ {:<8} │ {color}{}{RESET}",
                i + 1,
                entry.fixture,
                entry.stage,
                text
            )?;
        } else {
            writeln!(
                out,
                "{:>3} | {:>7} | {:<8} | {}",
                i + 1,
                entry.fixture,
                entry.stage,
                text
            )?;
        }
    }

    let failures = entries.iter().filter(|e| e.is_failure()).count();
    if use_colors {
        writeln!(out, "\n{DIM}Total: {} steps, {failures} failed{RESET}", entries.len())
    } else {
        writeln!(out, "\nTotal: {} steps, {failures} failed", entries.len())
    }
}

/// Prints captured values, one per line.
pub fn write_captured(
    out: &mut impl Write,
    captured: &CaptureStore,
    use_colors: bool,
) -> io::Result<()> {
    use colors::*;

    if captured.is_empty() {
        return Ok(());
    }

    if use_colors {
        writeln!(out, "{BOLD}Captured:{RESET}")?;
    } else {
        writeln!(out, "Captured:")?;
    }
    for (name, value) in captured.iter() {
        if use_colors {
            writeln!(out, "  {CYAN}{name}{RESET} = {value}")?;
        } else {
            writeln!(out, "  {name} = {value}")?;
        }
    }
    writeln!(out)
}

/// Prints validation failures.
pub fn write_validation_errors(
    out: &mut impl Write,
    errors: &ValidationErrors,
    use_colors: bool,
) -> io::Result<()> {
    use colors::*;

    for error in errors {
        if use_colors {
            writeln!(out, "{RED}✗{RESET} {error}")?;
        } else {
            writeln!(out, "✗ {error}")?;
        }
    }
    Ok(())
}
