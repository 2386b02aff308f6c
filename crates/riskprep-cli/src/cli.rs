//! CLI argument definitions for the riskprep pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "riskprep",
    version,
    about = "Normalize uploaded tabular data into a canonical table for risk modeling",
    long_about = "Normalize uploaded tabular data into a canonical table for risk modeling.\n\n\
                  Removes duplicate rows, replaces sentinel values, normalizes date columns,\n\
                  coerces column types and remediates missing values, driven by a JSON\n\
                  configuration document."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the normalization pipeline over a data file.
    Run(RunArgs),

    /// Validate a configuration document without running the pipeline.
    CheckConfig(CheckConfigArgs),

    /// List the supported date format codes.
    Formats,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Data file to normalize (.csv, .tsv, .txt, .json, .ndjson, .jsonl).
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Configuration document. Without it only duplicate removal runs.
    #[arg(long = "config", short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Exact output file path. Takes precedence over --output-dir.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Base directory for timestamped run directories.
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        env = "RISKPREP_OUTPUT_DIR",
        default_value = "output"
    )]
    pub output_dir: PathBuf,

    /// File name written inside the run directory.
    #[arg(
        long = "output-file",
        value_name = "NAME",
        env = "RISKPREP_OUTPUT_FILE",
        default_value = "output.csv"
    )]
    pub output_file: String,

    /// Refuse to run when the configuration has validation errors.
    #[arg(long = "strict-config")]
    pub strict_config: bool,

    /// Run the pipeline and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct CheckConfigArgs {
    /// Configuration document to validate.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
