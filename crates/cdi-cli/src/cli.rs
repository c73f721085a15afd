//! CLI argument definitions for the chart data inference tool.

use std::path::PathBuf;

use cdi_adapt::AdapterKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cdi",
    version,
    about = "Chart data inference - infer types, mappings and chart points from raw data",
    long_about = "Infer column types, visual role mappings and chart types from\n\
                  schema-less data, then turn it into chart points.\n\n\
                  Reads delimited text (.csv, .tsv, .txt) or a JSON array of records."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
    /// Suggest column types, role mappings and chart types.
    Suggest(SuggestArgs),

    /// Check whether the input can be charted.
    Validate(InputArgs),

    /// Turn the input into chart points.
    Transform(TransformArgs),

    /// Analyze or apply a wide/long reshape.
    Pivot(PivotArgs),

    /// Report the structure of the input.
    Inspect(InputArgs),
}

/// Where to read records from and how to decode them.
#[derive(Args)]
pub struct InputArgs {
    /// Path to a delimited text file or a JSON array of records.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Adapter to use instead of detecting one from the data.
    #[arg(long = "adapter", value_name = "KIND", value_parser = parse_adapter)]
    pub adapter: Option<AdapterKind>,

    /// Field delimiter for delimited text (default: tab for .tsv, comma otherwise).
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Treat the first line of delimited text as data, naming columns column_1..N.
    #[arg(long = "no-header")]
    pub no_header: bool,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Args)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Maximum number of field suggestions to print.
    #[arg(long = "limit", value_name = "N", default_value_t = 20)]
    pub limit: usize,
}

/// Role overrides; unset roles fall back to the suggested mapping.
#[derive(Args, Default)]
pub struct MappingArgs {
    /// Field path for the x role.
    #[arg(long = "x", value_name = "FIELD")]
    pub x: Option<String>,

    /// Field path for the y role.
    #[arg(long = "y", value_name = "FIELD")]
    pub y: Option<String>,

    /// Field path for the color role.
    #[arg(long = "color-field", value_name = "FIELD")]
    pub color: Option<String>,

    /// Field path for the size role.
    #[arg(long = "size-field", value_name = "FIELD")]
    pub size: Option<String>,
}

#[derive(Args)]
pub struct TransformArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub mapping: MappingArgs,

    /// Reshape to apply first: `auto` or a JSON pivot configuration.
    #[arg(long = "pivot", value_name = "SPEC")]
    pub pivot: Option<String>,

    /// Drop unusable rows without logging them.
    #[arg(long = "quiet-rows")]
    pub quiet_rows: bool,
}

#[derive(Args)]
pub struct PivotArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Reshape to apply: `auto` or a JSON pivot configuration. Without it,
    /// only the pivotability analysis is printed.
    #[arg(long = "pivot", value_name = "SPEC")]
    pub pivot: Option<String>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    #[default]
    Table,
    Json,
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

fn parse_adapter(value: &str) -> Result<AdapterKind, String> {
    value.parse().map_err(|error: cdi_adapt::AdapterError| error.to_string())
}
