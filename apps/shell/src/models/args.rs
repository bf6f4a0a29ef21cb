//! # CLI Argument Definitions

use arbor::logger::Format;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "arbor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Infer state-tree models from example JSON and build instances")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Tree config file (TOML or JSON); `ARBOR__*` variables override it or apply alone
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log record format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the schema inferred from an example document
    Infer {
        /// Example JSON file, or `-` for stdin
        example: PathBuf,
    },
    /// Infer a model from an example and print the snapshot of a fresh instance
    Build {
        /// Example JSON file, or `-` for stdin
        example: PathBuf,
        /// Snapshot JSON applied to the instance (defaults to `{}`)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl From<LogFormat> for Format {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Compact => Self::Compact,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Json => Self::Json,
        }
    }
}
