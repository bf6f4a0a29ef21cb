#![allow(clippy::print_stdout)]

pub mod handlers;
pub mod models;

use crate::handlers::{build, infer};
use crate::models::args::{Cli, Commands};

use anyhow::Result;
use arbor::logger::{Logger, level_from_verbosity};
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _logger = Logger::builder()
        .name(env!("CARGO_PKG_NAME"))
        .console_format(cli.log_format.into())
        .level(level_from_verbosity(cli.verbose, cli.quiet))
        .init()?;

    let output = match cli.command {
        Commands::Infer { example } => infer::infer_schema(&example)?,
        Commands::Build { example, snapshot } => {
            build::build_instance(&example, snapshot.as_deref(), cli.config.as_deref())?
        },
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
