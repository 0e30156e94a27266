//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{RefsCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Build recipe pipeline runner
#[derive(Debug, Parser, Clone)]
#[command(name = "recipe-pipeline")]
#[command(version = "0.1.0")]
#[command(about = "Runs the pipelines of a declarative build recipe", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a recipe's build or test pipeline
    Run(RunCommand),

    /// Validate a recipe
    Validate(ValidateCommand),

    /// Print the package URLs of fetched sources
    Refs(RefsCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
