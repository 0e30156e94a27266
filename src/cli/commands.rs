//! CLI command definitions

use crate::core::Arch;
use clap::Args;
use std::path::PathBuf;

/// Recipe selection shared by every command
#[derive(Debug, Args, Clone)]
pub struct TargetArgs {
    /// Path to the recipe YAML file
    #[arg(short, long)]
    pub file: String,

    /// Target architecture (defaults to the host)
    #[arg(long)]
    pub arch: Option<Arch>,

    /// Host architecture, when cross-compiling
    #[arg(long)]
    pub host_arch: Option<Arch>,

    /// Build the named subpackage's pipeline
    #[arg(long)]
    pub subpackage: Option<String>,

    /// Use the recipe's test pipeline
    #[arg(long)]
    pub test: bool,

    /// Build options to enable
    #[arg(long)]
    pub option: Vec<String>,

    /// Directory holding step fragments (`<dir>/<uses>.yaml`)
    #[arg(long, default_value = "pipelines")]
    pub pipeline_dir: PathBuf,
}

/// Run a recipe pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Trace shell commands
    #[arg(long)]
    pub debug: bool,

    /// Drop into a shell when a step fails
    #[arg(short, long)]
    pub interactive: bool,

    /// Workspace directory commands run from
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Extra environment for every command (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,
}

/// Validate a recipe
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output the compiled pipeline in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Print package URLs
#[derive(Debug, Args, Clone)]
pub struct RefsCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}
