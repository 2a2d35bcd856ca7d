use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "statepatch",
    about = "Diff and patch JSON state snapshots",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the change list between two state files
    Diff(DiffArgs),
    /// Apply a change list to a state file
    Patch(PatchArgs),
    /// Show the edit script between two JSON arrays
    Edits(PairArgs),
    /// Show the longest common subsequence of two JSON arrays
    Same(PairArgs),
    /// Publish a series of state files and replay them on a replica
    Stream(StreamArgs),
    /// Show the effective sync configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    /// Compare top-level keys only
    #[arg(long)]
    pub shallow: bool,
    /// Do not recurse below this many keys
    #[arg(long)]
    pub max_depth: Option<usize>,
    /// Dotted path to send whole (repeatable)
    #[arg(long = "opaque", value_name = "PATH")]
    pub opaque: Vec<String>,
    /// Compare containers by content instead of identity
    #[arg(long)]
    pub structural: bool,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct PatchArgs {
    pub old: PathBuf,
    pub patch: PathBuf,
    /// The change list came from a shallow diff
    #[arg(long)]
    pub shallow: bool,
}

#[derive(Args)]
pub struct PairArgs {
    pub a: PathBuf,
    pub b: PathBuf,
}

#[derive(Args)]
pub struct StreamArgs {
    #[arg(required = true, num_args = 1..)]
    pub states: Vec<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
}
