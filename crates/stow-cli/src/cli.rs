use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stow",
    about = "Inspect stow save files",
    version,
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
    /// Print every scalar in a file with its dotted path
    Dump(DumpArgs),
    /// Print only the header text of a file
    Header(HeaderArgs),
    /// Print one scalar or subtree addressed by a dotted path
    Get(GetArgs),
}

#[derive(Args)]
pub struct DumpArgs {
    pub file: PathBuf,
    /// Do not interpret positive numbers as timestamps
    #[arg(long)]
    pub no_dates: bool,
    /// Show timestamps in UTC instead of local time
    #[arg(long, conflicts_with = "no_dates")]
    pub utc: bool,
    /// Refuse files nested deeper than this
    #[arg(long)]
    pub max_depth: Option<usize>,
}

#[derive(Args)]
pub struct HeaderArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    pub file: PathBuf,
    /// e.g. `address.city` or `array[1].id`
    pub path: String,
}
