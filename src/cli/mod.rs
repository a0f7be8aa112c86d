//! CLI surface for misp-galaxies.
//!
//! Thin handlers over the library: load the corpus, run one query,
//! render text for humans or JSON for scripts.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "misp-galaxies",
    version,
    about = "Query the MISP galaxy taxonomy corpus",
    infer_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Corpus root (default: bundled data, or MISP_GALAXIES_DATA).
    #[arg(long, global = true, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Machine-readable JSON output.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Errors only.
    #[arg(short = 'q', long, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List loaded galaxy and cluster types.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one cluster record.
    Show(ShowArgs),

    /// Search cluster values, synonyms and UUIDs by substring.
    Search(SearchArgs),

    /// Print every machinetag in the corpus.
    Tags,

    /// Resolve a machinetag back to its cluster value.
    Revert(RevertArgs),

    /// Validate the corpus against its bundled schemas.
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Galaxies only.
    #[arg(long, conflicts_with = "clusters")]
    pub galaxies: bool,

    /// Clusters only.
    #[arg(long)]
    pub clusters: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Cluster type, e.g. `threat-actor`.
    pub cluster_type: String,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    pub query: String,

    /// Print machinetags instead of values.
    #[arg(long)]
    pub tags: bool,
}

#[derive(Args, Debug)]
pub struct RevertArgs {
    /// Machinetag, e.g. `misp-galaxy:threat-actor="Sofacy"`.
    pub machinetag: String,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Galaxies only.
    #[arg(long, conflicts_with = "clusters")]
    pub galaxies: bool,

    /// Clusters only.
    #[arg(long)]
    pub clusters: bool,
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

pub fn run(cli: Cli) -> crate::Result<()> {
    commands::run(cli)
}
