/// CLI argument definitions for the `gemelo` command.
///
/// Defines all subcommands, their arguments, and long help text
/// using the `clap` derive macros.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::cli_help;

/// Top-level CLI parser with a single subcommand selector.
#[derive(Parser)]
#[command(
    name = "gemelo",
    version,
    about = "Near-duplicate code pattern detector"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Common arguments shared by analysis commands.
#[derive(Args)]
pub struct CommonArgs {
    /// Directory to analyze (default: current directory)
    pub path: Option<PathBuf>,

    /// Output the JSON report
    #[arg(long)]
    pub json: bool,

    /// Include test files and directories in analysis (excluded by default)
    #[arg(long)]
    pub include_tests: bool,
}

/// All available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory tree for near-duplicate code patterns
    #[command(long_about = cli_help::SCAN)]
    Scan {
        #[command(flatten)]
        common: CommonArgs,

        /// Show detailed report with duplicate groups and locations
        #[arg(short, long)]
        report: bool,

        /// Show all duplicate groups (default: top 20)
        #[arg(long)]
        show_all: bool,

        /// Minimum Jaccard similarity for a duplicate match (default: 0.4)
        #[arg(long)]
        min_similarity: Option<f64>,

        /// Minimum lines for a comparison block (default: 5)
        #[arg(long)]
        min_lines: Option<i64>,

        /// Blocks scored per batch (default: 100)
        #[arg(long)]
        batch_size: Option<i64>,

        /// Compare every pair of blocks instead of using the candidate index
        #[arg(long)]
        exhaustive: bool,

        /// Minimum shared tokens for a candidate pair (default: 8)
        #[arg(long)]
        min_shared_tokens: Option<i64>,

        /// Candidate list cap per block (default: 100)
        #[arg(long)]
        max_candidates: Option<i64>,

        /// Do not print per-batch match counts while scanning
        #[arg(long)]
        no_stream: bool,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,

        /// Include glob, relative to the scan root (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Exclude glob, relative to the scan root (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Exit with code 2 when an issue at or above this severity exists
        #[arg(long, value_parser = ["critical", "major", "minor"])]
        fail_on: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}
