//! CLI command definitions
//!
//! Defines the clap commands for the apicase CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run test cases and write verdicts back into the case table
    Run {
        /// Case file (.xlsx, .csv, .yaml). Defaults to every source in the config
        path: Option<PathBuf>,

        /// Print the run report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Show request details for failed cases
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the cases in a case file without running them
    #[command(alias = "ls")]
    List {
        /// Case file (.xlsx, .csv, .yaml). Defaults to every source in the config
        path: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration
    Config,
}
