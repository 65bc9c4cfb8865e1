//! apicase - data-driven API test runner
//!
//! Runs the cases in a spreadsheet, CSV or YAML file against an API host and
//! records a pass/fail/skip verdict for each one.

use apicase::common::config::Config;
use apicase::common::{logging, paths};
use apicase::{cli, commands};
use clap::Parser;
use commands::Commands;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "apicase", about = "Data-driven API test runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir/apicase/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let guard = logging::init_cli(config.logging.dir.as_deref(), cli.debug);

    let config_path = cli.config.clone().or_else(paths::config_path);

    let code = match cli::dispatch(cli.command, &config, config_path.as_deref()).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    // flush the log file before exiting
    drop(guard);
    std::process::exit(code);
}
