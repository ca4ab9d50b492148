//! storefront - contract tests for the storefront demo API
//!
//! Runs YAML suites of data-driven HTTP scenarios and reports every check.

use std::path::PathBuf;

use clap::Parser;
use storefront::common::logging;
use storefront::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "storefront", about = "Data-driven contract tests for the storefront API")]
#[command(version, long_about = None)]
struct Cli {
    /// Show passing checks and debug logs
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write a detailed log (default location when no file is given)
    #[arg(long, global = true)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = match cli.log_file {
        Some(Some(path)) => Some(path),
        Some(None) => logging::default_log_file(),
        None => None,
    };
    let _guard = logging::init_cli(cli.verbose, log_file.as_deref());

    match cli::dispatch(cli.command, cli.verbose).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
