//! CLI command definitions
//!
//! Defines the clap commands for the storefront CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more YAML suites against the API
    Run {
        /// Suite files, run in the given order
        #[arg(required = true)]
        suites: Vec<PathBuf>,

        /// Base URL of the API (overrides config and STOREFRONT_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Configuration file (default: platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print reports as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the operations the harness can call
    #[command(alias = "ops")]
    Operations,

    /// Load a fixture file and print its rows
    Fixture {
        /// CSV or JSON fixture
        path: PathBuf,

        /// Leading CSV lines to skip; the first is the header
        #[arg(long)]
        header_lines: Option<usize>,
    },
}
