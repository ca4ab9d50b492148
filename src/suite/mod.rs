//! YAML scenario suites
//!
//! A suite lists scenarios as `{operation, fixture, expect}` entries and
//! optionally names the test users whose lifecycle brackets the run.

mod config;
mod runner;

pub use config::*;
pub use runner::{print_report, render, run_suite, Suite};
