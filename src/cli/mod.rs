//! CLI command handling
//!
//! Dispatches CLI commands and formats output.

use std::path::Path;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::{Config, Result};
use crate::fixture::Fixture;
use crate::http::HttpClient;
use crate::operation::Operation;
use crate::runner::SuiteReport;
use crate::suite::{print_report, run_suite};

/// Dispatch a CLI command
///
/// Returns `false` when a suite failed or aborted.
pub async fn dispatch(command: Commands, verbose: bool) -> Result<bool> {
    match command {
        Commands::Run {
            suites,
            base_url,
            config,
            json,
        } => {
            let mut config = Config::load_from(config.as_deref())?;
            if let Some(url) = base_url {
                config.base_url = url;
            }
            tracing::info!(base_url = config.base_url(), suites = suites.len(), "Starting run");

            let client = HttpClient::new(&config.http)?;
            let mut reports = Vec::with_capacity(suites.len());

            for path in &suites {
                let report = match run_suite(path, &client, &config).await {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::error!(suite = %path.display(), error = %e, "Suite aborted");
                        SuiteReport::aborted(suite_label(path), e.to_string())
                    }
                };
                if !json {
                    print_report(&report, verbose);
                }
                reports.push(report);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else if suites.len() > 1 {
                print_totals(&reports);
            }

            Ok(reports.iter().all(SuiteReport::passed))
        }

        Commands::Operations => {
            println!(
                "{:<18} {:<7} {:<28} {}",
                "OPERATION".bold(),
                "METHOD".bold(),
                "PATH".bold(),
                "PARAMETERS".bold()
            );
            for op in Operation::ALL {
                let params: Vec<String> = op
                    .parameters()
                    .iter()
                    .map(|p| {
                        if op.is_optional(p) {
                            format!("{}?", p)
                        } else {
                            p.to_string()
                        }
                    })
                    .collect();
                println!(
                    "{:<18} {:<7} {:<28} {}",
                    op.name(),
                    op.method().as_str(),
                    op.path(),
                    if params.is_empty() {
                        "-".dimmed().to_string()
                    } else {
                        params.join(", ")
                    }
                );
            }
            Ok(true)
        }

        Commands::Fixture { path, header_lines } => {
            let mut fixture = Fixture::open(&path)?;
            if let Some(n) = header_lines {
                fixture = fixture.header_lines(n);
            }

            let mut count = 0;
            for row in fixture.rows()? {
                let row = row?;
                println!("{:>4}  {}", row.line(), serde_json::to_string(&row)?);
                count += 1;
            }
            println!(
                "{} {} {} rows from {}",
                "✓".green(),
                count,
                fixture.format().as_str(),
                path.display().to_string().dimmed()
            );
            Ok(true)
        }
    }
}

fn suite_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_totals(reports: &[SuiteReport]) {
    let failed = reports.iter().filter(|r| !r.passed()).count();
    println!();
    if failed == 0 {
        println!("{} all {} suites passed", "✓".green().bold(), reports.len());
    } else {
        println!(
            "{} {} of {} suites failed",
            "✗".red().bold(),
            failed.to_string().red(),
            reports.len()
        );
    }
}
