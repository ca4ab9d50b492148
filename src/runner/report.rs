//! Scenario reports

use serde::Serialize;

use crate::assertion::{CheckResult, Outcome};
use crate::fixture::FixtureRow;
use crate::lifecycle::LifecycleReport;
use crate::operation::Operation;

/// Everything one fixture row produced
#[derive(Debug, Clone, Serialize)]
pub struct RowReport {
    /// 1-based position in the scenario
    pub index: usize,
    pub row: FixtureRow,
    /// `METHOD url` of the issued request
    pub request: String,
    /// HTTP status, absent when the request never completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub checks: Vec<CheckResult>,
    /// Transport failure that prevented the checks from running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RowReport {
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.checks.iter().all(CheckResult::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed())
    }

    pub fn tolerated(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks
            .iter()
            .filter(|c| matches!(c.outcome, Outcome::Tolerated { .. }))
    }
}

/// All rows of one named scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub operation: Operation,
    pub rows: Vec<RowReport>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.rows.iter().all(RowReport::passed)
    }

    pub fn checks_total(&self) -> usize {
        self.rows.iter().map(|r| r.checks.len()).sum()
    }

    pub fn checks_failed(&self) -> usize {
        self.rows.iter().map(|r| r.failures().count()).sum()
    }
}

/// Result of running one suite file
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub scenarios: Vec<ScenarioReport>,
    /// Set when the suite aborted before or while running scenarios
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<LifecycleReport>,
}

impl SuiteReport {
    pub fn aborted(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            scenarios: Vec::new(),
            aborted: Some(reason.into()),
            lifecycle: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.aborted.is_none() && self.scenarios.iter().all(ScenarioReport::passed)
    }

    pub fn rows_total(&self) -> usize {
        self.scenarios.iter().map(|s| s.rows.len()).sum()
    }

    pub fn rows_failed(&self) -> usize {
        self.scenarios
            .iter()
            .flat_map(|s| s.rows.iter())
            .filter(|r| !r.passed())
            .count()
    }
}
