//! Scenario runner
//!
//! Drives one operation over a sequence of fixture rows. Rows run strictly
//! one after another; each row's response is evaluated and dropped before the
//! next request is sent.

mod report;

pub use report::{RowReport, ScenarioReport, SuiteReport};

use crate::assertion::{assert_response, Expectation};
use crate::fixture::FixtureRow;
use crate::http::Transport;
use crate::operation::{Method, Operation, Request};

/// Issues one request per row and evaluates its expectations
pub struct ScenarioRunner<'a, T: Transport + ?Sized> {
    transport: &'a T,
    base_url: String,
}

impl<'a, T: Transport + ?Sized> ScenarioRunner<'a, T> {
    pub fn new(transport: &'a T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// Run an operation with its documented method
    pub async fn run<I, F>(&self, operation: Operation, rows: I, expectations: F) -> Vec<RowReport>
    where
        I: IntoIterator<Item = FixtureRow>,
        F: FnMut(&FixtureRow) -> Vec<Expectation>,
    {
        self.run_with_method(operation, operation.method(), rows, expectations)
            .await
    }

    /// Run an operation's endpoint with an explicit method
    pub async fn run_with_method<I, F>(
        &self,
        operation: Operation,
        method: Method,
        rows: I,
        mut expectations: F,
    ) -> Vec<RowReport>
    where
        I: IntoIterator<Item = FixtureRow>,
        F: FnMut(&FixtureRow) -> Vec<Expectation>,
    {
        let mut reports = Vec::new();
        for (idx, row) in rows.into_iter().enumerate() {
            let expected = expectations(&row);
            let report = self
                .run_row(operation, method, idx + 1, row, &expected)
                .await;
            reports.push(report);
        }
        reports
    }

    async fn run_row(
        &self,
        operation: Operation,
        method: Method,
        index: usize,
        row: FixtureRow,
        expectations: &[Expectation],
    ) -> RowReport {
        let request = Request::build_with_method(operation, method, &self.base_url, &row);
        let summary = request.summary();

        let snapshot = match self.transport.execute(&request).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(request = %summary, row = index, error = %e, "Request failed");
                return RowReport {
                    index,
                    row,
                    request: summary,
                    status: None,
                    checks: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let checks = assert_response(&snapshot, expectations);
        let report = RowReport {
            index,
            row,
            request: summary,
            status: Some(snapshot.status),
            checks,
            error: None,
        };

        if report.passed() {
            tracing::debug!(request = %report.request, row = index, "Row passed");
        } else {
            tracing::info!(
                request = %report.request,
                row = index,
                failed = report.failures().count(),
                body = %snapshot.body_excerpt(200),
                "Row failed"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::{messages, ExpectedResult, JsonPath, Outcome};
    use crate::common::{Error, Result};
    use crate::http::ResponseSnapshot;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers login calls; refuses to connect for a poisoned email
    #[derive(Default)]
    struct LoginDesk {
        seen: Mutex<Vec<Request>>,
    }

    #[async_trait]
    impl Transport for LoginDesk {
        async fn execute(&self, request: &Request) -> Result<ResponseSnapshot> {
            self.seen.lock().unwrap().push(request.clone());
            let email = request.params.iter().find(|(n, _)| n == "email");

            let body = match (request.method, email) {
                (_, Some((_, e))) if e == "unreachable@example.com" => {
                    return Err(Error::Internal("connection reset".to_string()));
                }
                (Method::Post, Some(_)) => {
                    serde_json::json!({"responseCode": 404, "message": messages::USER_NOT_FOUND})
                }
                (Method::Post, None) => serde_json::json!({
                    "responseCode": 400,
                    "message": messages::MISSING_EMAIL_OR_PASSWORD
                }),
                _ => serde_json::json!({
                    "responseCode": 405,
                    "message": messages::METHOD_NOT_SUPPORTED
                }),
            };
            Ok(ResponseSnapshot::new(200, Vec::new(), body.to_string()))
        }
    }

    fn expected_from_row(row: &FixtureRow) -> Vec<Expectation> {
        let code: u16 = row.value("expected_code").parse().unwrap();
        ExpectedResult::new(code, row.value("expected_message")).expectations()
    }

    #[tokio::test]
    async fn test_rows_run_in_order_with_their_own_expectations() {
        let desk = LoginDesk::default();
        let runner = ScenarioRunner::new(&desk, "http://fake");
        let rows = vec![
            FixtureRow::from_pairs([
                ("email", "nobody@example.com"),
                ("password", "x"),
                ("expected_code", "404"),
                ("expected_message", messages::USER_NOT_FOUND),
            ]),
            FixtureRow::from_pairs([
                ("password", "x"),
                ("expected_code", "400"),
                ("expected_message", messages::MISSING_EMAIL_OR_PASSWORD),
            ]),
        ];

        let reports = runner
            .run(Operation::VerifyLogin, rows, expected_from_row)
            .await;

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(RowReport::passed), "{:?}", reports);
        assert_eq!(reports[1].index, 2);
        assert_eq!(reports[1].status, Some(200));

        let seen = desk.seen.lock().unwrap();
        assert_eq!(seen[0].params[0].1, "nobody@example.com");
        // expectation columns never reach the wire
        assert!(seen[1].params.iter().all(|(n, _)| !n.starts_with("expected")));
    }

    #[tokio::test]
    async fn test_transport_error_is_recorded_and_next_row_runs() {
        let desk = LoginDesk::default();
        let runner = ScenarioRunner::new(&desk, "http://fake");
        let rows = vec![
            FixtureRow::from_pairs([("email", "unreachable@example.com"), ("password", "x")]),
            FixtureRow::from_pairs([("email", "nobody@example.com"), ("password", "x")]),
        ];

        let reports = runner
            .run(Operation::VerifyLogin, rows, |_| {
                ExpectedResult::new(404, messages::USER_NOT_FOUND).expectations()
            })
            .await;

        assert!(!reports[0].passed());
        assert_eq!(reports[0].status, None);
        assert!(reports[0].error.as_deref().unwrap().contains("connection reset"));
        assert!(reports[1].passed());
    }

    #[tokio::test]
    async fn test_method_override_and_failed_checks() {
        let desk = LoginDesk::default();
        let transport: &dyn Transport = &desk;
        let runner = ScenarioRunner::new(transport, "http://fake");

        let reports = runner
            .run_with_method(
                Operation::VerifyLogin,
                Method::Delete,
                vec![FixtureRow::default()],
                |_| {
                    ExpectedResult::method_not_supported()
                        .with(Expectation::json_equals(
                            JsonPath::root().field("message"),
                            "something else",
                        ))
                        .expectations()
                },
            )
            .await;

        let report = &reports[0];
        assert_eq!(report.request, "DELETE http://fake/api/verifyLogin");
        assert_eq!(report.checks.len(), 4);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.checks[3].outcome, Outcome::Failed);
    }
}
