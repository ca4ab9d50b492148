//! Suite loading and execution
//!
//! A suite is resolved completely before the first request goes out: every
//! fixture is read and every expectation is compiled, so a broken suite
//! fails without touching the remote.

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::assertion::{Check, Expectation, Extractor, Outcome};
use crate::common::paths::resolve_relative;
use crate::common::{Config, Error, Result};
use crate::fixture::{Fixture, FixtureRow};
use crate::http::Transport;
use crate::lifecycle::{Lifecycle, Setup, TestUser};
use crate::operation::{Method, Operation};
use crate::runner::{ScenarioReport, ScenarioRunner, SuiteReport};

use super::config::{ScenarioSpec, SuiteFile};

/// A loaded suite, ready to run
#[derive(Debug)]
pub struct Suite {
    pub name: String,
    pub description: Option<String>,
    path: PathBuf,
    users: Vec<TestUser>,
    setup: Setup,
    scenarios: Vec<Scenario>,
}

/// A loaded scenario
#[derive(Debug)]
struct Scenario {
    name: String,
    operation: Operation,
    method: Method,
    rows: Vec<FixtureRow>,
    params: Vec<(String, String)>,
    omit: Vec<String>,
    expectations: Vec<Expectation>,
}

/// Load and run one suite file
pub async fn run_suite<T: Transport + ?Sized>(
    path: &Path,
    transport: &T,
    config: &Config,
) -> Result<SuiteReport> {
    Suite::load(path)?.run(transport, config).await
}

impl Suite {
    /// Read a suite file and everything it references
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read suite '{}': {}", path.display(), e))
        })?;
        let file: SuiteFile = serde_yaml::from_str(&content).map_err(|error| Error::Yaml {
            path: path.to_path_buf(),
            error,
        })?;

        if file.scenarios.is_empty() {
            return Err(Error::Config(format!(
                "Suite '{}' has no scenarios",
                path.display()
            )));
        }

        let dir = path.parent().unwrap_or(Path::new("."));

        let users = match &file.users {
            Some(users) => Fixture::open(resolve_relative(dir, users))?
                .load()?
                .into_iter()
                .map(TestUser::from_row)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        if users.is_empty() && file.setup == Setup::Present {
            tracing::warn!(suite = %file.name, "setup: present has no effect without users");
        }

        let scenarios = file
            .scenarios
            .iter()
            .map(|spec| Scenario::load(dir, spec))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            suite = %file.name,
            users = users.len(),
            scenarios = scenarios.len(),
            "Suite loaded"
        );

        Ok(Self {
            name: file.name,
            description: file.description,
            path: path.to_path_buf(),
            users,
            setup: file.setup,
            scenarios,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run every scenario, inside the user lifecycle when the suite has users
    pub async fn run<T: Transport + ?Sized>(
        &self,
        transport: &T,
        config: &Config,
    ) -> Result<SuiteReport> {
        let body = self.run_scenarios(transport, config.base_url());

        if self.users.is_empty() {
            return Ok(SuiteReport {
                name: self.name.clone(),
                description: self.description.clone(),
                scenarios: body.await,
                aborted: None,
                lifecycle: None,
            });
        }

        let lifecycle = Lifecycle::new(transport, config.base_url(), &config.messages);
        let (scenarios, lifecycle) = lifecycle
            .run_with_lifecycle(&self.users, self.setup, body)
            .await?;

        Ok(SuiteReport {
            name: self.name.clone(),
            description: self.description.clone(),
            scenarios,
            aborted: None,
            lifecycle: Some(lifecycle),
        })
    }

    async fn run_scenarios<T: Transport + ?Sized>(
        &self,
        transport: &T,
        base_url: &str,
    ) -> Vec<ScenarioReport> {
        let runner = ScenarioRunner::new(transport, base_url);
        let mut reports = Vec::with_capacity(self.scenarios.len());

        for scenario in &self.scenarios {
            tracing::info!(
                suite = %self.name,
                scenario = %scenario.name,
                rows = scenario.rows.len(),
                "Running scenario"
            );
            let rows = scenario.rows.iter().map(|row| scenario.prepare(row));
            let rows = runner
                .run_with_method(scenario.operation, scenario.method, rows, |row| {
                    scenario.expectations_for(row)
                })
                .await;

            reports.push(ScenarioReport {
                name: scenario.name.clone(),
                operation: scenario.operation,
                rows,
            });
        }
        reports
    }
}

impl Scenario {
    fn load(dir: &Path, spec: &ScenarioSpec) -> Result<Self> {
        let rows = match &spec.fixture {
            Some(path) => {
                let mut fixture = Fixture::open(resolve_relative(dir, path))?;
                if let Some(n) = spec.header_lines {
                    fixture = fixture.header_lines(n);
                }
                fixture.load()?
            }
            None => vec![FixtureRow::default()],
        };

        let expectations = spec
            .expect
            .iter()
            .map(|e| e.compile())
            .collect::<Result<Vec<_>>>()
            .map_err(|e| match e {
                Error::Config(msg) => Error::Config(format!("Scenario '{}': {}", spec.name, msg)),
                other => other,
            })?;
        if expectations.is_empty() {
            return Err(Error::Config(format!(
                "Scenario '{}' has no expectations",
                spec.name
            )));
        }

        Ok(Self {
            name: spec.name.clone(),
            operation: spec.operation,
            method: spec.method.unwrap_or_else(|| spec.operation.method()),
            rows,
            params: spec
                .params
                .iter()
                .map(|(name, value)| (name.clone(), value.0.clone()))
                .collect(),
            omit: spec.omit.clone(),
            expectations,
        })
    }

    /// The row actually sent: fixture row plus params, minus omitted fields
    fn prepare(&self, row: &FixtureRow) -> FixtureRow {
        let mut prepared = row.clone();
        for (name, template) in &self.params {
            prepared.set(name.clone(), render(template, row));
        }
        for name in &self.omit {
            prepared.remove(name);
        }
        prepared
    }

    fn expectations_for(&self, row: &FixtureRow) -> Vec<Expectation> {
        self.expectations
            .iter()
            .map(|e| render_expectation(e, row))
            .collect()
    }
}

/// Substitute `${field}` with the row's value; unknown fields render empty
pub fn render(template: &str, row: &FixtureRow) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(row.value(rest[start + 2..start + 2 + len].trim()));
        rest = &rest[start + 2 + len + 1..];
    }
    out.push_str(rest);
    out
}

fn render_expectation(expectation: &Expectation, row: &FixtureRow) -> Expectation {
    let extractor = match &expectation.extractor {
        Extractor::Status => Extractor::Status,
        Extractor::Header(name) => Extractor::Header(render(name, row)),
        Extractor::Json(path) => Extractor::Json(path.map_text(|s| render(s, row))),
    };
    let check = match &expectation.check {
        Check::Equals(v) => Check::Equals(render(v, row)),
        Check::AnyContains(term) => Check::AnyContains(render(term, row)),
        Check::Keys(keys) => Check::Keys(keys.iter().map(|k| render(k, row)).collect()),
        other => other.clone(),
    };
    Expectation {
        extractor,
        check,
        tolerate_missing: expectation.tolerate_missing.clone(),
    }
}

/// Print a suite report with per-check marks
pub fn print_report(report: &SuiteReport, verbose: bool) {
    println!("\n{} {}", "Suite:".blue().bold(), report.name.white().bold());
    if let Some(description) = &report.description {
        println!("  {}", description.trim().dimmed());
    }

    if let Some(lifecycle) = &report.lifecycle {
        if !lifecycle.created.is_empty() {
            println!(
                "  {} created {}",
                "✓".green(),
                lifecycle.created.join(", ").dimmed()
            );
        }
    }

    for scenario in &report.scenarios {
        let mark = if scenario.passed() {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "\n  {} {} {}",
            mark,
            scenario.name.bold(),
            format!("({})", scenario.operation).dimmed()
        );

        for row in &scenario.rows {
            let status = row
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let mark = if row.passed() { "✓".green() } else { "✗".red() };
            println!(
                "    {} #{} {} [{}] {}",
                mark,
                row.index,
                row.request,
                status,
                row.row.label().dimmed()
            );

            if let Some(error) = &row.error {
                println!("        {} {}", "✗".red(), error.red());
            }
            for check in &row.checks {
                match &check.outcome {
                    Outcome::Passed if verbose => {
                        println!("        {} {}", "✓".green(), check.description.dimmed());
                    }
                    Outcome::Passed => {}
                    Outcome::Failed => println!(
                        "        {} {}: expected '{}', got '{}'",
                        "✗".red(),
                        check.description,
                        check.expected,
                        check.actual.red()
                    ),
                    Outcome::Tolerated { reason } => println!(
                        "        {} {} ({})",
                        "!".yellow(),
                        check.description,
                        reason.yellow()
                    ),
                }
            }
        }
    }

    if let Some(lifecycle) = &report.lifecycle {
        for warning in &lifecycle.warnings {
            println!(
                "  {} teardown {}: {}",
                "!".yellow(),
                warning.email,
                warning.message.yellow()
            );
        }
    }

    if let Some(reason) = &report.aborted {
        println!("\n  {} {}", "✗ Aborted:".red().bold(), reason);
        return;
    }

    let failed = report.rows_failed();
    let total = report.rows_total();
    if failed == 0 {
        println!(
            "\n  {} {} rows passed",
            "✓".green().bold(),
            total.to_string().green()
        );
    } else {
        println!(
            "\n  {} {} of {} rows failed",
            "✗".red().bold(),
            failed.to_string().red(),
            total
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    /// Answers every call with `{"responseCode": 200}`
    struct Healthy;

    #[async_trait::async_trait]
    impl Transport for Healthy {
        async fn execute(
            &self,
            _request: &crate::operation::Request,
        ) -> Result<crate::http::ResponseSnapshot> {
            Ok(crate::http::ResponseSnapshot::new(
                200,
                Vec::new(),
                r#"{"responseCode": 200}"#.to_string(),
            ))
        }
    }

    #[tokio::test]
    async fn test_report_carries_description() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "brands.yaml",
            "name: Brands\ndescription: Brand list answers\nscenarios:\n  - name: x\n    operation: list_brands\n    expect:\n      - json: responseCode\n        equals: 200\n",
        );

        let report = run_suite(&path, &Healthy, &Config::default()).await.unwrap();
        assert!(report.passed());
        assert_eq!(report.description.as_deref(), Some("Brand list answers"));
        assert_eq!(report.scenarios[0].checks_total(), 1);
    }

    #[test]
    fn test_render_templates() {
        let row = FixtureRow::from_pairs([("id", "3"), ("brand", "H&M")]);
        assert_eq!(render("brands[id=${id}].brand", &row), "brands[id=3].brand");
        assert_eq!(render("${brand}", &row), "H&M");
        assert_eq!(render("${ id }/${brand}", &row), "3/H&M");
        assert_eq!(render("${unknown}x", &row), "x");
        assert_eq!(render("no templates", &row), "no templates");
        assert_eq!(render("open ${id", &row), "open ${id");
    }

    #[test]
    fn test_load_resolves_relative_fixtures() {
        let dir = TempDir::new().unwrap();
        write(&dir, "brands.csv", "id,brand\n1,Polo\n3,H&M\n");
        let suite = write(
            &dir,
            "brands.yaml",
            r#"
name: Brands
scenarios:
  - name: Brand by id
    operation: list_brands
    fixture: brands.csv
    expect:
      - json: "brands[id=${id}].brand"
        equals: "${brand}"
"#,
        );

        let suite = Suite::load(&suite).unwrap();
        let scenario = &suite.scenarios[0];
        assert_eq!(scenario.method, Method::Get);
        assert_eq!(scenario.rows.len(), 2);

        let expectations = scenario.expectations_for(&scenario.rows[1]);
        assert_eq!(
            expectations[0],
            Expectation::json_equals(
                crate::assertion::JsonPath::parse("brands[id=3].brand").unwrap(),
                "H&M"
            )
        );
    }

    #[test]
    fn test_prepare_applies_params_then_omit() {
        let scenario = Scenario {
            name: "login".to_string(),
            operation: Operation::VerifyLogin,
            method: Method::Post,
            rows: Vec::new(),
            params: vec![("password".to_string(), "${password}-wrong".to_string())],
            omit: vec!["email".to_string()],
            expectations: Vec::new(),
        };
        let row = FixtureRow::from_pairs([("email", "a@b.c"), ("password", "pw")]);

        let prepared = scenario.prepare(&row);
        assert_eq!(prepared.get("email"), None);
        assert_eq!(prepared.get("password"), Some("pw-wrong"));
    }

    #[test]
    fn test_missing_fixture_is_fatal() {
        let dir = TempDir::new().unwrap();
        let suite = write(
            &dir,
            "users.yaml",
            "name: Users\nscenarios:\n  - name: x\n    operation: list_brands\n    fixture: nope.csv\n",
        );
        assert!(matches!(
            Suite::load(&suite),
            Err(Error::FixtureNotFound(_))
        ));
    }

    #[test]
    fn test_bad_yaml_and_bad_path_are_rejected() {
        let dir = TempDir::new().unwrap();
        let broken = write(&dir, "broken.yaml", "name: [");
        assert!(matches!(Suite::load(&broken), Err(Error::Yaml { .. })));

        let bad_path = write(
            &dir,
            "bad_path.yaml",
            "name: x\nscenarios:\n  - name: y\n    operation: list_brands\n    expect:\n      - json: 'brands[id=3'\n        equals: z\n",
        );
        assert!(matches!(Suite::load(&bad_path), Err(Error::Config(_))));

        let empty = write(&dir, "empty.yaml", "name: x\nscenarios: []\n");
        assert!(matches!(Suite::load(&empty), Err(Error::Config(_))));
    }

    #[test]
    fn test_misspelled_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let typo = write(
            &dir,
            "typo.yaml",
            "name: x\nscenarios:\n  - name: y\n    operation: list_brands\n    expects:\n      - status: 200\n",
        );
        assert!(matches!(Suite::load(&typo), Err(Error::Yaml { .. })));

        let check_typo = write(
            &dir,
            "check_typo.yaml",
            "name: x\nscenarios:\n  - name: y\n    operation: list_brands\n    expect:\n      - json: responseCode\n        equal: 200\n",
        );
        assert!(matches!(Suite::load(&check_typo), Err(Error::Yaml { .. })));
    }

    #[test]
    fn test_scenario_without_expectations_is_rejected() {
        let dir = TempDir::new().unwrap();
        let suite = write(
            &dir,
            "bare.yaml",
            "name: x\nscenarios:\n  - name: Nothing checked\n    operation: list_brands\n",
        );
        match Suite::load(&suite) {
            Err(Error::Config(msg)) => assert!(msg.contains("Nothing checked"), "{}", msg),
            other => panic!("expected a config error, got {:?}", other),
        }
    }

    #[test]
    fn test_users_without_email_are_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "users.csv", "name,email,password\nx,,pw\n");
        let suite = write(
            &dir,
            "suite.yaml",
            "name: x\nusers: users.csv\nscenarios:\n  - name: y\n    operation: list_brands\n",
        );
        assert!(matches!(Suite::load(&suite), Err(Error::Config(_))));
    }
}
