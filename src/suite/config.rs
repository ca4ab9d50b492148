//! Suite file types
//!
//! Defines the data structures for deserializing YAML suites and turning
//! their textual expectations into typed ones.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use crate::assertion::{Check, Expectation, Extractor, JsonPath};
use crate::common::{Error, Result};
use crate::lifecycle::Setup;
use crate::operation::{Method, Operation};

/// A complete suite loaded from a YAML file
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct SuiteFile {
    /// Name of the suite
    pub name: String,
    /// Optional description of what the suite covers
    pub description: Option<String>,
    /// Fixture of test users owned by the suite
    pub users: Option<PathBuf>,
    /// Whether the users exist while the scenarios run
    #[serde(default)]
    pub setup: Setup,
    /// Scenarios in execution order
    pub scenarios: Vec<ScenarioSpec>,
}

/// One operation run over a fixture
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ScenarioSpec {
    pub name: String,
    pub operation: Operation,
    /// Method override (e.g. PUT against a GET-only endpoint)
    pub method: Option<Method>,
    /// Rows to run; a single empty row when absent
    pub fixture: Option<PathBuf>,
    /// Leading CSV lines to skip
    pub header_lines: Option<usize>,
    /// Fields set on every row, with `${field}` templates
    #[serde(default)]
    pub params: BTreeMap<String, Scalar>,
    /// Fields removed from every row
    #[serde(default)]
    pub omit: Vec<String>,
    /// Expectations checked against every row's response
    #[serde(default)]
    pub expect: Vec<ExpectSpec>,
}

/// One textual expectation
///
/// Exactly one of `status`, `json` and `header` picks the value. `status`
/// carries its own expected code; the other two take exactly one check.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ExpectSpec {
    pub status: Option<Scalar>,
    pub json: Option<String>,
    pub header: Option<String>,

    pub equals: Option<Scalar>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub all_non_empty: bool,
    #[serde(default)]
    pub numeric: bool,
    pub count: Option<usize>,
    #[serde(default)]
    pub non_empty: bool,
    pub contains: Option<String>,
    /// Exact member names of an object, e.g. `json: $` for the whole body
    pub keys: Option<Vec<String>>,

    /// Accept an absent value with this reason
    pub tolerate_missing: Option<String>,
}

impl ExpectSpec {
    /// Compile into a typed expectation whose texts may still hold templates
    pub fn compile(&self) -> Result<Expectation> {
        let extractor = match (&self.status, &self.json, &self.header) {
            (Some(code), None, None) => {
                if self.check()?.is_some() {
                    return Err(self.error("'status' takes no other check"));
                }
                return Ok(self.finish(Expectation::equals(Extractor::Status, code.0.clone())));
            }
            (None, Some(path), None) => Extractor::Json(JsonPath::parse(path)?),
            (None, None, Some(name)) => Extractor::Header(name.clone()),
            _ => return Err(self.error("expected exactly one of 'status', 'json' or 'header'")),
        };

        let check = self
            .check()?
            .ok_or_else(|| self.error("missing check"))?;
        Ok(self.finish(Expectation::new(extractor, check)))
    }

    fn check(&self) -> Result<Option<Check>> {
        let mut checks = Vec::new();
        if let Some(value) = &self.equals {
            checks.push(Check::Equals(value.0.clone()));
        }
        if self.unique {
            checks.push(Check::Unique);
        }
        if self.all_non_empty {
            checks.push(Check::AllNonEmpty);
        }
        if self.numeric {
            checks.push(Check::AllNumeric);
        }
        if let Some(n) = self.count {
            checks.push(Check::Count(n));
        }
        if self.non_empty {
            checks.push(Check::NonEmpty);
        }
        if let Some(term) = &self.contains {
            checks.push(Check::AnyContains(term.clone()));
        }
        if let Some(keys) = &self.keys {
            checks.push(Check::Keys(keys.clone()));
        }

        match checks.len() {
            0 => Ok(None),
            1 => Ok(checks.pop()),
            _ => Err(self.error("more than one check")),
        }
    }

    fn finish(&self, expectation: Expectation) -> Expectation {
        match &self.tolerate_missing {
            Some(reason) => expectation.tolerate_missing(reason.clone()),
            None => expectation,
        }
    }

    fn error(&self, reason: &str) -> Error {
        Error::Config(format!("Invalid expectation {}: {}", self, reason))
    }
}

impl fmt::Display for ExpectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.json, &self.header) {
            (Some(code), _, _) => write!(f, "status {}", code.0),
            (_, Some(path), _) => write!(f, "json {}", path),
            (_, _, Some(name)) => write!(f, "header {}", name),
            _ => f.write_str("(no target)"),
        }
    }
}

/// A YAML scalar kept as text
///
/// Lets suites write `equals: 400` and `equals: "400"` interchangeably.
/// `null` reads as the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar(pub String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        use serde_yaml::Value;

        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Scalar(String::new())),
            Value::Bool(b) => Ok(Scalar(b.to_string())),
            Value::Number(n) => Ok(Scalar(n.to_string())),
            Value::String(s) => Ok(Scalar(s)),
            other => Err(serde::de::Error::custom(format!(
                "expected a scalar, found {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(yaml: &str) -> ExpectSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_suite() {
        let suite: SuiteFile = serde_yaml::from_str(
            r#"
name: Login
users: fixtures/users.csv
setup: present
scenarios:
  - name: Login without email
    operation: verify_login
    fixture: fixtures/users.csv
    params: { password: "${password}" }
    omit: [email]
    expect:
      - status: 200
      - json: responseCode
        equals: 400
"#,
        )
        .unwrap();

        assert_eq!(suite.setup, Setup::Present);
        let scenario = &suite.scenarios[0];
        assert_eq!(scenario.operation, Operation::VerifyLogin);
        assert_eq!(scenario.method, None);
        assert_eq!(scenario.params["password"], Scalar("${password}".to_string()));
        assert_eq!(scenario.omit, vec!["email"]);
        assert_eq!(scenario.expect[1].equals, Some(Scalar("400".to_string())));
    }

    #[test]
    fn test_setup_and_method_defaults() {
        let suite: SuiteFile = serde_yaml::from_str(
            r#"
name: Brands
scenarios:
  - name: PUT is rejected
    operation: list_brands
    method: PUT
"#,
        )
        .unwrap();

        assert_eq!(suite.setup, Setup::Absent);
        assert!(suite.users.is_none());
        assert_eq!(suite.scenarios[0].method, Some(Method::Put));
        assert!(suite.scenarios[0].expect.is_empty());
    }

    #[test]
    fn test_compile_expectations() {
        assert_eq!(spec("status: 200").compile().unwrap(), Expectation::status(200));

        let e = spec("json: 'brands[id=${id}].brand'\nequals: '${brand}'")
            .compile()
            .unwrap();
        assert_eq!(
            e.extractor,
            Extractor::Json(JsonPath::root().field("brands").find("id", "${id}").field("brand"))
        );
        assert_eq!(e.check, Check::Equals("${brand}".to_string()));

        let e = spec("header: Server\nequals: cloudflare").compile().unwrap();
        assert_eq!(e.extractor, Extractor::Header("Server".to_string()));

        let e = spec("json: 'products[*].price'\nnumeric: true").compile().unwrap();
        assert_eq!(e.check, Check::AllNumeric);

        let e = spec("json: user.mobile_number\nequals: '1'\ntolerate_missing: omitted")
            .compile()
            .unwrap();
        assert_eq!(e.tolerate_missing.as_deref(), Some("omitted"));

        let e = spec("json: $\nkeys: [responseCode, message]").compile().unwrap();
        assert_eq!(e.extractor, Extractor::Json(JsonPath::root()));
        assert_eq!(
            e.check,
            Check::Keys(vec!["responseCode".to_string(), "message".to_string()])
        );
    }

    #[test]
    fn test_compile_rejects_ambiguous_specs() {
        assert!(spec("json: user.name").compile().is_err());
        assert!(spec("equals: x").compile().is_err());
        assert!(spec("json: a\nheader: b\nequals: x").compile().is_err());
        assert!(spec("json: a\nunique: true\ncount: 3").compile().is_err());
        assert!(spec("status: 200\nunique: true").compile().is_err());
        assert!(spec("json: 'brands[id=3'\nequals: x").compile().is_err());
        assert!(serde_yaml::from_str::<ExpectSpec>("json: a\nequal: x").is_err());
    }

    #[test]
    fn test_scalar_accepts_any_scalar() {
        let values: BTreeMap<String, Scalar> =
            serde_yaml::from_str("a: 1\nb: true\nc: ~\nd: text\ne: 1.5").unwrap();
        assert_eq!(values["a"].0, "1");
        assert_eq!(values["b"].0, "true");
        assert_eq!(values["c"].0, "");
        assert_eq!(values["d"].0, "text");
        assert_eq!(values["e"].0, "1.5");
        assert!(serde_yaml::from_str::<Scalar>("[1, 2]").is_err());
    }
}
