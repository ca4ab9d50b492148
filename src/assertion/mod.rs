//! Contract assertion engine
//!
//! Applies typed expectations to a captured response. Every expectation is
//! evaluated on its own and produces its own [`CheckResult`]; one mismatch
//! never hides the others.

mod expected;
mod path;

pub use expected::{messages, ExpectedResult};
pub use path::{JsonPath, Resolved, Segment};

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::fixture::scalar_text;
use crate::http::ResponseSnapshot;

/// Where an actual value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extractor {
    /// HTTP status code
    Status,
    /// Response header, matched case-insensitively
    Header(String),
    /// Value inside the JSON body
    Json(JsonPath),
}

impl Extractor {
    pub fn extract(&self, snapshot: &ResponseSnapshot) -> Resolved {
        match self {
            Extractor::Status => Resolved::Value(Value::from(snapshot.status)),
            Extractor::Header(name) => match snapshot.header(name) {
                Some(v) => Resolved::Value(Value::String(v.to_string())),
                None => Resolved::Missing,
            },
            Extractor::Json(path) => match snapshot.json() {
                Some(doc) => path.resolve(doc),
                None => Resolved::Missing,
            },
        }
    }
}

impl fmt::Display for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extractor::Status => f.write_str("status"),
            Extractor::Header(name) => write!(f, "header {}", name),
            Extractor::Json(path) => write!(f, "json {}", path),
        }
    }
}

/// How the extracted value is judged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Exact text equality after normalization
    Equals(String),
    /// No duplicates in the extracted list
    Unique,
    /// Every element is non-blank
    AllNonEmpty,
    /// Every element parses as a price
    AllNumeric,
    /// List has exactly this many elements
    Count(usize),
    /// List (or value) is not empty
    NonEmpty,
    /// Some element contains the text, ignoring case
    AnyContains(String),
    /// Object has exactly these member names, in any order
    Keys(Vec<String>),
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Equals(_) => f.write_str("equals"),
            Check::Unique => f.write_str("is unique"),
            Check::AllNonEmpty => f.write_str("all non-empty"),
            Check::AllNumeric => f.write_str("all numeric"),
            Check::Count(_) => f.write_str("count"),
            Check::NonEmpty => f.write_str("is non-empty"),
            Check::AnyContains(_) => f.write_str("any contains"),
            Check::Keys(_) => f.write_str("has keys"),
        }
    }
}

/// One extractor/check pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub extractor: Extractor,
    pub check: Check,
    /// When set, an absent value is reported as tolerated instead of failed
    pub tolerate_missing: Option<String>,
}

impl Expectation {
    pub fn new(extractor: Extractor, check: Check) -> Self {
        Self {
            extractor,
            check,
            tolerate_missing: None,
        }
    }

    /// Extracted text must equal `expected`
    pub fn equals(extractor: Extractor, expected: impl Into<String>) -> Self {
        Self::new(extractor, Check::Equals(expected.into()))
    }

    pub fn status(code: u16) -> Self {
        Self::equals(Extractor::Status, code.to_string())
    }

    pub fn json_equals(path: JsonPath, expected: impl Into<String>) -> Self {
        Self::equals(Extractor::Json(path), expected)
    }

    pub fn header_equals(name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::equals(Extractor::Header(name.into()), expected)
    }

    /// Accept an absent value, logging `reason` instead of failing
    pub fn tolerate_missing(mut self, reason: impl Into<String>) -> Self {
        self.tolerate_missing = Some(reason.into());
        self
    }

    fn describe(&self) -> String {
        format!("{} {}", self.extractor, self.check)
    }
}

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Tolerated { reason: String },
}

/// A check's verdict with enough context for a failure report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub description: String,
    pub expected: String,
    pub actual: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl CheckResult {
    /// Passed or tolerated
    pub fn passed(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed)
    }
}

/// Evaluate every expectation against the response
pub fn assert_response(snapshot: &ResponseSnapshot, expectations: &[Expectation]) -> Vec<CheckResult> {
    expectations
        .iter()
        .map(|expectation| evaluate(snapshot, expectation))
        .collect()
}

/// Evaluate one expectation
pub fn evaluate(snapshot: &ResponseSnapshot, expectation: &Expectation) -> CheckResult {
    let resolved = expectation.extractor.extract(snapshot);
    let description = expectation.describe();

    if let Some(reason) = &expectation.tolerate_missing {
        if resolved.is_absent() {
            tracing::warn!(check = %description, %reason, "Tolerating missing value");
            return CheckResult {
                description,
                expected: expected_text(&expectation.check),
                actual: "(absent)".to_string(),
                outcome: Outcome::Tolerated {
                    reason: reason.clone(),
                },
            };
        }
    }

    let (ok, actual) = apply(&expectation.check, &resolved);
    let result = CheckResult {
        description,
        expected: expected_text(&expectation.check),
        actual,
        outcome: if ok { Outcome::Passed } else { Outcome::Failed },
    };

    if !ok {
        tracing::debug!(
            check = %result.description,
            expected = %result.expected,
            actual = %result.actual,
            "Check failed"
        );
    }
    result
}

fn expected_text(check: &Check) -> String {
    match check {
        Check::Equals(v) => v.clone(),
        Check::Unique => "no duplicates".to_string(),
        Check::AllNonEmpty => "no blank elements".to_string(),
        Check::AllNumeric => "every element numeric".to_string(),
        Check::Count(n) => n.to_string(),
        Check::NonEmpty => "at least one element".to_string(),
        Check::AnyContains(term) => format!("an element containing '{}'", term),
        Check::Keys(keys) => sorted_keys(keys.iter().map(String::as_str)),
    }
}

/// Normalized text of a resolved value; absent and null become ""
fn resolved_text(resolved: &Resolved) -> String {
    match resolved {
        Resolved::Missing => String::new(),
        Resolved::Value(v) => scalar_text(v),
        Resolved::List(items) => Value::Array(items.clone()).to_string(),
    }
}

/// Elements to judge; a single value counts as a one-element list
fn elements(resolved: &Resolved) -> Option<Vec<String>> {
    match resolved {
        Resolved::Missing => None,
        Resolved::Value(Value::Array(items)) | Resolved::List(items) => {
            Some(items.iter().map(scalar_text).collect())
        }
        Resolved::Value(v) => Some(vec![scalar_text(v)]),
    }
}

fn apply(check: &Check, resolved: &Resolved) -> (bool, String) {
    if let Check::Equals(expected) = check {
        let actual = resolved_text(resolved);
        return (&actual == expected, actual);
    }
    if let Check::Keys(expected) = check {
        return match resolved {
            Resolved::Value(Value::Object(map)) => {
                let actual: HashSet<&str> = map.keys().map(String::as_str).collect();
                let wanted: HashSet<&str> = expected.iter().map(String::as_str).collect();
                (actual == wanted, sorted_keys(actual))
            }
            Resolved::Missing => (false, "(absent)".to_string()),
            other => (false, format!("not an object: {}", resolved_text(other))),
        };
    }

    let Some(items) = elements(resolved) else {
        return (false, "(absent)".to_string());
    };

    match check {
        Check::Equals(_) | Check::Keys(_) => unreachable!("handled above"),
        Check::Unique => {
            let distinct: HashSet<&str> = items.iter().map(String::as_str).collect();
            let ok = distinct.len() == items.len();
            (ok, format!("{} elements, {} distinct", items.len(), distinct.len()))
        }
        Check::AllNonEmpty => match items.iter().position(|s| s.trim().is_empty()) {
            Some(idx) => (false, format!("element {} is blank", idx)),
            None => (true, format!("{} non-blank elements", items.len())),
        },
        Check::AllNumeric => {
            for (idx, item) in items.iter().enumerate() {
                if let Err(reason) = parse_price(item) {
                    return (false, format!("element {}: {}", idx, reason));
                }
            }
            (true, format!("{} numeric elements", items.len()))
        }
        Check::Count(n) => (items.len() == *n, items.len().to_string()),
        Check::NonEmpty => {
            let ok = items.iter().any(|s| !s.is_empty());
            (ok, format!("{} elements", items.iter().filter(|s| !s.is_empty()).count()))
        }
        Check::AnyContains(term) => {
            let needle = term.to_lowercase();
            let ok = items.iter().any(|s| s.to_lowercase().contains(&needle));
            (ok, Value::from(items).to_string())
        }
    }
}

fn sorted_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> String {
    let mut keys: Vec<&str> = keys.into_iter().collect();
    keys.sort_unstable();
    keys.dedup();
    format!("{{{}}}", keys.join(", "))
}

/// Parse a display price such as `Rs. 500`
///
/// Everything except digits and `.` is dropped; points left dangling at either
/// end by a currency abbreviation are dropped too.
pub fn parse_price(text: &str) -> std::result::Result<f64, String> {
    if text.trim().is_empty() {
        return Err("empty price".to_string());
    }
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        return Err(format!("no digits in '{}'", text));
    }
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number after cleaning ('{}')", text, cleaned))
}
