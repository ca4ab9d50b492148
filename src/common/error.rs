//! Error types for the contract harness
//!
//! Only conditions that stop a run are errors. A failed expectation is not an
//! error: it is recorded as a failed check and reported with the rest.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the contract harness
#[derive(Error, Debug)]
pub enum Error {
    // === Fixture Errors ===
    #[error("Fixture not found: {}", .0.display())]
    FixtureNotFound(PathBuf),

    #[error("Malformed fixture '{}': {reason}", path.display())]
    FixtureFormat { path: PathBuf, reason: String },

    // === Lifecycle Errors ===
    #[error("Precondition failed for {email}: {message}")]
    PreconditionFailure { email: String, message: String },

    // === Transport Errors ===
    #[error("HTTP request {method} {url} failed: {source}")]
    Http {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid suite file '{}': {error}", path.display())]
    Yaml {
        path: PathBuf,
        error: serde_yaml::Error,
    },

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a fixture format error
    pub fn fixture_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FixtureFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a precondition failure
    pub fn precondition(email: &str, message: impl Into<String>) -> Self {
        Self::PreconditionFailure {
            email: email.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_errors_name_the_path() {
        let err = Error::FixtureNotFound(PathBuf::from("fixtures/missing.csv"));
        assert_eq!(err.to_string(), "Fixture not found: fixtures/missing.csv");

        let err = Error::fixture_format("users.csv", "line 3: expected 17 fields, found 16");
        assert!(err.to_string().contains("users.csv"));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_precondition_names_the_user() {
        let err = Error::precondition("katie@example.com", "Account deleted!");
        assert_eq!(
            err.to_string(),
            "Precondition failed for katie@example.com: Account deleted!"
        );
    }
}
