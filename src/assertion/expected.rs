//! Shared expected outcomes
//!
//! The storefront API answers every call with HTTP 200 and reports the real
//! outcome in the body's `responseCode` and `message` fields.

use super::{Expectation, Extractor, JsonPath};

/// Message texts the API answers with
pub mod messages {
    pub const METHOD_NOT_SUPPORTED: &str = "This request method is not supported.";
    pub const USER_CREATED: &str = "User created!";
    pub const EMAIL_EXISTS: &str = "Email already exists!";
    pub const USER_UPDATED: &str = "User updated!";
    pub const ACCOUNT_DELETED: &str = "Account deleted!";
    pub const ACCOUNT_NOT_FOUND: &str = "Account not found!";
    pub const ACCOUNT_NOT_FOUND_BY_EMAIL: &str =
        "Account not found with this email, try another email!";
    pub const USER_EXISTS: &str = "User exists!";
    pub const USER_NOT_FOUND: &str = "User not found!";
    pub const MISSING_SEARCH_PRODUCT: &str =
        "Bad request, search_product parameter is missing in POST request.";
    pub const MISSING_EMAIL: &str = "Bad request, email parameter is missing in GET request.";
    pub const MISSING_PASSWORD_ON_UPDATE: &str =
        "Bad request, password parameter is missing in PUT request.";
    pub const MISSING_EMAIL_OR_PASSWORD: &str =
        "Bad request, email or password parameter is missing in POST request.";
}

/// HTTP status, `responseCode` and `message` of one outcome, plus extra checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedResult {
    pub status: u16,
    pub response_code: String,
    pub message: Option<String>,
    pub extra: Vec<Expectation>,
}

impl ExpectedResult {
    pub fn new(response_code: u16, message: impl Into<String>) -> Self {
        Self {
            status: 200,
            response_code: response_code.to_string(),
            message: Some(message.into()),
            extra: Vec::new(),
        }
    }

    /// A 200 answer carrying a domain payload instead of a message
    pub fn payload() -> Self {
        Self {
            status: 200,
            response_code: "200".to_string(),
            message: None,
            extra: Vec::new(),
        }
    }

    /// `405` answer for a method the endpoint does not accept
    pub fn method_not_supported() -> Self {
        Self::new(405, messages::METHOD_NOT_SUPPORTED)
    }

    /// `400` answer for a request missing a parameter
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn with(mut self, expectation: Expectation) -> Self {
        self.extra.push(expectation);
        self
    }

    /// Flatten into individual expectations
    pub fn expectations(&self) -> Vec<Expectation> {
        let mut out = vec![
            Expectation::status(self.status),
            Expectation::equals(
                Extractor::Json(JsonPath::root().field("responseCode")),
                self.response_code.clone(),
            ),
        ];
        if let Some(message) = &self.message {
            out.push(Expectation::equals(
                Extractor::Json(JsonPath::root().field("message")),
                message.clone(),
            ));
        }
        out.extend(self.extra.iter().cloned());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::Check;

    #[test]
    fn test_method_not_supported_expectations() {
        let expectations = ExpectedResult::method_not_supported().expectations();
        assert_eq!(expectations.len(), 3);
        assert_eq!(expectations[0], Expectation::status(200));
        assert_eq!(expectations[1].check, Check::Equals("405".to_string()));
        assert_eq!(
            expectations[2].check,
            Check::Equals(messages::METHOD_NOT_SUPPORTED.to_string())
        );
    }

    #[test]
    fn test_payload_has_no_message_check() {
        let expectations = ExpectedResult::payload()
            .with(Expectation::new(
                Extractor::Json(JsonPath::parse("brands[*].id").unwrap()),
                Check::Unique,
            ))
            .expectations();
        assert_eq!(expectations.len(), 3);
        assert_eq!(expectations[2].check, Check::Unique);
    }
}
