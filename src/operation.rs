//! Operation catalog and request building
//!
//! Every operation of the storefront API has a fixed method, path and
//! parameter list. Building a request never checks that required parameters
//! are present: sending an incomplete request is how the negative scenarios
//! provoke the remote's 400 answers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::fixture::FixtureRow;

/// Content type used for every request that carries a body
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const USER_PARAMS: &[&str] = &[
    "name",
    "email",
    "password",
    "title",
    "birth_date",
    "birth_month",
    "birth_year",
    "firstname",
    "lastname",
    "company",
    "address1",
    "address2",
    "country",
    "zipcode",
    "state",
    "city",
    "mobile_number",
];

const USER_OPTIONAL_PARAMS: &[&str] = &["company", "address2"];

/// HTTP methods the harness issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Whether parameters travel as a form body rather than a query string
    pub fn has_body(self) -> bool {
        !matches!(self, Method::Get)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(Error::Config(format!("Unknown HTTP method: {}", s))),
        }
    }
}

/// A logical call against the storefront API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateUser,
    DeleteUser,
    UpdateUser,
    GetUserByEmail,
    VerifyLogin,
    ListBrands,
    ListProducts,
    SearchProducts,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::CreateUser,
        Operation::DeleteUser,
        Operation::UpdateUser,
        Operation::GetUserByEmail,
        Operation::VerifyLogin,
        Operation::ListBrands,
        Operation::ListProducts,
        Operation::SearchProducts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::CreateUser => "create_user",
            Operation::DeleteUser => "delete_user",
            Operation::UpdateUser => "update_user",
            Operation::GetUserByEmail => "get_user_by_email",
            Operation::VerifyLogin => "verify_login",
            Operation::ListBrands => "list_brands",
            Operation::ListProducts => "list_products",
            Operation::SearchProducts => "search_products",
        }
    }

    /// The method the API documents for this operation
    pub fn method(self) -> Method {
        match self {
            Operation::CreateUser | Operation::VerifyLogin | Operation::SearchProducts => {
                Method::Post
            }
            Operation::UpdateUser => Method::Put,
            Operation::DeleteUser => Method::Delete,
            Operation::GetUserByEmail | Operation::ListBrands | Operation::ListProducts => {
                Method::Get
            }
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Operation::CreateUser => "/api/createAccount",
            Operation::DeleteUser => "/api/deleteAccount",
            Operation::UpdateUser => "/api/updateAccount",
            Operation::GetUserByEmail => "/api/getUserDetailByEmail",
            Operation::VerifyLogin => "/api/verifyLogin",
            Operation::ListBrands => "/api/brandsList",
            Operation::ListProducts => "/api/productsList",
            Operation::SearchProducts => "/api/searchProduct",
        }
    }

    /// Parameter names in the order they are sent
    pub fn parameters(self) -> &'static [&'static str] {
        match self {
            Operation::CreateUser | Operation::UpdateUser => USER_PARAMS,
            Operation::DeleteUser | Operation::VerifyLogin => &["email", "password"],
            Operation::GetUserByEmail => &["email"],
            Operation::SearchProducts => &["search_product"],
            Operation::ListBrands | Operation::ListProducts => &[],
        }
    }

    pub fn is_optional(self, param: &str) -> bool {
        matches!(self, Operation::CreateUser | Operation::UpdateUser)
            && USER_OPTIONAL_PARAMS.contains(&param)
    }

    /// Required parameters
    pub fn required(self) -> impl Iterator<Item = &'static str> {
        self.parameters()
            .iter()
            .copied()
            .filter(move |p| !self.is_optional(p))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
                Error::Config(format!(
                    "Unknown operation '{}'. Known operations: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// A concrete HTTP request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Set for requests that carry a form body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<&'static str>,
    /// Form fields, or query parameters for GET
    pub params: Vec<(String, String)>,
}

impl Request {
    /// Build the documented request for an operation
    pub fn build(operation: Operation, base_url: &str, row: &FixtureRow) -> Self {
        Self::build_with_method(operation, operation.method(), base_url, row)
    }

    /// Build a request for an operation's endpoint with any method
    pub fn build_with_method(
        operation: Operation,
        method: Method,
        base_url: &str,
        row: &FixtureRow,
    ) -> Self {
        let params = operation
            .parameters()
            .iter()
            .filter_map(|&name| row.get(name).map(|v| (name.to_string(), v.to_string())))
            .collect();

        Self {
            method,
            url: format!("{}{}", base_url.trim_end_matches('/'), operation.path()),
            content_type: method.has_body().then_some(FORM_CONTENT_TYPE),
            params,
        }
    }

    /// `METHOD url` for logs and reports
    pub fn summary(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://automationexercise.com/";

    fn user_row() -> FixtureRow {
        FixtureRow::from_pairs([
            ("name", "createTest"),
            ("email", "katie@example.com"),
            ("password", "123456789"),
            ("company", ""),
            ("expected_message", "User created!"),
        ])
    }

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert!("drop_tables".parse::<Operation>().is_err());
    }

    #[test]
    fn test_mutating_requests_are_form_encoded() {
        let req = Request::build(Operation::CreateUser, BASE, &user_row());

        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "https://automationexercise.com/api/createAccount");
        assert_eq!(req.content_type, Some(FORM_CONTENT_TYPE));
        assert_eq!(
            req.params,
            vec![
                ("name".to_string(), "createTest".to_string()),
                ("email".to_string(), "katie@example.com".to_string()),
                ("password".to_string(), "123456789".to_string()),
                ("company".to_string(), String::new()),
            ]
        );

        let req = Request::build(Operation::DeleteUser, BASE, &user_row());
        assert_eq!(req.method, Method::Delete);
        assert_eq!(req.content_type, Some(FORM_CONTENT_TYPE));
        assert_eq!(req.params.len(), 2);
    }

    #[test]
    fn test_get_uses_query_params() {
        let req = Request::build(Operation::GetUserByEmail, BASE, &user_row());
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.content_type, None);
        assert_eq!(
            req.params,
            vec![("email".to_string(), "katie@example.com".to_string())]
        );
    }

    #[test]
    fn test_missing_required_params_are_not_rejected() {
        let row = FixtureRow::from_pairs([("password", "secret")]);
        let req = Request::build(Operation::VerifyLogin, BASE, &row);
        assert_eq!(
            req.params,
            vec![("password".to_string(), "secret".to_string())]
        );
    }

    #[test]
    fn test_method_override() {
        let req = Request::build_with_method(
            Operation::ListBrands,
            Method::Put,
            BASE,
            &FixtureRow::default(),
        );
        assert_eq!(req.summary(), "PUT https://automationexercise.com/api/brandsList");
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_required_params() {
        let required: Vec<&str> = Operation::CreateUser.required().collect();
        assert!(required.contains(&"email"));
        assert!(!required.contains(&"company"));
        assert!(!required.contains(&"address2"));
        assert_eq!(Operation::ListProducts.required().count(), 0);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("put".parse::<Method>().unwrap(), Method::Put);
        assert!("TRACE".parse::<Method>().is_err());
    }
}
