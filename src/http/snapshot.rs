//! Captured HTTP responses

use serde::Serialize;
use serde_json::Value;

/// Status, headers and body of one response
///
/// Owned by the row that issued the request and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    /// Header names are stored lowercase
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Parsed body, when it is JSON (whatever the declared content type)
    #[serde(skip)]
    json: Option<Value>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: String) -> Self {
        let json = serde_json::from_str(&body).ok();
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            status,
            headers,
            body,
            json,
        }
    }

    /// First value of a header, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parsed JSON body
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Body shortened for diagnostics
    pub fn body_excerpt(&self, max: usize) -> String {
        if self.body.chars().count() > max {
            let cut: String = self.body.chars().take(max).collect();
            format!("{}...", cut)
        } else {
            self.body.clone()
        }
    }
}
