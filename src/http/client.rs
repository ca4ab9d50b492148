//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;

use super::{ResponseSnapshot, Transport};
use crate::common::config::HttpConfig;
use crate::common::{Error, Result};
use crate::operation::{Method, Request};

/// HTTP client for the API under test
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { inner })
    }

    fn http_error(request: &Request, source: reqwest::Error) -> Error {
        Error::Http {
            method: request.method.to_string(),
            url: request.url.clone(),
            source,
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: &Request) -> Result<ResponseSnapshot> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let builder = self.inner.request(method, &request.url);
        let builder = if request.method.has_body() {
            builder.form(&request.params)
        } else {
            builder.query(&request.params)
        };

        tracing::debug!(request = %request.summary(), params = ?request.params, "Sending request");

        let response = builder
            .send()
            .await
            .map_err(|e| Self::http_error(request, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| Self::http_error(request, e))?;

        tracing::debug!(status, body = %body, "Received response");

        Ok(ResponseSnapshot::new(status, headers, body))
    }
}
