//! HTTP transport
//!
//! The harness talks to the API through the [`Transport`] trait so that the
//! runner and lifecycle never depend on a concrete client.

mod client;
mod snapshot;

pub use client::HttpClient;
pub use snapshot::ResponseSnapshot;

use async_trait::async_trait;

use crate::common::Result;
use crate::operation::Request;

/// Sends one request and captures the whole response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<ResponseSnapshot>;
}
