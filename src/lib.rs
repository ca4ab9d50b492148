//! storefront - data-driven contract tests for the storefront demo API
//!
//! This library loads fixture rows, issues one HTTP call per row, checks the
//! structured response and brackets runs with an idempotent test-user
//! lifecycle.

pub mod assertion;
pub mod cli;
pub mod commands;
pub mod common;
pub mod fixture;
pub mod http;
pub mod lifecycle;
pub mod operation;
pub mod runner;
pub mod suite;

// Re-export commonly used types for tests
pub use common::{Config, Error, Result};
pub use operation::{Method, Operation, Request};
