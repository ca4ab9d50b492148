//! Test-user lifecycle
//!
//! A batch of scenarios runs between a precondition and a teardown keyed on
//! each test user's email:
//!
//! 1. delete the user, which must answer "not found" (the remote is clean)
//! 2. optionally create the user, accepting "already exists"
//! 3. run the batch
//! 4. delete the user again; failures here are only warnings
//!
//! The teardown runs even when the batch panics.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

use crate::common::config::Messages;
use crate::common::{Error, Result};
use crate::fixture::{scalar_text, FixtureRow};
use crate::http::Transport;
use crate::operation::{Operation, Request};

/// An account the batch owns, keyed by email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    row: FixtureRow,
}

impl TestUser {
    /// Wrap a fixture row; the row must carry a non-empty `email`
    pub fn from_row(row: FixtureRow) -> Result<Self> {
        if row.value("email").trim().is_empty() {
            return Err(Error::Config(format!(
                "Test user at line {} has no email",
                row.line()
            )));
        }
        Ok(Self { row })
    }

    pub fn email(&self) -> &str {
        self.row.value("email")
    }

    pub fn password(&self) -> &str {
        self.row.value("password")
    }

    pub fn row(&self) -> &FixtureRow {
        &self.row
    }
}

/// Whether the users are created before the batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Setup {
    /// The batch expects the users not to exist
    #[default]
    Absent,
    /// The batch expects the users to exist
    Present,
}

/// A teardown step that did not get the expected answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownWarning {
    pub email: String,
    pub message: String,
}

/// What the lifecycle did around a batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct LifecycleReport {
    pub users: Vec<String>,
    pub created: Vec<String>,
    pub warnings: Vec<TeardownWarning>,
}

/// Brackets a batch with precondition and teardown calls
pub struct Lifecycle<'a, T: Transport + ?Sized> {
    transport: &'a T,
    base_url: String,
    messages: Messages,
}

impl<'a, T: Transport + ?Sized> Lifecycle<'a, T> {
    pub fn new(transport: &'a T, base_url: impl Into<String>, messages: &Messages) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            messages: messages.clone(),
        }
    }

    /// Run `body` between precondition and teardown
    ///
    /// A precondition failure returns before `body` is polled. A panic in
    /// `body` is resumed after the teardown.
    pub async fn run_with_lifecycle<F, R>(
        &self,
        users: &[TestUser],
        setup: Setup,
        body: F,
    ) -> Result<(R, LifecycleReport)>
    where
        F: Future<Output = R>,
    {
        let mut report = LifecycleReport {
            users: users.iter().map(|u| u.email().to_string()).collect(),
            ..Default::default()
        };

        for user in users {
            self.ensure_absent(user).await?;
        }

        if setup == Setup::Present {
            for user in users {
                if let Err(e) = self.create(user).await {
                    self.teardown(users, &mut report).await;
                    return Err(e);
                }
                report.created.push(user.email().to_string());
            }
        }

        let outcome = AssertUnwindSafe(body).catch_unwind().await;
        self.teardown(users, &mut report).await;

        match outcome {
            Ok(value) => Ok((value, report)),
            Err(payload) => {
                tracing::error!("Batch panicked, teardown completed");
                std::panic::resume_unwind(payload)
            }
        }
    }

    async fn ensure_absent(&self, user: &TestUser) -> Result<()> {
        let message = self
            .call(Operation::DeleteUser, user)
            .await
            .map_err(|e| Error::precondition(user.email(), e.to_string()))?;

        if message != self.messages.account_not_found {
            return Err(Error::precondition(user.email(), message));
        }
        tracing::debug!(email = user.email(), "Precondition met");
        Ok(())
    }

    async fn create(&self, user: &TestUser) -> Result<()> {
        let message = self
            .call(Operation::CreateUser, user)
            .await
            .map_err(|e| Error::precondition(user.email(), e.to_string()))?;

        if message == self.messages.user_created || message == self.messages.email_exists {
            tracing::debug!(email = user.email(), %message, "Test user ready");
            Ok(())
        } else {
            Err(Error::precondition(user.email(), message))
        }
    }

    async fn teardown(&self, users: &[TestUser], report: &mut LifecycleReport) {
        for user in users {
            let message = match self.call(Operation::DeleteUser, user).await {
                Ok(message) if message == self.messages.account_deleted => {
                    tracing::debug!(email = user.email(), "Test user removed");
                    continue;
                }
                Ok(message) => message,
                Err(e) => e.to_string(),
            };
            tracing::warn!(email = user.email(), %message, "Teardown did not delete test user");
            report.warnings.push(TeardownWarning {
                email: user.email().to_string(),
                message,
            });
        }
    }

    /// Issue one lifecycle call and return the body's `message`
    async fn call(&self, operation: Operation, user: &TestUser) -> Result<String> {
        let request = Request::build(operation, &self.base_url, user.row());
        let snapshot = self.transport.execute(&request).await?;
        Ok(snapshot
            .json()
            .and_then(|doc| doc.get("message"))
            .map(scalar_text)
            .unwrap_or_default())
    }
}
