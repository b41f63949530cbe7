//! Driving ports for test submission and retrieval.

use async_trait::async_trait;

use crate::domain::{Error, TestKind, TestResult, TestResultDraft, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestCommand: Send + Sync {
    /// Store a submitted result and recompute the submitter's brain age.
    async fn submit(
        &self,
        user_id: &UserId,
        draft: TestResultDraft,
    ) -> Result<TestResult, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestQuery: Send + Sync {
    /// A user's results, optionally kind-filtered, newest first.
    async fn history(
        &self,
        user_id: &UserId,
        kind: Option<TestKind>,
    ) -> Result<Vec<TestResult>, Error>;

    /// A user's best result of one kind, if any exists.
    async fn best_score(
        &self,
        user_id: &UserId,
        kind: TestKind,
    ) -> Result<Option<TestResult>, Error>;
}
