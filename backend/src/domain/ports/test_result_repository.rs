//! Port abstraction for test-result persistence adapters.
//!
//! Results are append-only: the port exposes inserts, lookups, and the
//! aggregations the statistics layer needs, but no update or delete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{TestKind, TestResult, TestResultDraft, UserId};

/// Persistence errors raised by test-result repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TestResultPersistenceError {
    /// Repository connection could not be established.
    #[error("test result repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("test result repository query failed: {message}")]
    Query { message: String },
}

impl TestResultPersistenceError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// One user's grouped score aggregation, as produced by the leaderboard
/// query: max and mean score over the (optionally kind-filtered) results.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreAggregate {
    pub user_id: UserId,
    pub email: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub max_score: f64,
    pub avg_score: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestResultRepository: Send + Sync {
    /// Store a new immutable result row.
    async fn insert(
        &self,
        user_id: &UserId,
        draft: &TestResultDraft,
    ) -> Result<TestResult, TestResultPersistenceError>;

    /// The `limit` most recent results of one kind, newest first.
    async fn recent_by_kind(
        &self,
        user_id: &UserId,
        kind: TestKind,
        limit: i64,
    ) -> Result<Vec<TestResult>, TestResultPersistenceError>;

    /// All of a user's results, optionally kind-filtered, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        kind: Option<TestKind>,
    ) -> Result<Vec<TestResult>, TestResultPersistenceError>;

    /// Best single result of one kind by score, earliest stored first on
    /// ties.
    async fn best_for_user(
        &self,
        user_id: &UserId,
        kind: TestKind,
    ) -> Result<Option<TestResult>, TestResultPersistenceError>;

    /// The `limit` most recent results across all kinds, newest first.
    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<TestResult>, TestResultPersistenceError>;

    /// Total number of results for one user.
    async fn count_for_user(&self, user_id: &UserId)
    -> Result<i64, TestResultPersistenceError>;

    /// Per-kind result counts for one user. Kinds with no results are
    /// absent from the output.
    async fn counts_by_kind_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<(TestKind, i64)>, TestResultPersistenceError>;

    /// A user's results created at or after `cutoff`, ascending by creation
    /// time.
    async fn since(
        &self,
        user_id: &UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<TestResult>, TestResultPersistenceError>;

    /// Total number of stored results.
    async fn count(&self) -> Result<i64, TestResultPersistenceError>;

    /// Per-kind result counts across all users.
    async fn counts_by_kind(&self) -> Result<Vec<(TestKind, i64)>, TestResultPersistenceError>;

    /// Grouped per-user max/mean scores, ordered by max score descending
    /// with user id ascending as the tie-break, truncated to `limit`.
    async fn leaderboard(
        &self,
        kind: Option<TestKind>,
        limit: i64,
    ) -> Result<Vec<ScoreAggregate>, TestResultPersistenceError>;
}
