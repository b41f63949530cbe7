//! Driving port for the statistics aggregator, plus its view types.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Error, TestKind, TestResult, UserId};

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position after ordering by max score.
    pub rank: u32,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub email: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub max_score: f64,
    pub avg_score: f64,
}

/// Per-kind result counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KindCounts {
    pub reaction_time: i64,
    pub sequence_memory: i64,
    pub verbal_memory: i64,
}

impl KindCounts {
    /// Build from grouped `(kind, count)` pairs; absent kinds stay zero.
    pub fn from_pairs(pairs: &[(TestKind, i64)]) -> Self {
        let mut counts = Self::default();
        for (kind, count) in pairs {
            match kind {
                TestKind::ReactionTime => counts.reaction_time = *count,
                TestKind::SequenceMemory => counts.sequence_memory = *count,
                TestKind::VerbalMemory => counts.verbal_memory = *count,
            }
        }
        counts
    }
}

/// Best single result per kind, absent when the user never took the test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BestScores {
    pub reaction_time: Option<TestResult>,
    pub sequence_memory: Option<TestResult>,
    pub verbal_memory: Option<TestResult>,
}

/// One user's statistics summary.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub total_tests: i64,
    pub brain_age: Option<f64>,
    pub tests_by_kind: KindCounts,
    pub best_scores: BestScores,
    /// The ten most recently created results across all kinds.
    pub recent_tests: Vec<TestResult>,
}

/// Site-wide statistics summary.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSummary {
    pub total_users: i64,
    pub total_tests: i64,
    /// Mean brain age across users that have one; `None` when nobody does.
    pub avg_brain_age: Option<f64>,
    pub tests_by_kind: KindCounts,
}

/// One day's bucket in a progress series.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    /// UTC calendar date of the bucket.
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub count: i64,
    pub avg_score: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsQuery: Send + Sync {
    /// Ranked per-user max/mean scores, optionally kind-filtered.
    async fn leaderboard(
        &self,
        kind: Option<TestKind>,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, Error>;

    /// One user's summary.
    async fn user_summary(&self, user_id: &UserId) -> Result<UserSummary, Error>;

    /// Site-wide summary.
    async fn global_summary(&self) -> Result<GlobalSummary, Error>;

    /// Day-bucketed series over the trailing `days` days, ascending.
    async fn progress(&self, user_id: &UserId, days: i64) -> Result<Vec<ProgressPoint>, Error>;
}
