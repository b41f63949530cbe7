//! Statistics aggregation service.
//!
//! Implements [`StatsQuery`] over the test-result and user repositories.
//! Ranking and day-bucketing are plain functions so the interesting logic
//! stays independently testable.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};

use crate::domain::ports::{
    BestScores, GlobalSummary, KindCounts, LeaderboardEntry, ProgressPoint, ScoreAggregate,
    StatsQuery, TestResultPersistenceError, TestResultRepository, UserPersistenceError,
    UserRepository, UserSummary,
};
use crate::domain::{Error, TestKind, TestResult, UserId};

/// Default leaderboard length.
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 100;
/// Default trailing window for progress series, in days.
pub const DEFAULT_PROGRESS_DAYS: i64 = 30;
/// How many recent results a user summary carries.
const RECENT_TESTS_LIMIT: i64 = 10;

/// Statistics service implementing [`StatsQuery`].
#[derive(Clone)]
pub struct StatsService<R, U> {
    results: Arc<R>,
    users: Arc<U>,
}

impl<R, U> StatsService<R, U> {
    /// Create a new service with the given repositories.
    pub fn new(results: Arc<R>, users: Arc<U>) -> Self {
        Self { results, users }
    }
}

fn map_result_error(error: TestResultPersistenceError) -> Error {
    match error {
        TestResultPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("test result repository unavailable: {message}"))
        }
        TestResultPersistenceError::Query { message } => {
            Error::internal(format!("test result repository error: {message}"))
        }
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } | UserPersistenceError::Duplicate { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

/// Order aggregates by max score descending, break ties by user id
/// ascending, and assign 1-based ranks.
fn rank(mut aggregates: Vec<ScoreAggregate>) -> Vec<LeaderboardEntry> {
    aggregates.sort_by(|a, b| {
        b.max_score
            .partial_cmp(&a.max_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.user_id.as_uuid().cmp(b.user_id.as_uuid()))
    });
    aggregates
        .into_iter()
        .enumerate()
        .map(|(index, aggregate)| LeaderboardEntry {
            rank: index as u32 + 1,
            user_id: aggregate.user_id,
            email: aggregate.email,
            username: aggregate.username,
            first_name: aggregate.first_name,
            last_name: aggregate.last_name,
            max_score: aggregate.max_score,
            avg_score: aggregate.avg_score,
        })
        .collect()
}

/// Group results by their UTC creation date, yielding per-day counts and
/// mean scores in ascending date order.
fn bucket_by_day(results: &[TestResult]) -> Vec<ProgressPoint> {
    let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for result in results {
        buckets
            .entry(result.created_at.date_naive())
            .or_default()
            .push(result.score);
    }
    buckets
        .into_iter()
        .map(|(date, scores)| ProgressPoint {
            date,
            count: scores.len() as i64,
            avg_score: scores.iter().sum::<f64>() / scores.len() as f64,
        })
        .collect()
}

#[async_trait]
impl<R, U> StatsQuery for StatsService<R, U>
where
    R: TestResultRepository,
    U: UserRepository,
{
    async fn leaderboard(
        &self,
        kind: Option<TestKind>,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, Error> {
        if limit <= 0 {
            return Err(Error::invalid_request("limit must be positive"));
        }
        let aggregates = self
            .results
            .leaderboard(kind, limit)
            .await
            .map_err(map_result_error)?;
        Ok(rank(aggregates))
    }

    async fn user_summary(&self, user_id: &UserId) -> Result<UserSummary, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))?;

        let total_tests = self
            .results
            .count_for_user(user_id)
            .await
            .map_err(map_result_error)?;
        let by_kind = self
            .results
            .counts_by_kind_for_user(user_id)
            .await
            .map_err(map_result_error)?;

        let mut best_scores = BestScores::default();
        for kind in TestKind::ALL {
            let best = self
                .results
                .best_for_user(user_id, kind)
                .await
                .map_err(map_result_error)?;
            match kind {
                TestKind::ReactionTime => best_scores.reaction_time = best,
                TestKind::SequenceMemory => best_scores.sequence_memory = best,
                TestKind::VerbalMemory => best_scores.verbal_memory = best,
            }
        }

        let recent_tests = self
            .results
            .recent_for_user(user_id, RECENT_TESTS_LIMIT)
            .await
            .map_err(map_result_error)?;

        Ok(UserSummary {
            total_tests,
            brain_age: user.brain_age,
            tests_by_kind: KindCounts::from_pairs(&by_kind),
            best_scores,
            recent_tests,
        })
    }

    async fn global_summary(&self) -> Result<GlobalSummary, Error> {
        let total_users = self.users.count().await.map_err(map_user_error)?;
        let total_tests = self.results.count().await.map_err(map_result_error)?;
        let avg_brain_age = self
            .users
            .mean_brain_age()
            .await
            .map_err(map_user_error)?;
        let by_kind = self
            .results
            .counts_by_kind()
            .await
            .map_err(map_result_error)?;

        Ok(GlobalSummary {
            total_users,
            total_tests,
            avg_brain_age,
            tests_by_kind: KindCounts::from_pairs(&by_kind),
        })
    }

    async fn progress(&self, user_id: &UserId, days: i64) -> Result<Vec<ProgressPoint>, Error> {
        if days <= 0 {
            return Err(Error::invalid_request("days must be positive"));
        }
        let cutoff = Utc::now() - Duration::days(days);
        let results = self
            .results
            .since(user_id, cutoff)
            .await
            .map_err(map_result_error)?;
        Ok(bucket_by_day(&results))
    }
}
