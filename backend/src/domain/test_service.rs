//! Test recording service.
//!
//! Implements the test driving ports: persists submitted results and keeps
//! the submitter's brain age current. A submission never fails because the
//! battery is incomplete; the recompute is simply skipped until all three
//! kinds have at least one result.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::brain_age::{self, BrainAgeInputs, SAMPLE_WINDOW};
use crate::domain::ports::{
    TestCommand, TestQuery, TestResultPersistenceError, TestResultRepository,
    UserPersistenceError, UserRepository,
};
use crate::domain::{Error, TestKind, TestResult, TestResultDraft, UserId};

/// Test recording service implementing [`TestCommand`] and [`TestQuery`].
#[derive(Clone)]
pub struct TestService<R, U> {
    results: Arc<R>,
    users: Arc<U>,
}

impl<R, U> TestService<R, U> {
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

/// Extract the scoring-relevant value from each sampled result.
///
/// Results missing their kind-specific field contribute zero, matching how
/// the averages have always been computed.
fn sample_values(results: &[TestResult], pick: fn(&TestResult) -> Option<i32>) -> Vec<f64> {
    results
        .iter()
        .map(|result| f64::from(pick(result).unwrap_or(0)))
        .collect()
}

impl<R, U> TestService<R, U>
where
    R: TestResultRepository,
    U: UserRepository,
{
    async fn recompute_brain_age(&self, user_id: &UserId) -> Result<(), Error> {
        let window = SAMPLE_WINDOW as i64;
        let reaction = self
            .results
            .recent_by_kind(user_id, TestKind::ReactionTime, window)
            .await
            .map_err(map_result_error)?;
        let sequence = self
            .results
            .recent_by_kind(user_id, TestKind::SequenceMemory, window)
            .await
            .map_err(map_result_error)?;
        let verbal = self
            .results
            .recent_by_kind(user_id, TestKind::VerbalMemory, window)
            .await
            .map_err(map_result_error)?;

        let inputs = BrainAgeInputs {
            reaction_times_ms: sample_values(&reaction, |r| r.reaction_time_ms),
            sequence_levels: sample_values(&sequence, |r| r.level),
            correct_answers: sample_values(&verbal, |r| r.correct_answers),
        };

        if let Some(age) = brain_age::estimate(&inputs) {
            self.users
                .set_brain_age(user_id, age)
                .await
                .map_err(map_user_error)?;
            tracing::debug!(user_id = %user_id, brain_age = age, "brain age recomputed");
        }
        Ok(())
    }
}

#[async_trait]
impl<R, U> TestCommand for TestService<R, U>
where
    R: TestResultRepository,
    U: UserRepository,
{
    async fn submit(
        &self,
        user_id: &UserId,
        draft: TestResultDraft,
    ) -> Result<TestResult, Error> {
        let stored = self
            .results
            .insert(user_id, &draft)
            .await
            .map_err(map_result_error)?;

        self.recompute_brain_age(user_id).await?;

        Ok(stored)
    }
}

#[async_trait]
impl<R, U> TestQuery for TestService<R, U>
where
    R: TestResultRepository,
    U: UserRepository,
{
    async fn history(
        &self,
        user_id: &UserId,
        kind: Option<TestKind>,
    ) -> Result<Vec<TestResult>, Error> {
        self.results
            .list_for_user(user_id, kind)
            .await
            .map_err(map_result_error)
    }

    async fn best_score(
        &self,
        user_id: &UserId,
        kind: TestKind,
    ) -> Result<Option<TestResult>, Error> {
        self.results
            .best_for_user(user_id, kind)
            .await
            .map_err(map_result_error)
    }
}
