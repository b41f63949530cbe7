//! PostgreSQL-backed `TestResultRepository` implementation using Diesel ORM.
//!
//! Results are append-only; besides the insert this adapter is all lookups
//! and aggregations. The leaderboard runs as a single grouped join ordered
//! by max score with the user id as the deterministic tie-break.

use async_trait::async_trait;
use diesel::dsl::{avg, count_star, max};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{ScoreAggregate, TestResultPersistenceError, TestResultRepository};
use crate::domain::{TestKind, TestResult, TestResultDraft, UserId};

use super::models::{NewTestResultRow, TestResultRow};
use super::pool::{DbPool, PoolError};
use super::schema::{test_results, users};

/// Diesel-backed implementation of the `TestResultRepository` port.
#[derive(Clone)]
pub struct DieselTestResultRepository {
    pool: DbPool,
}

impl DieselTestResultRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain test-result repository errors.
fn map_pool_error(error: PoolError) -> TestResultPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            TestResultPersistenceError::connection(message)
        }
    }
}

/// Map Diesel errors to domain test-result repository errors.
fn map_diesel_error(error: diesel::result::Error) -> TestResultPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => TestResultPersistenceError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            TestResultPersistenceError::connection("database connection error")
        }
        _ => TestResultPersistenceError::query("database error"),
    }
}

/// Convert a database row to a domain test result.
fn row_to_result(row: TestResultRow) -> Result<TestResult, TestResultPersistenceError> {
    let kind = row.kind.parse::<TestKind>().map_err(|_| {
        TestResultPersistenceError::query(format!("unknown stored test kind: {}", row.kind))
    })?;
    Ok(TestResult {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        kind,
        score: row.score,
        reaction_time_ms: row.reaction_time_ms,
        level: row.level,
        correct_answers: row.correct_answers,
        metadata: row.metadata,
        created_at: row.created_at,
    })
}

fn rows_to_results(
    rows: Vec<TestResultRow>,
) -> Result<Vec<TestResult>, TestResultPersistenceError> {
    rows.into_iter().map(row_to_result).collect()
}

/// Parse grouped `(kind, count)` pairs, dropping unknown kinds with a
/// warning rather than failing the whole aggregate.
fn parse_kind_counts(pairs: Vec<(String, i64)>) -> Vec<(TestKind, i64)> {
    pairs
        .into_iter()
        .filter_map(|(raw, count)| match raw.parse::<TestKind>() {
            Ok(kind) => Some((kind, count)),
            Err(_) => {
                warn!(kind = raw, "unknown test kind in grouped count, skipping");
                None
            }
        })
        .collect()
}

type LeaderboardRow = (
    Uuid,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
);

fn row_to_aggregate(row: LeaderboardRow) -> ScoreAggregate {
    let (id, email, username, first_name, last_name, max_score, avg_score) = row;
    ScoreAggregate {
        user_id: UserId::from_uuid(id),
        email,
        username,
        first_name,
        last_name,
        // The group-by guarantees at least one result per row.
        max_score: max_score.unwrap_or(0.0),
        avg_score: avg_score.unwrap_or(0.0),
    }
}

#[async_trait]
impl TestResultRepository for DieselTestResultRepository {
    async fn insert(
        &self,
        user_id: &UserId,
        draft: &TestResultDraft,
    ) -> Result<TestResult, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewTestResultRow {
            id: Uuid::new_v4(),
            user_id: *user_id.as_uuid(),
            kind: draft.kind.as_str(),
            score: draft.score,
            reaction_time_ms: draft.reaction_time_ms,
            level: draft.level,
            correct_answers: draft.correct_answers,
            metadata: draft.metadata.as_ref(),
        };

        let row: TestResultRow = diesel::insert_into(test_results::table)
            .values(&new_row)
            .returning(TestResultRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_result(row)
    }

    async fn recent_by_kind(
        &self,
        user_id: &UserId,
        kind: TestKind,
        limit: i64,
    ) -> Result<Vec<TestResult>, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TestResultRow> = test_results::table
            .filter(test_results::user_id.eq(user_id.as_uuid()))
            .filter(test_results::kind.eq(kind.as_str()))
            .order(test_results::created_at.desc())
            .limit(limit)
            .select(TestResultRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_results(rows)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        kind: Option<TestKind>,
    ) -> Result<Vec<TestResult>, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = test_results::table
            .filter(test_results::user_id.eq(user_id.as_uuid()))
            .into_boxed();
        if let Some(kind) = kind {
            query = query.filter(test_results::kind.eq(kind.as_str()));
        }

        let rows: Vec<TestResultRow> = query
            .order(test_results::created_at.desc())
            .select(TestResultRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_results(rows)
    }

    async fn best_for_user(
        &self,
        user_id: &UserId,
        kind: TestKind,
    ) -> Result<Option<TestResult>, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TestResultRow> = test_results::table
            .filter(test_results::user_id.eq(user_id.as_uuid()))
            .filter(test_results::kind.eq(kind.as_str()))
            .order((test_results::score.desc(), test_results::created_at.asc()))
            .select(TestResultRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_result).transpose()
    }

    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<TestResult>, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TestResultRow> = test_results::table
            .filter(test_results::user_id.eq(user_id.as_uuid()))
            .order(test_results::created_at.desc())
            .limit(limit)
            .select(TestResultRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_results(rows)
    }

    async fn count_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<i64, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        test_results::table
            .filter(test_results::user_id.eq(user_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn counts_by_kind_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<(TestKind, i64)>, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let pairs: Vec<(String, i64)> = test_results::table
            .filter(test_results::user_id.eq(user_id.as_uuid()))
            .group_by(test_results::kind)
            .select((test_results::kind, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(parse_kind_counts(pairs))
    }

    async fn since(
        &self,
        user_id: &UserId,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<TestResult>, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TestResultRow> = test_results::table
            .filter(test_results::user_id.eq(user_id.as_uuid()))
            .filter(test_results::created_at.ge(cutoff))
            .order(test_results::created_at.asc())
            .select(TestResultRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_results(rows)
    }

    async fn count(&self) -> Result<i64, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        test_results::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn counts_by_kind(
        &self,
    ) -> Result<Vec<(TestKind, i64)>, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let pairs: Vec<(String, i64)> = test_results::table
            .group_by(test_results::kind)
            .select((test_results::kind, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(parse_kind_counts(pairs))
    }

    async fn leaderboard(
        &self,
        kind: Option<TestKind>,
        limit: i64,
    ) -> Result<Vec<ScoreAggregate>, TestResultPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let grouping = (
            users::id,
            users::email,
            users::username,
            users::first_name,
            users::last_name,
        );
        let selection = (
            users::id,
            users::email,
            users::username,
            users::first_name,
            users::last_name,
            max(test_results::score),
            avg(test_results::score),
        );

        let rows: Vec<LeaderboardRow> = match kind {
            Some(kind) => {
                test_results::table
                    .inner_join(users::table)
                    .filter(test_results::kind.eq(kind.as_str()))
                    .group_by(grouping)
                    .select(selection)
                    .order((max(test_results::score).desc(), users::id.asc()))
                    .limit(limit)
                    .load(&mut conn)
                    .await
            }
            None => {
                test_results::table
                    .inner_join(users::table)
                    .group_by(grouping)
                    .select(selection)
                    .order((max(test_results::score).desc(), users::id.asc()))
                    .limit(limit)
                    .load(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_aggregate).collect())
    }
}
