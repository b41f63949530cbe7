//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! The two wallet mutations run as guarded single-statement updates so the
//! balance invariant holds under concurrent requests: the premium debit
//! re-checks `is_premium` and the balance inside the UPDATE itself.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{PremiumDebit, UserPersistenceError, UserRepository};
use crate::domain::{Email, NewUser, User, UserId};

use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain user repository errors.
fn map_pool_error(error: PoolError) -> UserPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserPersistenceError::connection(message)
        }
    }
}

/// Map Diesel errors to domain user repository errors.
fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
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
        DieselError::NotFound => UserPersistenceError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            UserPersistenceError::duplicate(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection error")
        }
        _ => UserPersistenceError::query("database error"),
    }
}

/// Convert a database row to a domain user.
fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let email = Email::new(row.email).map_err(|error| {
        UserPersistenceError::query(format!("stored email is malformed: {error}"))
    })?;
    Ok(User {
        id: UserId::from_uuid(row.id),
        email,
        password_hash: row.password_hash,
        first_name: row.first_name,
        last_name: row.last_name,
        username: row.username,
        balance: row.balance,
        is_premium: row.is_premium,
        brain_age: row.brain_age,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl DieselUserRepository {
    /// Classify a premium debit whose guarded update matched no row.
    async fn classify_rejected_debit<C>(
        conn: &mut C,
        user_id: Uuid,
        price: Decimal,
    ) -> Result<PremiumDebit, UserPersistenceError>
    where
        C: diesel_async::AsyncConnection<Backend = diesel::pg::Pg> + Send,
    {
        let current: Option<UserRow> = users::table
            .filter(users::id.eq(user_id))
            .select(UserRow::as_select())
            .first(conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(match current {
            None => PremiumDebit::MissingUser,
            Some(row) if row.is_premium => PremiumDebit::AlreadyPremium,
            Some(row) if row.balance < price => PremiumDebit::InsufficientBalance,
            // The guard must have lost a race that has since resolved in the
            // user's favour; report the premium flag as the blocker.
            Some(_) => PremiumDebit::AlreadyPremium,
        })
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewUserRow {
            id: Uuid::new_v4(),
            email: user.email.as_ref(),
            password_hash: user.password_hash.as_str(),
            first_name: user.first_name.as_deref(),
            last_name: user.last_name.as_deref(),
            username: user.username.as_deref(),
        };

        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_user(row)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn set_brain_age(
        &self,
        id: &UserId,
        brain_age: f64,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set(users::brain_age.eq(Some(brain_age)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn credit_balance(
        &self,
        id: &UserId,
        amount: Decimal,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set(users::balance.eq(users::balance + amount))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn set_premium(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set(users::is_premium.eq(true))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn debit_premium(
        &self,
        id: &UserId,
        price: Decimal,
    ) -> Result<PremiumDebit, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::update(
            users::table.filter(
                users::id
                    .eq(id.as_uuid())
                    .and(users::is_premium.eq(false))
                    .and(users::balance.ge(price)),
            ),
        )
        .set((
            users::balance.eq(users::balance - price),
            users::is_premium.eq(true),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        if affected > 0 {
            return Ok(PremiumDebit::Applied);
        }
        Self::classify_rejected_debit(&mut conn, *id.as_uuid(), price).await
    }

    async fn count(&self) -> Result<i64, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn mean_brain_age(&self) -> Result<Option<f64>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        users::table
            .filter(users::brain_age.is_not_null())
            .select(diesel::dsl::avg(users::brain_age))
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the pure mapping helpers.
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn row(email: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash: "$argon2id$fixture".to_owned(),
            first_name: Some("Ada".to_owned()),
            last_name: None,
            username: Some("ada".to_owned()),
            balance: Decimal::from(12_500),
            is_premium: false,
            brain_age: Some(37.5),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(repo_err, UserPersistenceError::Connection { .. }));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        let repo_err = map_diesel_error(diesel::result::Error::NotFound);

        assert!(matches!(repo_err, UserPersistenceError::Query { .. }));
        assert!(repo_err.to_string().contains("record not found"));
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate() {
        let diesel_err = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_owned()),
        );
        let repo_err = map_diesel_error(diesel_err);

        assert!(matches!(repo_err, UserPersistenceError::Duplicate { .. }));
    }

    #[rstest]
    fn row_to_user_carries_wallet_and_brain_age_fields() {
        let user = row_to_user(row("ada@example.com")).expect("valid row");

        assert_eq!(user.email.as_ref(), "ada@example.com");
        assert_eq!(user.balance, Decimal::from(12_500));
        assert_eq!(user.brain_age, Some(37.5));
        assert!(!user.is_premium);
    }

    #[rstest]
    fn row_to_user_rejects_malformed_stored_emails() {
        let error = row_to_user(row("not-an-email")).expect_err("malformed email");
        assert!(matches!(error, UserPersistenceError::Query { .. }));
    }
}
