//! PostgreSQL-backed `TransactionRepository` implementation using Diesel ORM.
//!
//! The pending→completed transition is a single guarded UPDATE so a
//! transaction can only be completed once, no matter how many verification
//! calls race.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{TransactionPersistenceError, TransactionRepository};
use crate::domain::{
    NewTransaction, Transaction, TransactionKind, TransactionStatus, UserId,
};

use super::models::{NewTransactionRow, TransactionRow};
use super::pool::{DbPool, PoolError};
use super::schema::transactions;

/// Diesel-backed implementation of the `TransactionRepository` port.
#[derive(Clone)]
pub struct DieselTransactionRepository {
    pool: DbPool,
}

impl DieselTransactionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain transaction repository errors.
fn map_pool_error(error: PoolError) -> TransactionPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            TransactionPersistenceError::connection(message)
        }
    }
}

/// Map Diesel errors to domain transaction repository errors.
fn map_diesel_error(error: diesel::result::Error) -> TransactionPersistenceError {
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
        DieselError::NotFound => TransactionPersistenceError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            TransactionPersistenceError::connection("database connection error")
        }
        _ => TransactionPersistenceError::query("database error"),
    }
}

/// Convert a database row to a domain transaction.
fn row_to_transaction(row: TransactionRow) -> Result<Transaction, TransactionPersistenceError> {
    let kind = row.kind.parse::<TransactionKind>().map_err(|_| {
        TransactionPersistenceError::query(format!(
            "unknown stored transaction kind: {}",
            row.kind
        ))
    })?;
    let status = row.status.parse::<TransactionStatus>().map_err(|_| {
        TransactionPersistenceError::query(format!(
            "unknown stored transaction status: {}",
            row.status
        ))
    })?;
    Ok(Transaction {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        kind,
        amount: row.amount,
        status,
        gateway_reference: row.gateway_reference,
        metadata: row.metadata,
        created_at: row.created_at,
    })
}

#[async_trait]
impl TransactionRepository for DieselTransactionRepository {
    async fn insert(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, TransactionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewTransactionRow {
            id: Uuid::new_v4(),
            user_id: *transaction.user_id.as_uuid(),
            kind: transaction.kind.as_str(),
            amount: transaction.amount,
            status: transaction.status.as_str(),
            metadata: transaction.metadata.as_ref(),
        };

        let row: TransactionRow = diesel::insert_into(transactions::table)
            .values(&new_row)
            .returning(TransactionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_transaction(row)
    }

    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<Transaction>, TransactionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TransactionRow> = transactions::table
            .filter(transactions::id.eq(id))
            .select(TransactionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_transaction).transpose()
    }

    async fn attach_gateway_reference(
        &self,
        id: &Uuid,
        reference: &str,
    ) -> Result<(), TransactionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(transactions::table.filter(transactions::id.eq(id)))
            .set(transactions::gateway_reference.eq(Some(reference)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn mark_status(
        &self,
        id: &Uuid,
        status: TransactionStatus,
    ) -> Result<(), TransactionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::update(transactions::table.filter(transactions::id.eq(id)))
            .set(transactions::status.eq(status.as_str()))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn complete_if_pending(
        &self,
        id: &Uuid,
    ) -> Result<bool, TransactionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::update(
            transactions::table.filter(
                transactions::id
                    .eq(id)
                    .and(transactions::status.eq(TransactionStatus::Pending.as_str())),
            ),
        )
        .set(transactions::status.eq(TransactionStatus::Completed.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Transaction>, TransactionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<TransactionRow> = transactions::table
            .filter(transactions::user_id.eq(user_id.as_uuid()))
            .order(transactions::created_at.desc())
            .select(TransactionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_transaction).collect()
    }
}
