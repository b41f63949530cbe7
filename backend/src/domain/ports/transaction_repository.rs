//! Port abstraction for transaction persistence adapters.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewTransaction, Transaction, TransactionStatus, UserId};

/// Persistence errors raised by transaction repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionPersistenceError {
    /// Repository connection could not be established.
    #[error("transaction repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("transaction repository query failed: {message}")]
    Query { message: String },
}

impl TransactionPersistenceError {
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

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Open a new ledger entry.
    async fn insert(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, TransactionPersistenceError>;

    /// Fetch a transaction by identifier.
    async fn find_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<Transaction>, TransactionPersistenceError>;

    /// Record the reference the gateway assigned to this payment.
    async fn attach_gateway_reference(
        &self,
        id: &Uuid,
        reference: &str,
    ) -> Result<(), TransactionPersistenceError>;

    /// Move a transaction to the given status unconditionally.
    async fn mark_status(
        &self,
        id: &Uuid,
        status: TransactionStatus,
    ) -> Result<(), TransactionPersistenceError>;

    /// Transition `pending → completed` as a compare-and-swap.
    ///
    /// Returns `true` only when this call performed the transition; a
    /// transaction already in a terminal state is left untouched and yields
    /// `false`. Callers apply the balance/premium effect only on `true`.
    async fn complete_if_pending(&self, id: &Uuid)
    -> Result<bool, TransactionPersistenceError>;

    /// All of a user's transactions, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Transaction>, TransactionPersistenceError>;
}
