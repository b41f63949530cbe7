//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Email, NewUser, User, UserId};

/// Persistence errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
    /// A unique constraint rejected the write (duplicate email).
    #[error("user repository uniqueness violation: {message}")]
    Duplicate { message: String },
}

impl UserPersistenceError {
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

    /// Create a duplicate-key error with the given message.
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate {
            message: message.into(),
        }
    }
}

/// Outcome of the guarded premium debit.
///
/// The debit runs as a single conditional update so two concurrent purchase
/// attempts can never both pass the balance check; the rejected path is
/// classified afterwards so the caller can report the right business rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PremiumDebit {
    /// Balance decremented and premium flag set.
    Applied,
    /// The user already holds premium; nothing changed.
    AlreadyPremium,
    /// Balance below the price; nothing changed.
    InsufficientBalance,
    /// No such user.
    MissingUser,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user record.
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError>;

    /// Persist a freshly computed brain age onto the user record.
    async fn set_brain_age(&self, id: &UserId, brain_age: f64)
    -> Result<(), UserPersistenceError>;

    /// Increment the user's balance by the given amount.
    async fn credit_balance(
        &self,
        id: &UserId,
        amount: Decimal,
    ) -> Result<(), UserPersistenceError>;

    /// Set the premium flag.
    async fn set_premium(&self, id: &UserId) -> Result<(), UserPersistenceError>;

    /// Atomically decrement the balance by `price` and set the premium flag,
    /// guarded on `is_premium = false` and `balance >= price`.
    async fn debit_premium(
        &self,
        id: &UserId,
        price: Decimal,
    ) -> Result<PremiumDebit, UserPersistenceError>;

    /// Total number of users.
    async fn count(&self) -> Result<i64, UserPersistenceError>;

    /// Mean brain age across users that have one, if any do.
    async fn mean_brain_age(&self) -> Result<Option<f64>, UserPersistenceError>;
}
