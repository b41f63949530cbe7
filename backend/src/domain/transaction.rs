//! Wallet transactions: kinds, status machine, and the ledger row.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::UserId;

/// Closed set of transaction categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    PremiumPurchase,
    TestPurchase,
}

impl TransactionKind {
    /// Stable wire/storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::PremiumPurchase => "premium_purchase",
            Self::TestPurchase => "test_purchase",
        }
    }
}

/// Error returned when parsing a transaction kind from string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseTransactionKindError;

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ParseTransactionKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid transaction kind")
    }
}

impl std::error::Error for ParseTransactionKindError {}

impl FromStr for TransactionKind {
    type Err = ParseTransactionKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "deposit" => Ok(Self::Deposit),
            "withdraw" => Ok(Self::Withdraw),
            "premium_purchase" => Ok(Self::PremiumPurchase),
            "test_purchase" => Ok(Self::TestPurchase),
            _ => Err(ParseTransactionKindError),
        }
    }
}

/// Transaction settlement state.
///
/// `Pending` is the only non-terminal state; a row that has reached
/// `Completed`, `Failed`, or `Cancelled` is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    /// Stable wire/storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this state admits no further transition.
    pub fn is_terminal(self) -> bool {
        match self {
            Self::Pending => false,
            Self::Completed | Self::Failed | Self::Cancelled => true,
        }
    }
}

/// Error returned when parsing a transaction status from string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseTransactionStatusError;

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ParseTransactionStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid transaction status")
    }
}

impl std::error::Error for ParseTransactionStatusError {}

impl FromStr for TransactionStatus {
    type Err = ParseTransactionStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseTransactionStatusError),
        }
    }
}

/// A ledger entry. Rows are retained for audit even when the underlying
/// payment fails.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub kind: TransactionKind,
    #[schema(value_type = String, example = "50000")]
    pub amount: Decimal,
    pub status: TransactionStatus,
    /// Identifier assigned by the external gateway, once known.
    pub gateway_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Payload for opening a new ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub metadata: Option<serde_json::Value>,
}
