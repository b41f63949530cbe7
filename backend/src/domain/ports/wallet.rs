//! Driving ports for the wallet ledger, plus its view types.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, Transaction, TransactionKind, UserId};

/// Redirect handle returned when a gateway payment is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiation {
    pub transaction_id: Uuid,
    /// Where the client sends the user to complete the payment.
    pub payment_url: String,
    pub gateway_reference: String,
}

/// Outcome of a verification call.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    /// Whether the gateway reported the payment as settled.
    pub settled: bool,
    pub transaction: Transaction,
}

/// Read-only wallet projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    #[schema(value_type = String, example = "125000")]
    pub balance: Decimal,
    pub is_premium: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletCommand: Send + Sync {
    /// Open a pending transaction and request a payment handle from the
    /// gateway.
    async fn create_payment(
        &self,
        user_id: &UserId,
        amount: Decimal,
        kind: TransactionKind,
    ) -> Result<PaymentInitiation, Error>;

    /// Check settlement with the gateway and, on the pending→completed
    /// transition, apply the balance/premium effect exactly once.
    async fn verify_payment(
        &self,
        transaction_id: &Uuid,
        gateway_reference: &str,
    ) -> Result<PaymentVerification, Error>;

    /// Buy premium from the wallet balance, bypassing the gateway.
    async fn purchase_premium(&self, user_id: &UserId) -> Result<Transaction, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletQuery: Send + Sync {
    /// Current balance and premium flag.
    async fn balance(&self, user_id: &UserId) -> Result<BalanceView, Error>;

    /// The user's transactions, newest first.
    async fn transactions(&self, user_id: &UserId) -> Result<Vec<Transaction>, Error>;
}
