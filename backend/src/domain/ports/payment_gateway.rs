//! Port abstraction for the external payment gateway.
//!
//! The adapter owns transport details; the domain only sees payment handles
//! and settlement outcomes. Transport failures are always translated into
//! [`PaymentGatewayError`], never surfaced raw.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Errors raised by payment gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentGatewayError {
    /// The gateway could not be reached.
    #[error("payment gateway transport failure: {message}")]
    Transport { message: String },
    /// The gateway did not answer within the configured timeout.
    #[error("payment gateway timed out: {message}")]
    Timeout { message: String },
    /// The gateway answered with a non-success status.
    #[error("payment gateway rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
    /// The gateway's response body could not be decoded.
    #[error("payment gateway returned an invalid payload: {message}")]
    Decode { message: String },
}

impl PaymentGatewayError {
    /// Create a transport error with the given message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a timeout error with the given message.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a rejection error with the given HTTP status and message.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create a decode error with the given message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Payment handle returned by a successful creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPayment {
    /// The gateway's identifier for this payment.
    pub payment_id: String,
    /// Redirect target where the user completes the payment.
    pub payment_url: String,
}

/// Settlement outcome reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementStatus {
    /// The payment has been received.
    Paid,
    /// Not settled yet; carries the gateway's raw status for diagnostics.
    Unsettled { status: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Request a payment handle for the given amount, correlated to our
    /// transaction id.
    async fn create_payment(
        &self,
        amount: Decimal,
        correlation_id: Uuid,
    ) -> Result<CreatedPayment, PaymentGatewayError>;

    /// Query the settlement status of a previously created payment.
    async fn payment_status(
        &self,
        payment_id: &str,
    ) -> Result<SettlementStatus, PaymentGatewayError>;
}
