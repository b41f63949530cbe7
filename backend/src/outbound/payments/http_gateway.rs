//! Reqwest-backed payment gateway adapter.
//!
//! Owns transport details only: bearer authentication, request timeout, HTTP
//! error mapping, and JSON decoding into the domain's gateway types. Every
//! failure becomes a [`PaymentGatewayError`]; raw reqwest errors never leave
//! this module.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::ports::{
    CreatedPayment, PaymentGateway, PaymentGatewayError, SettlementStatus,
};

use super::dto::{CreatePaymentRequestDto, CreatePaymentResponseDto, PaymentStatusResponseDto};

/// The gateway status string that signals settlement.
const SETTLED_STATUS: &str = "paid";

/// Merchant credentials and transport limits for the gateway client.
pub struct PaymentGatewaySettings {
    /// Merchant API base, e.g. `https://api.click.uz/v2/merchant`.
    pub base_url: Url,
    pub merchant_id: String,
    pub service_id: String,
    /// Bearer credential.
    pub secret: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Payment gateway adapter performing HTTP calls against one merchant API.
pub struct HttpPaymentGateway {
    client: Client,
    base_url: String,
    merchant_id: String,
    service_id: String,
    secret: String,
}

impl HttpPaymentGateway {
    /// Build an adapter using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(settings: PaymentGatewaySettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.as_str().trim_end_matches('/').to_owned(),
            merchant_id: settings.merchant_id,
            service_id: settings.service_id,
            secret: settings.secret,
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment(
        &self,
        amount: Decimal,
        correlation_id: Uuid,
    ) -> Result<CreatedPayment, PaymentGatewayError> {
        let body = CreatePaymentRequestDto {
            amount,
            merchant_id: &self.merchant_id,
            service_id: &self.service_id,
            transaction_param: correlation_id.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/payment/create", self.base_url))
            .bearer_auth(&self.secret)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }

        let decoded: CreatePaymentResponseDto = serde_json::from_slice(bytes.as_ref())
            .map_err(|error| {
                PaymentGatewayError::decode(format!("invalid payment-create payload: {error}"))
            })?;

        Ok(CreatedPayment {
            payment_id: decoded.payment_id,
            payment_url: decoded.payment_url,
        })
    }

    async fn payment_status(
        &self,
        payment_id: &str,
    ) -> Result<SettlementStatus, PaymentGatewayError> {
        let response = self
            .client
            .get(format!("{}/payment/status/{payment_id}", self.base_url))
            .bearer_auth(&self.secret)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }

        let decoded: PaymentStatusResponseDto = serde_json::from_slice(bytes.as_ref())
            .map_err(|error| {
                PaymentGatewayError::decode(format!("invalid payment-status payload: {error}"))
            })?;

        Ok(settlement_from(decoded.status))
    }
}

fn settlement_from(status: String) -> SettlementStatus {
    if status == SETTLED_STATUS {
        SettlementStatus::Paid
    } else {
        SettlementStatus::Unsettled { status }
    }
}

fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    if error.is_timeout() {
        PaymentGatewayError::timeout(error.to_string())
    } else {
        PaymentGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        "gateway returned an empty body".to_owned()
    } else {
        preview
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            PaymentGatewayError::timeout(format!("status {}: {message}", status.as_u16()))
        }
        _ => PaymentGatewayError::rejected(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
