//! Wire types for the Click merchant API.
//!
//! The gateway is loose about numeric identifiers, so `payment_id` is
//! accepted as either a JSON string or a number and normalised to a string.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /payment/create`.
#[derive(Debug, Serialize)]
pub(crate) struct CreatePaymentRequestDto<'a> {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub merchant_id: &'a str,
    pub service_id: &'a str,
    /// Our transaction id, echoed back by the gateway.
    pub transaction_param: String,
}

/// Body of a successful `POST /payment/create` response.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatePaymentResponseDto {
    #[serde(deserialize_with = "string_or_number")]
    pub payment_id: String,
    pub payment_url: String,
}

/// Body of a `GET /payment/status/{id}` response.
#[derive(Debug, Deserialize)]
pub(crate) struct PaymentStatusResponseDto {
    pub status: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::String(value) => value,
        Raw::Number(value) => value.to_string(),
    })
}
