//! Payment gateway adapter over the Click merchant HTTP API.

mod dto;
mod http_gateway;

pub use http_gateway::{HttpPaymentGateway, PaymentGatewaySettings};
