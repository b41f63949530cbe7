//! Outbound adapters: PostgreSQL persistence and the payment gateway client.

pub mod payments;
pub mod persistence;
