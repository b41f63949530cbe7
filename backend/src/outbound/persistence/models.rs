//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::schema::{test_results, transactions, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub balance: Decimal,
    pub is_premium: bool,
    pub brain_age: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub username: Option<&'a str>,
}

/// Row struct for reading from the test_results table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = test_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TestResultRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub score: f64,
    pub reaction_time_ms: Option<i32>,
    pub level: Option<i32>,
    pub correct_answers: Option<i32>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new test-result records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = test_results)]
pub(crate) struct NewTestResultRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub score: f64,
    pub reaction_time_ms: Option<i32>,
    pub level: Option<i32>,
    pub correct_answers: Option<i32>,
    pub metadata: Option<&'a serde_json::Value>,
}

/// Row struct for reading from the transactions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub amount: Decimal,
    pub status: String,
    pub gateway_reference: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for opening new ledger entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transactions)]
pub(crate) struct NewTransactionRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub amount: Decimal,
    pub status: &'a str,
    pub metadata: Option<&'a serde_json::Value>,
}
