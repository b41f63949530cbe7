//! Domain primitives, aggregates, services, and ports.
//!
//! Types here are transport and storage agnostic. The inbound HTTP adapter
//! maps them onto JSON; the outbound adapters map them onto rows and gateway
//! payloads. Business rules live in the services, never in the data types.

pub mod account_service;
pub mod brain_age;
pub mod error;
pub mod ports;
pub mod stats_service;
pub mod test_result;
pub mod test_service;
pub mod transaction;
pub mod user;
pub mod wallet_service;
pub mod word_bank;

pub use self::account_service::AccountService;
pub use self::error::{Error, ErrorCode};
pub use self::stats_service::StatsService;
pub use self::test_result::{
    ParseTestKindError, TestKind, TestResult, TestResultDraft, TestSubmissionError,
};
pub use self::test_service::TestService;
pub use self::transaction::{
    NewTransaction, ParseTransactionKindError, ParseTransactionStatusError, Transaction,
    TransactionKind, TransactionStatus,
};
pub use self::user::{Email, NewUser, User, UserId, UserValidationError};
pub use self::wallet_service::WalletService;
