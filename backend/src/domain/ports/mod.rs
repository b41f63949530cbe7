//! Domain ports.
//!
//! Driven ports (repositories, the payment gateway) abstract the outbound
//! adapters; driving ports (commands and queries) are the use-case surface
//! the HTTP adapter depends on. Services in `crate::domain` implement the
//! driving ports in terms of the driven ones.

mod account;
mod payment_gateway;
mod stats_query;
mod test_ops;
mod test_result_repository;
mod transaction_repository;
mod user_repository;
mod wallet;

pub use account::{AccountCommand, LoginService, Registration};
pub use payment_gateway::{CreatedPayment, PaymentGateway, PaymentGatewayError, SettlementStatus};
pub use stats_query::{
    BestScores, GlobalSummary, KindCounts, LeaderboardEntry, ProgressPoint, StatsQuery,
    UserSummary,
};
pub use test_ops::{TestCommand, TestQuery};
pub use test_result_repository::{
    ScoreAggregate, TestResultPersistenceError, TestResultRepository,
};
pub use transaction_repository::{TransactionPersistenceError, TransactionRepository};
pub use user_repository::{PremiumDebit, UserPersistenceError, UserRepository};
pub use wallet::{BalanceView, PaymentInitiation, PaymentVerification, WalletCommand, WalletQuery};

#[cfg(test)]
pub use account::{MockAccountCommand, MockLoginService};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
#[cfg(test)]
pub use stats_query::MockStatsQuery;
#[cfg(test)]
pub use test_ops::{MockTestCommand, MockTestQuery};
#[cfg(test)]
pub use test_result_repository::MockTestResultRepository;
#[cfg(test)]
pub use transaction_repository::MockTransactionRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
#[cfg(test)]
pub use wallet::{MockWalletCommand, MockWalletQuery};
