//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, LoginService, StatsQuery, TestCommand, TestQuery, WalletCommand, WalletQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub login: Arc<dyn LoginService>,
    pub tests: Arc<dyn TestCommand>,
    pub test_queries: Arc<dyn TestQuery>,
    pub stats: Arc<dyn StatsQuery>,
    pub wallet: Arc<dyn WalletCommand>,
    pub wallet_queries: Arc<dyn WalletQuery>,
}
