//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL through `diesel-async` with `bb8` connection pooling. Row
//! structs (`models.rs`) and `diesel::table!` definitions (`schema.rs`) are
//! implementation details of this layer and never cross into the domain.

mod diesel_test_result_repository;
mod diesel_transaction_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_test_result_repository::DieselTestResultRepository;
pub use diesel_transaction_repository::DieselTransactionRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
