//! Driving ports for account registration and login.

use async_trait::async_trait;

use crate::domain::{Email, Error, User, UserId};

/// Validated registration payload.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: Email,
    /// Plaintext password; hashed by the account service, never stored.
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account. Duplicate emails are rejected as a business rule.
    async fn register(&self, registration: Registration) -> Result<User, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Verify credentials and return the account's user id.
    async fn login(&self, email: &str, password: &str) -> Result<UserId, Error>;
}
