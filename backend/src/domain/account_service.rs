//! Account registration and login service.
//!
//! Passwords are hashed with argon2id and stored as PHC strings. Login
//! failures for unknown emails and wrong passwords are indistinguishable to
//! the caller.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;

use crate::domain::ports::{
    AccountCommand, LoginService, Registration, UserPersistenceError, UserRepository,
};
use crate::domain::{Email, Error, NewUser, User, UserId};

/// Shortest accepted password.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Account service implementing [`AccountCommand`] and [`LoginService`].
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
}

impl<U> AccountService<U> {
    /// Create a new service with the given user repository.
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::Duplicate { .. } => {
            Error::business_rule("email already registered")
        }
    }
}

fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|error| Error::internal(format!("password hashing failed: {error}")))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[async_trait]
impl<U> AccountCommand for AccountService<U>
where
    U: UserRepository,
{
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        if registration.password.len() < PASSWORD_MIN_LENGTH {
            return Err(Error::invalid_request(format!(
                "password must be at least {PASSWORD_MIN_LENGTH} characters"
            )));
        }

        if self
            .users
            .find_by_email(&registration.email)
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            return Err(Error::business_rule("email already registered"));
        }

        let password_hash = hash_password(&registration.password)?;
        let user = self
            .users
            .create(&NewUser {
                email: registration.email,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                username: registration.username,
            })
            .await
            .map_err(map_user_error)?;

        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }
}

#[async_trait]
impl<U> LoginService for AccountService<U>
where
    U: UserRepository,
{
    async fn login(&self, email: &str, password: &str) -> Result<UserId, Error> {
        let email = Email::new(email)
            .map_err(|error| Error::invalid_request(error.to_string()))?;

        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_error)?;

        match user {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user.id),
            _ => Err(Error::unauthorized("invalid credentials")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockUserRepository;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn stored_user(email: &str, password: &str) -> User {
        User {
            id: UserId::random(),
            email: Email::new(email).expect("valid email"),
            password_hash: hash_password(password).expect("hash"),
            first_name: None,
            last_name: None,
            username: None,
            balance: Decimal::ZERO,
            is_premium: false,
            brain_age: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            email: Email::new(email).expect("valid email"),
            password: password.to_owned(),
            first_name: Some("Ada".to_owned()),
            last_name: None,
            username: None,
        }
    }

    #[test]
    fn hashing_round_trips() {
        let hash = hash_password("correct horse battery").expect("hash");
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_emails() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .return_once(|_| Ok(Some(stored_user("ada@example.com", "existing-pass"))));
        users.expect_create().times(0);

        let service = AccountService::new(Arc::new(users));
        let error = service
            .register(registration("ada@example.com", "password123"))
            .await
            .expect_err("duplicate email");
        assert_eq!(error.code(), ErrorCode::BusinessRule);
    }

    #[tokio::test]
    async fn register_rejects_short_passwords_before_touching_the_repository() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().times(0);

        let service = AccountService::new(Arc::new(users));
        let error = service
            .register(registration("ada@example.com", "short"))
            .await
            .expect_err("short password");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn register_stores_a_hash_rather_than_the_password() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .return_once(|_| Ok(None));
        users
            .expect_create()
            .withf(|new| new.password_hash.starts_with("$argon2") && new.password_hash != "password123")
            .times(1)
            .return_once(|new| {
                let mut user = stored_user("ada@example.com", "irrelevant");
                user.password_hash = new.password_hash.clone();
                Ok(user)
            });

        let service = AccountService::new(Arc::new(users));
        service
            .register(registration("ada@example.com", "password123"))
            .await
            .expect("registration succeeds");
    }

    #[tokio::test]
    async fn login_accepts_the_right_password() {
        let user = stored_user("ada@example.com", "password123");
        let expected_id = user.id;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .return_once(move |_| Ok(Some(user)));

        let service = AccountService::new(Arc::new(users));
        let id = service
            .login("ada@example.com", "password123")
            .await
            .expect("login succeeds");
        assert_eq!(id, expected_id);
    }

    #[tokio::test]
    async fn login_rejects_wrong_passwords_and_unknown_emails_alike() {
        let mut users = MockUserRepository::new();
        let known = stored_user("ada@example.com", "password123");
        users
            .expect_find_by_email()
            .times(2)
            .returning(move |email| {
                if email.as_ref() == "ada@example.com" {
                    Ok(Some(known.clone()))
                } else {
                    Ok(None)
                }
            });

        let service = AccountService::new(Arc::new(users));
        let wrong_password = service
            .login("ada@example.com", "not-the-password")
            .await
            .expect_err("wrong password");
        let unknown_email = service
            .login("nobody@example.com", "password123")
            .await
            .expect_err("unknown email");

        assert_eq!(wrong_password.code(), ErrorCode::Unauthorized);
        assert_eq!(unknown_email.code(), ErrorCode::Unauthorized);
        assert_eq!(wrong_password.message(), unknown_email.message());
    }
}
