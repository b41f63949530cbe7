//! Wallet ledger service.
//!
//! Implements [`WalletCommand`] and [`WalletQuery`]: gateway-backed deposits
//! and their verification, plus the balance-funded premium purchase. The two
//! invariant-bearing mutations — the premium debit and the settlement credit
//! — run as guarded updates so neither can apply twice.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::ports::{
    BalanceView, PaymentGateway, PaymentGatewayError, PaymentInitiation, PaymentVerification,
    PremiumDebit, SettlementStatus, TransactionPersistenceError, TransactionRepository,
    UserPersistenceError, UserRepository, WalletCommand, WalletQuery,
};
use crate::domain::{
    Error, NewTransaction, Transaction, TransactionKind, TransactionStatus, UserId,
};

/// Fixed premium price, in minor currency units.
pub const PREMIUM_PRICE_MINOR: i64 = 50_000;
/// Smallest accepted gateway payment, in minor currency units.
pub const MIN_PAYMENT_MINOR: i64 = 1_000;

/// Fixed premium price as a monetary amount.
pub fn premium_price() -> Decimal {
    Decimal::from(PREMIUM_PRICE_MINOR)
}

/// Wallet service implementing the wallet driving ports.
#[derive(Clone)]
pub struct WalletService<U, T, G> {
    users: Arc<U>,
    transactions: Arc<T>,
    gateway: Arc<G>,
}

impl<U, T, G> WalletService<U, T, G> {
    /// Create a new service with the given repositories and gateway.
    pub fn new(users: Arc<U>, transactions: Arc<T>, gateway: Arc<G>) -> Self {
        Self {
            users,
            transactions,
            gateway,
        }
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } | UserPersistenceError::Duplicate { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

fn map_transaction_error(error: TransactionPersistenceError) -> Error {
    match error {
        TransactionPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("transaction repository unavailable: {message}"))
        }
        TransactionPersistenceError::Query { message } => {
            Error::internal(format!("transaction repository error: {message}"))
        }
    }
}

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    Error::upstream(error.to_string())
}

impl<U, T, G> WalletService<U, T, G>
where
    U: UserRepository,
    T: TransactionRepository,
    G: PaymentGateway,
{
    async fn require_user(&self, user_id: &UserId) -> Result<crate::domain::User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    /// Apply the settled payment's effect on the user record.
    ///
    /// Only called on the pending→completed transition, so the effect runs
    /// exactly once per transaction.
    async fn apply_settlement(&self, transaction: &Transaction) -> Result<(), Error> {
        match transaction.kind {
            TransactionKind::Deposit => self
                .users
                .credit_balance(&transaction.user_id, transaction.amount)
                .await
                .map_err(map_user_error),
            TransactionKind::PremiumPurchase => self
                .users
                .set_premium(&transaction.user_id)
                .await
                .map_err(map_user_error),
            TransactionKind::Withdraw | TransactionKind::TestPurchase => {
                tracing::debug!(
                    transaction_id = %transaction.id,
                    kind = %transaction.kind,
                    "settled transaction kind carries no user-record effect"
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<U, T, G> WalletCommand for WalletService<U, T, G>
where
    U: UserRepository,
    T: TransactionRepository,
    G: PaymentGateway,
{
    async fn create_payment(
        &self,
        user_id: &UserId,
        amount: Decimal,
        kind: TransactionKind,
    ) -> Result<PaymentInitiation, Error> {
        if amount < Decimal::from(MIN_PAYMENT_MINOR) {
            return Err(Error::invalid_request(format!(
                "amount must be at least {MIN_PAYMENT_MINOR}"
            )));
        }
        self.require_user(user_id).await?;

        let pending = self
            .transactions
            .insert(&NewTransaction {
                user_id: *user_id,
                kind,
                amount,
                status: TransactionStatus::Pending,
                metadata: None,
            })
            .await
            .map_err(map_transaction_error)?;

        let created = match self.gateway.create_payment(amount, pending.id).await {
            Ok(created) => created,
            Err(error) => {
                // The row is kept for audit; only its status moves.
                if let Err(mark_error) = self
                    .transactions
                    .mark_status(&pending.id, TransactionStatus::Failed)
                    .await
                {
                    tracing::warn!(
                        transaction_id = %pending.id,
                        error = %mark_error,
                        "failed to mark transaction as failed after gateway error"
                    );
                }
                return Err(map_gateway_error(error));
            }
        };

        self.transactions
            .attach_gateway_reference(&pending.id, &created.payment_id)
            .await
            .map_err(map_transaction_error)?;

        tracing::info!(
            transaction_id = %pending.id,
            gateway_reference = %created.payment_id,
            "payment created"
        );

        Ok(PaymentInitiation {
            transaction_id: pending.id,
            payment_url: created.payment_url,
            gateway_reference: created.payment_id,
        })
    }

    async fn verify_payment(
        &self,
        transaction_id: &Uuid,
        gateway_reference: &str,
    ) -> Result<PaymentVerification, Error> {
        let transaction = self
            .transactions
            .find_by_id(transaction_id)
            .await
            .map_err(map_transaction_error)?
            .ok_or_else(|| Error::not_found("transaction not found"))?;

        // A gateway failure here leaves the row pending; the caller may
        // retry verification later.
        let status = self
            .gateway
            .payment_status(gateway_reference)
            .await
            .map_err(map_gateway_error)?;

        match status {
            SettlementStatus::Paid => {
                let transitioned = self
                    .transactions
                    .complete_if_pending(transaction_id)
                    .await
                    .map_err(map_transaction_error)?;

                if transitioned {
                    self.apply_settlement(&transaction).await?;
                    tracing::info!(transaction_id = %transaction.id, "payment settled");
                }

                let current = self
                    .transactions
                    .find_by_id(transaction_id)
                    .await
                    .map_err(map_transaction_error)?
                    .ok_or_else(|| Error::internal("transaction vanished during verification"))?;

                Ok(PaymentVerification {
                    settled: true,
                    transaction: current,
                })
            }
            SettlementStatus::Unsettled { status } => {
                tracing::debug!(
                    transaction_id = %transaction.id,
                    gateway_status = %status,
                    "payment not settled yet"
                );
                Ok(PaymentVerification {
                    settled: false,
                    transaction,
                })
            }
        }
    }

    async fn purchase_premium(&self, user_id: &UserId) -> Result<Transaction, Error> {
        let user = self.require_user(user_id).await?;
        if user.is_premium {
            return Err(Error::business_rule("user already has premium"));
        }
        let price = premium_price();
        if user.balance < price {
            return Err(Error::business_rule("insufficient balance"));
        }

        // The guarded update re-checks both conditions, so a concurrent
        // purchase cannot also pass the balance check.
        match self
            .users
            .debit_premium(user_id, price)
            .await
            .map_err(map_user_error)?
        {
            PremiumDebit::Applied => {}
            PremiumDebit::AlreadyPremium => {
                return Err(Error::business_rule("user already has premium"));
            }
            PremiumDebit::InsufficientBalance => {
                return Err(Error::business_rule("insufficient balance"));
            }
            PremiumDebit::MissingUser => return Err(Error::not_found("user not found")),
        }

        let transaction = self
            .transactions
            .insert(&NewTransaction {
                user_id: *user_id,
                kind: TransactionKind::PremiumPurchase,
                amount: price,
                status: TransactionStatus::Completed,
                metadata: None,
            })
            .await
            .map_err(map_transaction_error)?;

        tracing::info!(user_id = %user_id, transaction_id = %transaction.id, "premium purchased");
        Ok(transaction)
    }
}

#[async_trait]
impl<U, T, G> WalletQuery for WalletService<U, T, G>
where
    U: UserRepository,
    T: TransactionRepository,
    G: PaymentGateway,
{
    async fn balance(&self, user_id: &UserId) -> Result<BalanceView, Error> {
        let user = self.require_user(user_id).await?;
        Ok(BalanceView {
            balance: user.balance,
            is_premium: user.is_premium,
        })
    }

    async fn transactions(&self, user_id: &UserId) -> Result<Vec<Transaction>, Error> {
        self.transactions
            .list_for_user(user_id)
            .await
            .map_err(map_transaction_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        CreatedPayment, MockPaymentGateway, MockTransactionRepository, MockUserRepository,
    };
    use crate::domain::{Email, ErrorCode, User};
    use chrono::Utc;

    fn user_with(balance: i64, is_premium: bool) -> User {
        User {
            id: UserId::random(),
            email: Email::new("ada@example.com").expect("valid email"),
            password_hash: "$argon2id$fixture".to_owned(),
            first_name: None,
            last_name: None,
            username: Some("ada".to_owned()),
            balance: Decimal::from(balance),
            is_premium,
            brain_age: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn transaction_with(
        user_id: UserId,
        kind: TransactionKind,
        status: TransactionStatus,
        amount: i64,
    ) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount: Decimal::from(amount),
            status,
            gateway_reference: Some("gw-123".to_owned()),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    type Service = WalletService<MockUserRepository, MockTransactionRepository, MockPaymentGateway>;

    fn service(
        users: MockUserRepository,
        transactions: MockTransactionRepository,
        gateway: MockPaymentGateway,
    ) -> Service {
        WalletService::new(Arc::new(users), Arc::new(transactions), Arc::new(gateway))
    }

    #[tokio::test]
    async fn purchase_premium_debits_and_records_a_completed_transaction() {
        let user = user_with(50_000, false);
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user)));
        users
            .expect_debit_premium()
            .withf(move |id, price| *id == user_id && *price == Decimal::from(50_000))
            .times(1)
            .return_once(|_, _| Ok(PremiumDebit::Applied));

        let mut transactions = MockTransactionRepository::new();
        transactions
            .expect_insert()
            .withf(move |new| {
                new.user_id == user_id
                    && new.kind == TransactionKind::PremiumPurchase
                    && new.amount == Decimal::from(50_000)
                    && new.status == TransactionStatus::Completed
            })
            .times(1)
            .return_once(move |new| {
                Ok(transaction_with(
                    new.user_id,
                    new.kind,
                    new.status,
                    50_000,
                ))
            });

        let service = service(users, transactions, MockPaymentGateway::new());
        let transaction = service
            .purchase_premium(&user_id)
            .await
            .expect("purchase succeeds");

        assert_eq!(transaction.status, TransactionStatus::Completed);
        assert_eq!(transaction.amount, Decimal::from(50_000));
    }

    #[tokio::test]
    async fn purchase_premium_rejects_existing_premium_without_mutation() {
        let user = user_with(90_000, true);
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user)));
        users.expect_debit_premium().times(0);

        let mut transactions = MockTransactionRepository::new();
        transactions.expect_insert().times(0);

        let service = service(users, transactions, MockPaymentGateway::new());
        let error = service
            .purchase_premium(&user_id)
            .await
            .expect_err("already premium");
        assert_eq!(error.code(), ErrorCode::BusinessRule);
    }

    #[tokio::test]
    async fn purchase_premium_rejects_insufficient_balance_without_a_transaction() {
        let user = user_with(10_000, false);
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user)));
        users.expect_debit_premium().times(0);

        let mut transactions = MockTransactionRepository::new();
        transactions.expect_insert().times(0);

        let service = service(users, transactions, MockPaymentGateway::new());
        let error = service
            .purchase_premium(&user_id)
            .await
            .expect_err("insufficient balance");
        assert_eq!(error.code(), ErrorCode::BusinessRule);
    }

    #[tokio::test]
    async fn verify_credits_the_deposit_on_the_pending_transition() {
        let user_id = UserId::random();
        let pending = transaction_with(user_id, TransactionKind::Deposit, TransactionStatus::Pending, 25_000);
        let completed = Transaction {
            status: TransactionStatus::Completed,
            ..pending.clone()
        };
        let transaction_id = pending.id;

        let mut transactions = MockTransactionRepository::new();
        let first_lookup = pending.clone();
        let mut lookups = vec![Ok(Some(completed.clone())), Ok(Some(first_lookup))];
        transactions
            .expect_find_by_id()
            .times(2)
            .returning(move |_| lookups.pop().expect("two lookups"));
        transactions
            .expect_complete_if_pending()
            .times(1)
            .return_once(|_| Ok(true));

        let mut users = MockUserRepository::new();
        users
            .expect_credit_balance()
            .withf(move |id, amount| *id == user_id && *amount == Decimal::from(25_000))
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_payment_status()
            .times(1)
            .return_once(|_| Ok(SettlementStatus::Paid));

        let service = service(users, transactions, gateway);
        let verification = service
            .verify_payment(&transaction_id, "gw-123")
            .await
            .expect("verification succeeds");

        assert!(verification.settled);
        assert_eq!(verification.transaction.status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn verify_never_credits_an_already_completed_transaction() {
        let user_id = UserId::random();
        let completed = transaction_with(
            user_id,
            TransactionKind::Deposit,
            TransactionStatus::Completed,
            25_000,
        );
        let transaction_id = completed.id;

        let mut transactions = MockTransactionRepository::new();
        transactions
            .expect_find_by_id()
            .times(2)
            .returning(move |_| Ok(Some(completed.clone())));
        transactions
            .expect_complete_if_pending()
            .times(1)
            .return_once(|_| Ok(false));

        let mut users = MockUserRepository::new();
        users.expect_credit_balance().times(0);
        users.expect_set_premium().times(0);

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_payment_status()
            .times(1)
            .return_once(|_| Ok(SettlementStatus::Paid));

        let service = service(users, transactions, gateway);
        let verification = service
            .verify_payment(&transaction_id, "gw-123")
            .await
            .expect("verification succeeds");

        assert!(verification.settled);
    }

    #[tokio::test]
    async fn verify_leaves_unsettled_payments_pending() {
        let user_id = UserId::random();
        let pending = transaction_with(user_id, TransactionKind::Deposit, TransactionStatus::Pending, 25_000);
        let transaction_id = pending.id;

        let mut transactions = MockTransactionRepository::new();
        transactions
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(pending)));
        transactions.expect_complete_if_pending().times(0);

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_payment_status().times(1).return_once(|_| {
            Ok(SettlementStatus::Unsettled {
                status: "processing".to_owned(),
            })
        });

        let service = service(MockUserRepository::new(), transactions, gateway);
        let verification = service
            .verify_payment(&transaction_id, "gw-123")
            .await
            .expect("verification succeeds");

        assert!(!verification.settled);
        assert_eq!(verification.transaction.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn verify_of_unknown_transaction_is_not_found() {
        let mut transactions = MockTransactionRepository::new();
        transactions
            .expect_find_by_id()
            .times(1)
            .return_once(|_| Ok(None));

        let service = service(
            MockUserRepository::new(),
            transactions,
            MockPaymentGateway::new(),
        );
        let error = service
            .verify_payment(&Uuid::new_v4(), "gw-404")
            .await
            .expect_err("unknown transaction");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn create_payment_marks_the_row_failed_when_the_gateway_errors() {
        let user = user_with(0, false);
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user)));

        let mut transactions = MockTransactionRepository::new();
        transactions.expect_insert().times(1).return_once(move |new| {
            Ok(transaction_with(new.user_id, new.kind, new.status, 25_000))
        });
        transactions
            .expect_mark_status()
            .withf(|_, status| *status == TransactionStatus::Failed)
            .times(1)
            .return_once(|_, _| Ok(()));
        transactions.expect_attach_gateway_reference().times(0);

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_payment()
            .times(1)
            .return_once(|_, _| Err(PaymentGatewayError::transport("connection refused")));

        let service = service(users, transactions, gateway);
        let error = service
            .create_payment(&user_id, Decimal::from(25_000), TransactionKind::Deposit)
            .await
            .expect_err("gateway down");
        assert_eq!(error.code(), ErrorCode::UpstreamFailure);
    }

    #[tokio::test]
    async fn create_payment_attaches_the_gateway_reference() {
        let user = user_with(0, false);
        let user_id = user.id;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user)));

        let mut transactions = MockTransactionRepository::new();
        transactions.expect_insert().times(1).return_once(move |new| {
            Ok(transaction_with(new.user_id, new.kind, new.status, 25_000))
        });
        transactions
            .expect_attach_gateway_reference()
            .withf(|_, reference| reference == "pay-77")
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_payment().times(1).return_once(|_, _| {
            Ok(CreatedPayment {
                payment_id: "pay-77".to_owned(),
                payment_url: "https://gateway.example/pay/77".to_owned(),
            })
        });

        let service = service(users, transactions, gateway);
        let initiation = service
            .create_payment(&user_id, Decimal::from(25_000), TransactionKind::Deposit)
            .await
            .expect("creation succeeds");

        assert_eq!(initiation.gateway_reference, "pay-77");
        assert_eq!(initiation.payment_url, "https://gateway.example/pay/77");
    }

    #[tokio::test]
    async fn create_payment_rejects_amounts_below_the_floor() {
        let service = service(
            MockUserRepository::new(),
            MockTransactionRepository::new(),
            MockPaymentGateway::new(),
        );
        let error = service
            .create_payment(&UserId::random(), Decimal::from(500), TransactionKind::Deposit)
            .await
            .expect_err("amount too small");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }
}
