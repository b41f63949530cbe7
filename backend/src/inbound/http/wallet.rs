//! Wallet API handlers.
//!
//! ```text
//! POST /api/v1/wallet/payment {"amount":"25000","kind":"deposit"}
//! GET /api/v1/wallet/payment/verify?transactionId=..&gatewayReference=..
//! GET /api/v1/wallet/balance
//! GET /api/v1/wallet/transactions
//! POST /api/v1/wallet/premium/purchase
//! ```

use std::str::FromStr;

use actix_web::{get, post, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{BalanceView, PaymentInitiation, PaymentVerification};
use crate::domain::{Error, Transaction, TransactionKind};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Payment creation body for `POST /api/v1/wallet/payment`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequestBody {
    #[schema(value_type = String, example = "25000")]
    pub amount: Decimal,
    /// One of `deposit`, `withdraw`, `premium_purchase`, `test_purchase`.
    pub kind: String,
}

/// Query parameters for the verification endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentQuery {
    pub transaction_id: Uuid,
    pub gateway_reference: String,
}

fn parse_kind(raw: &str) -> Result<TransactionKind, Error> {
    TransactionKind::from_str(raw).map_err(|_| {
        Error::invalid_request(
            "kind must be deposit, withdraw, premium_purchase, or test_purchase",
        )
        .with_details(json!({
            "field": "kind",
            "value": raw,
            "code": "invalid_transaction_kind",
        }))
    })
}

/// Open a gateway payment for the caller.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/payment",
    request_body = CreatePaymentRequestBody,
    responses(
        (status = 200, description = "Payment handle", body = PaymentInitiation),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 502, description = "Gateway failure", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "createPayment"
)]
#[post("/wallet/payment")]
pub async fn create_payment(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreatePaymentRequestBody>,
) -> ApiResult<web::Json<PaymentInitiation>> {
    let user_id = session.require_user_id()?;
    let payload = payload.into_inner();
    let kind = parse_kind(&payload.kind)?;

    let initiation = state
        .wallet
        .create_payment(&user_id, payload.amount, kind)
        .await?;
    Ok(web::Json(initiation))
}

/// Check settlement with the gateway and apply the effect once settled.
#[utoipa::path(
    get,
    path = "/api/v1/wallet/payment/verify",
    params(VerifyPaymentQuery),
    responses(
        (status = 200, description = "Verification outcome", body = PaymentVerification),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Transaction not found", body = Error),
        (status = 502, description = "Gateway failure", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "verifyPayment"
)]
#[get("/wallet/payment/verify")]
pub async fn verify_payment(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<VerifyPaymentQuery>,
) -> ApiResult<web::Json<PaymentVerification>> {
    session.require_user_id()?;
    let query = query.into_inner();

    let verification = state
        .wallet
        .verify_payment(&query.transaction_id, &query.gateway_reference)
        .await?;
    Ok(web::Json(verification))
}

/// The caller's balance and premium flag.
#[utoipa::path(
    get,
    path = "/api/v1/wallet/balance",
    responses(
        (status = 200, description = "Balance", body = BalanceView),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "walletBalance"
)]
#[get("/wallet/balance")]
pub async fn balance(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<BalanceView>> {
    let user_id = session.require_user_id()?;
    let view = state.wallet_queries.balance(&user_id).await?;
    Ok(web::Json(view))
}

/// The caller's transactions, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/wallet/transactions",
    responses(
        (status = 200, description = "Transactions", body = [Transaction]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "walletTransactions"
)]
#[get("/wallet/transactions")]
pub async fn transactions(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Transaction>>> {
    let user_id = session.require_user_id()?;
    let entries = state.wallet_queries.transactions(&user_id).await?;
    Ok(web::Json(entries))
}

/// Buy premium from the wallet balance.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/premium/purchase",
    responses(
        (status = 200, description = "Completed purchase", body = Transaction),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User not found", body = Error),
        (status = 409, description = "Already premium or insufficient balance", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["wallet"],
    operation_id = "purchasePremium"
)]
#[post("/wallet/premium/purchase")]
pub async fn purchase_premium(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Transaction>> {
    let user_id = session.require_user_id()?;
    let transaction = state.wallet.purchase_premium(&user_id).await?;
    Ok(web::Json(transaction))
}
