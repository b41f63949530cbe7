//! OpenAPI document assembly.

use utoipa::OpenApi;

use crate::domain::ports::{
    BalanceView, BestScores, GlobalSummary, KindCounts, LeaderboardEntry, PaymentInitiation,
    PaymentVerification, ProgressPoint, UserSummary,
};
use crate::domain::{Error, ErrorCode, TestKind, TestResult, Transaction, TransactionKind, TransactionStatus};
use crate::inbound::http;

/// OpenAPI description of the REST surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mindmetric API",
        description = "Cognitive testing, statistics, and wallet endpoints."
    ),
    paths(
        http::users::register,
        http::users::login,
        http::users::logout,
        http::cognitive_tests::submit_test,
        http::cognitive_tests::test_history,
        http::cognitive_tests::best_score,
        http::cognitive_tests::verbal_words,
        http::stats::leaderboard,
        http::stats::my_stats,
        http::stats::my_progress,
        http::stats::global_stats,
        http::wallet::create_payment,
        http::wallet::verify_payment,
        http::wallet::balance,
        http::wallet::transactions,
        http::wallet::purchase_premium,
        http::health::ready,
        http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        TestKind,
        TestResult,
        Transaction,
        TransactionKind,
        TransactionStatus,
        LeaderboardEntry,
        KindCounts,
        BestScores,
        UserSummary,
        GlobalSummary,
        ProgressPoint,
        BalanceView,
        PaymentInitiation,
        PaymentVerification,
        http::users::RegisterRequestBody,
        http::users::LoginRequestBody,
        http::users::AccountResponseBody,
        http::cognitive_tests::SubmitTestRequestBody,
        http::wallet::CreatePaymentRequestBody,
    )),
    tags(
        (name = "accounts", description = "Registration and sessions"),
        (name = "tests", description = "Cognitive test submission and history"),
        (name = "stats", description = "Leaderboard and aggregate statistics"),
        (name = "wallet", description = "Deposits, verification, and premium"),
        (name = "health", description = "Orchestration probes"),
    )
)]
pub struct ApiDoc;
