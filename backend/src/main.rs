//! Backend entry-point: wires REST endpoints, persistence, and OpenAPI docs.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite};
use actix_web::{App, HttpServer, web};
use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use backend::domain::{AccountService, StatsService, TestService, WalletService};
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::{cognitive_tests, stats, users, wallet};
use backend::outbound::payments::{HttpPaymentGateway, PaymentGatewaySettings};
use backend::outbound::persistence::{
    DbPool, DieselTestResultRepository, DieselTransactionRepository, DieselUserRepository,
    PoolConfig,
};
#[cfg(debug_assertions)]
use backend::ApiDoc;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const DEFAULT_PAYMENT_API_URL: &str = "https://api.click.uz/v2/merchant";
const DEFAULT_PAYMENT_TIMEOUT_SECS: u64 = 30;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| std::io::Error::other("DATABASE_URL must be set"))?;

    run_migrations(&database_url)?;

    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .map_err(std::io::Error::other)?;

    let key = load_session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);

    let gateway = HttpPaymentGateway::new(load_gateway_settings()?)
        .map_err(|e| std::io::Error::other(format!("payment gateway client: {e}")))?;

    let state = build_state(pool, gateway);
    let state_data = web::Data::new(state);

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let health_state = web::Data::new(HealthState::new());
    // Clone for server factory so readiness probe remains accessible.
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".into())
            .cookie_path("/".into())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .build();

        let api = web::scope("/api/v1")
            .wrap(session)
            .service(users::register)
            .service(users::login)
            .service(users::logout)
            .service(cognitive_tests::submit_test)
            .service(cognitive_tests::test_history)
            .service(cognitive_tests::best_score)
            .service(cognitive_tests::verbal_words)
            .service(stats::leaderboard)
            .service(stats::my_stats)
            .service(stats::my_progress)
            .service(stats::global_stats)
            .service(wallet::create_payment)
            .service(wallet::verify_payment)
            .service(wallet::balance)
            .service(wallet::transactions)
            .service(wallet::purchase_premium);

        let app = App::new()
            .app_data(state_data.clone())
            .app_data(server_health_state.clone())
            .service(api)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

        app
    })
    .bind(bind_addr)?;

    health_state.mark_ready();
    server.run().await
}

fn run_migrations(database_url: &str) -> std::io::Result<()> {
    let mut conn = diesel::PgConnection::establish(database_url)
        .map_err(|e| std::io::Error::other(format!("database connection: {e}")))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| std::io::Error::other(format!("migrations: {e}")))?;
    Ok(())
}

fn load_session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

fn load_gateway_settings() -> std::io::Result<PaymentGatewaySettings> {
    let base_url = env::var("PAYMENT_API_URL")
        .unwrap_or_else(|_| DEFAULT_PAYMENT_API_URL.into())
        .parse()
        .map_err(|e| std::io::Error::other(format!("PAYMENT_API_URL: {e}")))?;
    let timeout = env::var("PAYMENT_TIMEOUT_SECS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_PAYMENT_TIMEOUT_SECS);

    let merchant_id = gateway_credential("PAYMENT_MERCHANT_ID")?;
    let service_id = gateway_credential("PAYMENT_SERVICE_ID")?;
    let secret = gateway_credential("PAYMENT_SECRET_KEY")?;

    Ok(PaymentGatewaySettings {
        base_url,
        merchant_id,
        service_id,
        secret,
        timeout: Duration::from_secs(timeout),
    })
}

fn gateway_credential(name: &str) -> std::io::Result<String> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(_) if cfg!(debug_assertions) => {
            warn!(variable = name, "gateway credential missing, using empty value (dev only)");
            Ok(String::new())
        }
        Err(_) => Err(std::io::Error::other(format!("{name} must be set"))),
    }
}

fn build_state(pool: DbPool, gateway: HttpPaymentGateway) -> HttpState {
    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let results = Arc::new(DieselTestResultRepository::new(pool.clone()));
    let transactions = Arc::new(DieselTransactionRepository::new(pool));
    let gateway = Arc::new(gateway);

    let accounts = Arc::new(AccountService::new(users.clone()));
    let tests = Arc::new(TestService::new(results.clone(), users.clone()));
    let stats = Arc::new(StatsService::new(results, users.clone()));
    let wallet = Arc::new(WalletService::new(users, transactions, gateway));

    HttpState {
        accounts: accounts.clone(),
        login: accounts,
        tests: tests.clone(),
        test_queries: tests,
        stats,
        wallet: wallet.clone(),
        wallet_queries: wallet,
    }
}

