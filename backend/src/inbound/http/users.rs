//! Account API handlers.
//!
//! ```text
//! POST /api/v1/register {"email":"ada@example.com","password":"password123"}
//! POST /api/v1/login {"email":"ada@example.com","password":"password123"}
//! POST /api/v1/logout
//! ```

use actix_web::{HttpResponse, post, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::Registration;
use crate::domain::{Email, Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration request body for `POST /api/v1/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestBody {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestBody {
    pub email: String,
    pub password: String,
}

/// Client-facing account view; never carries the credential hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponseBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    #[schema(value_type = String, example = "0")]
    pub balance: Decimal,
    pub is_premium: bool,
    pub brain_age: Option<f64>,
}

impl From<User> for AccountResponseBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.to_string(),
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            balance: user.balance,
            is_premium: user.is_premium,
            brain_age: user.brain_age,
        }
    }
}

fn parse_email(raw: String) -> Result<Email, Error> {
    Email::new(raw).map_err(|error| {
        Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "email", "code": "malformed_email" }))
    })
}

/// Create an account and establish a session for it.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequestBody,
    responses(
        (status = 201, description = "Account created", body = AccountResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequestBody>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let email = parse_email(payload.email)?;

    let user = state
        .accounts
        .register(Registration {
            email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            username: payload.username,
        })
        .await?;

    session.persist_user(&user.id)?;
    Ok(HttpResponse::Created().json(AccountResponseBody::from(user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequestBody,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequestBody>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let user_id = state.login.login(&payload.email, &payload.password).await?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// Drop the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockAccountCommand, MockLoginService, MockStatsQuery, MockTestCommand, MockTestQuery,
        MockWalletCommand, MockWalletQuery,
    };
    use crate::domain::UserId;
    use actix_web::{App, test as actix_test, web};
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::Arc;

    fn fixture_user() -> User {
        User {
            id: UserId::random(),
            email: Email::new("ada@example.com").expect("valid email"),
            password_hash: "$argon2id$fixture".to_owned(),
            first_name: Some("Ada".to_owned()),
            last_name: None,
            username: Some("ada".to_owned()),
            balance: Decimal::ZERO,
            is_premium: false,
            brain_age: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn state(accounts: MockAccountCommand, login_service: MockLoginService) -> HttpState {
        HttpState {
            accounts: Arc::new(accounts),
            login: Arc::new(login_service),
            tests: Arc::new(MockTestCommand::new()),
            test_queries: Arc::new(MockTestQuery::new()),
            stats: Arc::new(MockStatsQuery::new()),
            wallet: Arc::new(MockWalletCommand::new()),
            wallet_queries: Arc::new(MockWalletQuery::new()),
        }
    }

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(register)
                    .service(login)
                    .service(logout),
            )
    }

    #[actix_web::test]
    async fn register_returns_the_created_account_without_the_hash() {
        let mut accounts = MockAccountCommand::new();
        accounts
            .expect_register()
            .times(1)
            .return_once(|_| Ok(fixture_user()));

        let app = actix_test::init_service(test_app(state(accounts, MockLoginService::new()))).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/register")
                .set_json(RegisterRequestBody {
                    email: "ada@example.com".to_owned(),
                    password: "password123".to_owned(),
                    first_name: Some("Ada".to_owned()),
                    last_name: None,
                    username: Some("ada".to_owned()),
                })
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), actix_web::http::StatusCode::CREATED);
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["isPremium"], false);
        assert!(body.get("passwordHash").is_none());
    }

    #[actix_web::test]
    async fn register_rejects_malformed_emails_before_the_service() {
        let mut accounts = MockAccountCommand::new();
        accounts.expect_register().times(0);

        let app = actix_test::init_service(test_app(state(accounts, MockLoginService::new()))).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/register")
                .set_json(RegisterRequestBody {
                    email: "not-an-email".to_owned(),
                    password: "password123".to_owned(),
                    first_name: None,
                    last_name: None,
                    username: None,
                })
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["field"], "email");
    }

    #[actix_web::test]
    async fn login_sets_a_session_cookie() {
        let user_id = UserId::random();
        let mut login_service = MockLoginService::new();
        login_service
            .expect_login()
            .times(1)
            .return_once(move |_, _| Ok(user_id));

        let app =
            actix_test::init_service(test_app(state(MockAccountCommand::new(), login_service)))
                .await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(LoginRequestBody {
                    email: "ada@example.com".to_owned(),
                    password: "password123".to_owned(),
                })
                .to_request(),
        )
        .await;

        assert!(response.status().is_success());
        assert!(
            response
                .response()
                .cookies()
                .any(|cookie| cookie.name() == "session")
        );
    }

    #[actix_web::test]
    async fn login_surfaces_unauthorised_credentials() {
        let mut login_service = MockLoginService::new();
        login_service
            .expect_login()
            .times(1)
            .return_once(|_, _| Err(Error::unauthorized("invalid credentials")));

        let app =
            actix_test::init_service(test_app(state(MockAccountCommand::new(), login_service)))
                .await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(LoginRequestBody {
                    email: "ada@example.com".to_owned(),
                    password: "wrong".to_owned(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }
}
