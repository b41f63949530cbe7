//! Cognitive test API handlers.
//!
//! ```text
//! POST /api/v1/tests/submit {"kind":"reaction_time","score":342.0,"reactionTimeMs":342}
//! GET /api/v1/tests/history?kind=sequence_memory
//! GET /api/v1/tests/best-score?kind=reaction_time
//! GET /api/v1/tests/verbal-words?count=10
//! ```

use std::str::FromStr;

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::word_bank::{self, DEFAULT_WORD_COUNT};
use crate::domain::{Error, TestKind, TestResult, TestResultDraft, TestSubmissionError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Submission body for `POST /api/v1/tests/submit`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestRequestBody {
    /// One of `reaction_time`, `sequence_memory`, `verbal_memory`.
    pub kind: String,
    pub score: f64,
    pub reaction_time_ms: Option<i32>,
    pub level: Option<i32>,
    pub correct_answers: Option<i32>,
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Value>,
}

/// Query parameters for the history endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Optional kind filter.
    pub kind: Option<String>,
}

/// Query parameters for the best-score endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BestScoreQuery {
    pub kind: String,
}

/// Query parameters for the verbal-words endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct VerbalWordsQuery {
    /// Number of words to draw; defaults to 10.
    pub count: Option<usize>,
}

fn parse_kind(raw: &str) -> Result<TestKind, Error> {
    TestKind::from_str(raw).map_err(|_| {
        Error::invalid_request("kind must be reaction_time, sequence_memory, or verbal_memory")
            .with_details(json!({
                "field": "kind",
                "value": raw,
                "code": "invalid_test_kind",
            }))
    })
}

fn map_submission_error(error: TestSubmissionError) -> Error {
    match error {
        TestSubmissionError::InvalidScore => Error::invalid_request(error.to_string())
            .with_details(json!({ "field": "score", "code": "invalid_score" })),
        TestSubmissionError::NegativeField { field } => Error::invalid_request(error.to_string())
            .with_details(json!({ "field": field, "code": "negative_value" })),
    }
}

/// Record a finished test and return the stored result.
#[utoipa::path(
    post,
    path = "/api/v1/tests/submit",
    request_body = SubmitTestRequestBody,
    responses(
        (status = 200, description = "Stored result", body = TestResult),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tests"],
    operation_id = "submitTest"
)]
#[post("/tests/submit")]
pub async fn submit_test(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SubmitTestRequestBody>,
) -> ApiResult<web::Json<TestResult>> {
    let user_id = session.require_user_id()?;
    let payload = payload.into_inner();

    let kind = parse_kind(&payload.kind)?;
    let draft = TestResultDraft::new(
        kind,
        payload.score,
        payload.reaction_time_ms,
        payload.level,
        payload.correct_answers,
        payload.metadata,
    )
    .map_err(map_submission_error)?;

    let stored = state.tests.submit(&user_id, draft).await?;
    Ok(web::Json(stored))
}

/// The caller's test history, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/tests/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Results", body = [TestResult]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tests"],
    operation_id = "testHistory"
)]
#[get("/tests/history")]
pub async fn test_history(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<HistoryQuery>,
) -> ApiResult<web::Json<Vec<TestResult>>> {
    let user_id = session.require_user_id()?;
    let kind = query
        .into_inner()
        .kind
        .map(|raw| parse_kind(&raw))
        .transpose()?;

    let results = state.test_queries.history(&user_id, kind).await?;
    Ok(web::Json(results))
}

/// The caller's best result of one kind.
#[utoipa::path(
    get,
    path = "/api/v1/tests/best-score",
    params(BestScoreQuery),
    responses(
        (status = 200, description = "Best result, or null when none exists", body = TestResult),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tests"],
    operation_id = "bestScore"
)]
#[get("/tests/best-score")]
pub async fn best_score(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<BestScoreQuery>,
) -> ApiResult<web::Json<Option<TestResult>>> {
    let user_id = session.require_user_id()?;
    let kind = parse_kind(&query.kind)?;

    let best = state.test_queries.best_score(&user_id, kind).await?;
    Ok(web::Json(best))
}

/// Draw a shuffled word list for a verbal-memory round.
#[utoipa::path(
    get,
    path = "/api/v1/tests/verbal-words",
    params(VerbalWordsQuery),
    responses(
        (status = 200, description = "Words", body = [String])
    ),
    tags = ["tests"],
    operation_id = "verbalWords",
    security([])
)]
#[get("/tests/verbal-words")]
pub async fn verbal_words(query: web::Query<VerbalWordsQuery>) -> HttpResponse {
    let count = query.count.unwrap_or(DEFAULT_WORD_COUNT);
    let words = word_bank::sample_words(count, &mut rand::thread_rng());
    HttpResponse::Ok().json(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::domain::ports::{
        MockAccountCommand, MockLoginService, MockStatsQuery, MockTestCommand, MockTestQuery,
        MockWalletCommand, MockWalletQuery,
    };
    use actix_web::{App, test as actix_test, web};
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::Arc;
    use uuid::Uuid;

    const FIXTURE_USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    fn fixture_result(kind: TestKind, score: f64) -> TestResult {
        TestResult {
            id: Uuid::new_v4(),
            user_id: UserId::new(FIXTURE_USER_ID).expect("fixture id"),
            kind,
            score,
            reaction_time_ms: None,
            level: None,
            correct_answers: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    fn state(tests: MockTestCommand, test_queries: MockTestQuery) -> HttpState {
        HttpState {
            accounts: Arc::new(MockAccountCommand::new()),
            login: Arc::new(MockLoginService::new()),
            tests: Arc::new(tests),
            test_queries: Arc::new(test_queries),
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
            .route(
                "/auth",
                web::get().to(|session: SessionContext| async move {
                    let id = UserId::new(FIXTURE_USER_ID).expect("fixture id");
                    session.persist_user(&id)?;
                    Ok::<_, crate::domain::Error>(HttpResponse::Ok())
                }),
            )
            .service(
                web::scope("/api/v1")
                    .service(submit_test)
                    .service(test_history)
                    .service(best_score)
                    .service(verbal_words),
            )
    }

    async fn session_cookie<S>(app: &S) -> actix_web::cookie::Cookie<'static>
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let response =
            actix_test::call_service(app, actix_test::TestRequest::get().uri("/auth").to_request())
                .await;
        response
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    #[actix_web::test]
    async fn submit_returns_the_stored_result() {
        let mut tests = MockTestCommand::new();
        tests
            .expect_submit()
            .withf(|_, draft| draft.kind == TestKind::ReactionTime && draft.score == 342.0)
            .times(1)
            .return_once(|_, draft| Ok(fixture_result(draft.kind, draft.score)));

        let app = actix_test::init_service(test_app(state(tests, MockTestQuery::new()))).await;
        let cookie = session_cookie(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/tests/submit")
                .cookie(cookie)
                .set_json(serde_json::json!({
                    "kind": "reaction_time",
                    "score": 342.0,
                    "reactionTimeMs": 342,
                }))
                .to_request(),
        )
        .await;

        assert!(response.status().is_success());
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body["kind"], "reaction_time");
        assert_eq!(body["score"], 342.0);
    }

    #[actix_web::test]
    async fn submit_rejects_unknown_kinds() {
        let mut tests = MockTestCommand::new();
        tests.expect_submit().times(0);

        let app = actix_test::init_service(test_app(state(tests, MockTestQuery::new()))).await;
        let cookie = session_cookie(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/tests/submit")
                .cookie(cookie)
                .set_json(serde_json::json!({ "kind": "number_memory", "score": 5.0 }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body["details"]["code"], "invalid_test_kind");
    }

    #[actix_web::test]
    async fn submit_requires_a_session() {
        let app = actix_test::init_service(test_app(state(
            MockTestCommand::new(),
            MockTestQuery::new(),
        )))
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/tests/submit")
                .set_json(serde_json::json!({ "kind": "reaction_time", "score": 300.0 }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn history_passes_the_kind_filter_through() {
        let mut queries = MockTestQuery::new();
        queries
            .expect_history()
            .withf(|_, kind| *kind == Some(TestKind::SequenceMemory))
            .times(1)
            .return_once(|_, _| Ok(vec![fixture_result(TestKind::SequenceMemory, 8.0)]));

        let app = actix_test::init_service(test_app(state(MockTestCommand::new(), queries))).await;
        let cookie = session_cookie(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/tests/history?kind=sequence_memory")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert!(response.status().is_success());
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body.as_array().expect("array").len(), 1);
    }

    #[actix_web::test]
    async fn best_score_returns_null_when_absent() {
        let mut queries = MockTestQuery::new();
        queries
            .expect_best_score()
            .times(1)
            .return_once(|_, _| Ok(None));

        let app = actix_test::init_service(test_app(state(MockTestCommand::new(), queries))).await;
        let cookie = session_cookie(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/tests/best-score?kind=verbal_memory")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert!(response.status().is_success());
        let body = actix_test::read_body(response).await;
        assert_eq!(body, "null");
    }

    #[actix_web::test]
    async fn verbal_words_is_public_and_respects_count() {
        let app = actix_test::init_service(test_app(state(
            MockTestCommand::new(),
            MockTestQuery::new(),
        )))
        .await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/tests/verbal-words?count=5")
                .to_request(),
        )
        .await;

        assert!(response.status().is_success());
        let body: Value =
            serde_json::from_slice(&actix_test::read_body(response).await).expect("json body");
        assert_eq!(body.as_array().expect("array").len(), 5);
    }
}
