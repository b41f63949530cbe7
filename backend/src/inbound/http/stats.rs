//! Statistics API handlers.
//!
//! ```text
//! GET /api/v1/stats/leaderboard?kind=reaction_time&limit=25
//! GET /api/v1/stats/me
//! GET /api/v1/stats/progress?days=30
//! GET /api/v1/stats/global
//! ```

use std::str::FromStr;

use actix_web::{get, web};
use serde::Deserialize;
use serde_json::json;

use crate::domain::stats_service::{DEFAULT_LEADERBOARD_LIMIT, DEFAULT_PROGRESS_DAYS};
use crate::domain::{Error, TestKind};
use crate::domain::ports::{GlobalSummary, LeaderboardEntry, ProgressPoint, UserSummary};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Query parameters for the leaderboard endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    /// Optional kind filter.
    pub kind: Option<String>,
    /// Maximum rows; defaults to 100.
    pub limit: Option<i64>,
}

/// Query parameters for the progress endpoint.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    /// Trailing window in days; defaults to 30.
    pub days: Option<i64>,
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

/// Ranked users by max score; public.
#[utoipa::path(
    get,
    path = "/api/v1/stats/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Leaderboard", body = [LeaderboardEntry]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["stats"],
    operation_id = "leaderboard",
    security([])
)]
#[get("/stats/leaderboard")]
pub async fn leaderboard(
    state: web::Data<HttpState>,
    query: web::Query<LeaderboardQuery>,
) -> ApiResult<web::Json<Vec<LeaderboardEntry>>> {
    let query = query.into_inner();
    let kind = query.kind.map(|raw| parse_kind(&raw)).transpose()?;
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);

    let entries = state.stats.leaderboard(kind, limit).await?;
    Ok(web::Json(entries))
}

/// The caller's statistics summary.
#[utoipa::path(
    get,
    path = "/api/v1/stats/me",
    responses(
        (status = 200, description = "Summary", body = UserSummary),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["stats"],
    operation_id = "myStats"
)]
#[get("/stats/me")]
pub async fn my_stats(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserSummary>> {
    let user_id = session.require_user_id()?;
    let summary = state.stats.user_summary(&user_id).await?;
    Ok(web::Json(summary))
}

/// The caller's day-bucketed progress series.
#[utoipa::path(
    get,
    path = "/api/v1/stats/progress",
    params(ProgressQuery),
    responses(
        (status = 200, description = "Progress series", body = [ProgressPoint]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["stats"],
    operation_id = "myProgress"
)]
#[get("/stats/progress")]
pub async fn my_progress(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ProgressQuery>,
) -> ApiResult<web::Json<Vec<ProgressPoint>>> {
    let user_id = session.require_user_id()?;
    let days = query.into_inner().days.unwrap_or(DEFAULT_PROGRESS_DAYS);

    let points = state.stats.progress(&user_id, days).await?;
    Ok(web::Json(points))
}

/// Site-wide statistics; public.
#[utoipa::path(
    get,
    path = "/api/v1/stats/global",
    responses(
        (status = 200, description = "Global summary", body = GlobalSummary),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["stats"],
    operation_id = "globalStats",
    security([])
)]
#[get("/stats/global")]
pub async fn global_stats(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<GlobalSummary>> {
    let summary = state.stats.global_summary().await?;
    Ok(web::Json(summary))
}
