use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse, YearQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{Datelike, Utc};
use common::{FullPerformance, LeaderboardEntry, MonthlyBreakdown};
use compute::leaderboard;
use compute::performance::{self, AgentSelector};
use tracing::{debug, error, info, instrument, trace, warn};

/// Get MTD/QTD/YTD performance for one agent or the whole company
#[utoipa::path(
    get,
    path = "/api/v1/performance/{agent}",
    tag = "performance",
    params(
        ("agent" = String, Path, description = "Agent ID, or \"all\" for the whole company"),
    ),
    responses(
        (status = 200, description = "Performance retrieved successfully", body = ApiResponse<FullPerformance>),
        (status = 400, description = "Invalid agent selector", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_performance(
    Path(agent): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FullPerformance>>, StatusCode> {
    trace!("Entering get_performance function for agent: {}", agent);

    let selector: AgentSelector = match agent.parse() {
        Ok(selector) => selector,
        Err(_) => {
            warn!("Rejected malformed agent selector: {}", agent);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let cache_key = format!("performance_{}", agent);
    if let Some(CachedData::Performance(perf)) = state.cache.get(&cache_key).await {
        debug!("Performance served from cache for {:?}", selector);
        return Ok(Json(ApiResponse {
            data: perf,
            message: "Performance retrieved from cache".to_string(),
            success: true,
        }));
    }

    let today = Utc::now().date_naive();
    match performance::full_performance(&state.db, selector, today).await {
        Ok(perf) => {
            state
                .cache
                .insert(cache_key, CachedData::Performance(perf.clone()))
                .await;
            info!("Performance computed for {:?}", selector);
            Ok(Json(ApiResponse {
                data: perf,
                message: "Performance retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(compute_error) => {
            error!("Failed to compute performance for {:?}: {}", selector, compute_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get the team leaderboard for the current month
#[utoipa::path(
    get,
    path = "/api/v1/performance/leaderboard",
    tag = "performance",
    responses(
        (status = 200, description = "Leaderboard retrieved successfully", body = ApiResponse<Vec<LeaderboardEntry>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, StatusCode> {
    trace!("Entering get_leaderboard function");

    let cache_key = "leaderboard".to_string();
    if let Some(CachedData::Leaderboard(entries)) = state.cache.get(&cache_key).await {
        debug!("Leaderboard served from cache");
        return Ok(Json(ApiResponse {
            data: entries,
            message: "Leaderboard retrieved from cache".to_string(),
            success: true,
        }));
    }

    let today = Utc::now().date_naive();
    match leaderboard::team_leaderboard(&state.db, today).await {
        Ok(entries) => {
            state
                .cache
                .insert(cache_key, CachedData::Leaderboard(entries.clone()))
                .await;
            info!("Leaderboard computed with {} entries", entries.len());
            Ok(Json(ApiResponse {
                data: entries,
                message: "Leaderboard retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(compute_error) => {
            error!("Failed to compute leaderboard: {}", compute_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get one agent's month-by-month breakdown for a year
#[utoipa::path(
    get,
    path = "/api/v1/performance/{agent}/breakdown",
    tag = "performance",
    params(
        ("agent" = i32, Path, description = "Agent ID"),
        ("year" = Option<i32>, Query, description = "Calendar year (defaults to the current year)"),
    ),
    responses(
        (status = 200, description = "Breakdown retrieved successfully", body = ApiResponse<Vec<MonthlyBreakdown>>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_breakdown(
    Path(agent): Path<String>,
    Valid(Query(query)): Valid<Query<YearQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MonthlyBreakdown>>>, StatusCode> {
    trace!("Entering get_breakdown function for agent: {}", agent);

    // The breakdown is always per-agent; "all" is not a valid selector here
    let agent_id: i32 = match agent.parse() {
        Ok(id) => id,
        Err(_) => {
            warn!("Rejected non-numeric agent ID for breakdown: {}", agent);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    match performance::yearly_breakdown(&state.db, agent_id, year).await {
        Ok(rows) => {
            info!("Breakdown computed for agent {} in {}", agent_id, year);
            Ok(Json(ApiResponse {
                data: rows,
                message: "Breakdown retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(compute_error) => {
            error!(
                "Failed to compute breakdown for agent {} in {}: {}",
                agent_id, year, compute_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
