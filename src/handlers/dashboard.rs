use crate::schemas::{ApiResponse, AppState, CachedData, DashboardQuery, ErrorResponse, YearQuery};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{Datelike, NaiveDate, Utc};
use common::{DashboardStats, DateWindow, OutstandingClient, RevenuePoint};
use compute::dashboard;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// How many rows the activity feed shows per section.
const ACTIVITY_LIMIT: u64 = 5;

/// One recently onboarded client in the activity feed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentClient {
    pub id: i32,
    pub name: String,
    pub company: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

/// One recent payment in the activity feed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentPayment {
    pub id: i32,
    pub project_id: i32,
    pub project_name: String,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
}

/// Recent registrations and payments for the dashboard activity feed
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivityResponse {
    pub recent_clients: Vec<RecentClient>,
    pub recent_payments: Vec<RecentPayment>,
}

/// Get the dashboard's top-line figures
///
/// A failed aggregation degrades to all-zero figures instead of an error so
/// the landing page always renders.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "dashboard",
    params(
        ("window" = Option<DateWindow>, Query, description = "Date window to aggregate over"),
    ),
    responses(
        (status = 200, description = "Dashboard stats retrieved successfully", body = ApiResponse<DashboardStats>),
    )
)]
#[instrument(skip(state))]
pub async fn get_dashboard_stats(
    Query(query): Query<DashboardQuery>,
    State(state): State<AppState>,
) -> Json<ApiResponse<DashboardStats>> {
    trace!("Entering get_dashboard_stats function");
    let window = query.window.unwrap_or_default();

    let cache_key = format!("dashboard_{:?}", window);
    if let Some(CachedData::Dashboard(stats)) = state.cache.get(&cache_key).await {
        debug!("Dashboard stats served from cache for window {:?}", window);
        return Json(ApiResponse {
            data: stats,
            message: "Dashboard stats retrieved from cache".to_string(),
            success: true,
        });
    }

    let today = Utc::now().date_naive();
    let stats = match dashboard::dashboard_stats(&state.db, window, today).await {
        Ok(stats) => {
            state
                .cache
                .insert(cache_key, CachedData::Dashboard(stats.clone()))
                .await;
            stats
        }
        Err(compute_error) => {
            // Degrade to zeroed figures; the dashboard must always render
            warn!(
                "Dashboard aggregation failed, serving zeroed stats: {}",
                compute_error
            );
            DashboardStats::default()
        }
    };

    info!("Dashboard stats computed for window {:?}", window);
    Json(ApiResponse {
        data: stats,
        message: "Dashboard stats retrieved successfully".to_string(),
        success: true,
    })
}

/// Get the monthly revenue chart for one year
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/revenue-chart",
    tag = "dashboard",
    params(
        ("year" = Option<i32>, Query, description = "Calendar year (defaults to the current year)"),
    ),
    responses(
        (status = 200, description = "Revenue chart retrieved successfully", body = ApiResponse<Vec<RevenuePoint>>),
        (status = 400, description = "Invalid year", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_revenue_chart(
    Valid(Query(query)): Valid<Query<YearQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RevenuePoint>>>, StatusCode> {
    trace!("Entering get_revenue_chart function");
    let year = query.year.unwrap_or_else(|| Utc::now().year());

    let cache_key = format!("chart_{}", year);
    if let Some(CachedData::Chart(points)) = state.cache.get(&cache_key).await {
        debug!("Revenue chart served from cache for year {}", year);
        return Ok(Json(ApiResponse {
            data: points,
            message: "Revenue chart retrieved from cache".to_string(),
            success: true,
        }));
    }

    match dashboard::revenue_chart_for_year(&state.db, year).await {
        Ok(points) => {
            state
                .cache
                .insert(cache_key, CachedData::Chart(points.clone()))
                .await;
            info!("Revenue chart computed for year {}", year);
            Ok(Json(ApiResponse {
                data: points,
                message: "Revenue chart retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(compute_error) => {
            error!("Failed to compute revenue chart for {}: {}", year, compute_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get per-client outstanding balances over active projects, largest first
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/outstanding",
    tag = "dashboard",
    responses(
        (status = 200, description = "Outstanding balances retrieved successfully", body = ApiResponse<Vec<OutstandingClient>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_outstanding(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<OutstandingClient>>>, StatusCode> {
    trace!("Entering get_outstanding function");

    let cache_key = "outstanding".to_string();
    if let Some(CachedData::Outstanding(rows)) = state.cache.get(&cache_key).await {
        debug!("Outstanding balances served from cache");
        return Ok(Json(ApiResponse {
            data: rows,
            message: "Outstanding balances retrieved from cache".to_string(),
            success: true,
        }));
    }

    match dashboard::outstanding_by_client(&state.db).await {
        Ok(rows) => {
            state
                .cache
                .insert(cache_key, CachedData::Outstanding(rows.clone()))
                .await;
            info!("Outstanding balances computed for {} clients", rows.len());
            Ok(Json(ApiResponse {
                data: rows,
                message: "Outstanding balances retrieved successfully".to_string(),
                success: true,
            }))
        }
        Err(compute_error) => {
            error!("Failed to compute outstanding balances: {}", compute_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get the dashboard activity feed
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/activity",
    tag = "dashboard",
    responses(
        (status = 200, description = "Activity feed retrieved successfully", body = ApiResponse<ActivityResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_activity(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ActivityResponse>>, StatusCode> {
    trace!("Entering get_activity function");

    let clients = match dashboard::latest_registrations(&state.db, ACTIVITY_LIMIT).await {
        Ok(clients) => clients,
        Err(compute_error) => {
            error!("Failed to retrieve recent registrations: {}", compute_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let payments = match dashboard::latest_payments(&state.db, ACTIVITY_LIMIT).await {
        Ok(payments) => payments,
        Err(compute_error) => {
            error!("Failed to retrieve recent payments: {}", compute_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let response = ActivityResponse {
        recent_clients: clients
            .into_iter()
            .map(|c| RecentClient {
                id: c.id,
                name: c.name,
                company: c.company,
                created_at: c.created_at,
            })
            .collect(),
        recent_payments: payments
            .into_iter()
            .map(|(pay, proj)| RecentPayment {
                id: pay.id,
                project_id: pay.project_id,
                project_name: proj.map(|p| p.name).unwrap_or_else(|| "Unknown".to_string()),
                amount: pay.amount,
                payment_date: pay.payment_date,
            })
            .collect(),
    };

    info!(
        "Activity feed retrieved: {} clients, {} payments",
        response.recent_clients.len(),
        response.recent_payments.len()
    );
    Ok(Json(ApiResponse {
        data: response,
        message: "Activity feed retrieved successfully".to_string(),
        success: true,
    }))
}
