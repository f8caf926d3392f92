use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use compute::performance::month_bounds;
use model::entities::{profile, sales_target};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for upserting a sales target
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpsertTargetRequest {
    /// Agent the target applies to
    pub agent_id: i32,
    /// Period type: "weekly", "monthly", "quarterly" or "yearly" (default: "monthly")
    pub period_type: Option<String>,
    /// Any date inside the target period; monthly targets are normalized to
    /// the first of the month
    pub start_date: NaiveDate,
    /// End of the period; ignored for monthly targets, required otherwise
    pub end_date: Option<NaiveDate>,
    /// Target amount; must not be negative
    pub target_amount: Decimal,
}

/// Request body for setting one month's target by key
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetMonthTargetRequest {
    /// Target amount; must not be negative
    pub target_amount: Decimal,
    /// "specific" sets just this month; "future" sets this month and every
    /// remaining month of the year to the same amount (default: "specific")
    pub scope: Option<String>,
}

/// Sales target response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TargetResponse {
    pub id: i32,
    pub agent_id: i32,
    pub period_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target_amount: Decimal,
    pub created_at: NaiveDateTime,
}

impl From<sales_target::Model> for TargetResponse {
    fn from(model: sales_target::Model) -> Self {
        Self {
            id: model.id,
            agent_id: model.agent_id,
            period_type: period_str(model.period_type).to_string(),
            start_date: model.start_date,
            end_date: model.end_date,
            target_amount: model.target_amount,
            created_at: model.created_at,
        }
    }
}

fn parse_period(value: &str) -> Option<sales_target::PeriodType> {
    match value {
        "weekly" => Some(sales_target::PeriodType::Weekly),
        "monthly" => Some(sales_target::PeriodType::Monthly),
        "quarterly" => Some(sales_target::PeriodType::Quarterly),
        "yearly" => Some(sales_target::PeriodType::Yearly),
        _ => None,
    }
}

fn period_str(period: sales_target::PeriodType) -> &'static str {
    match period {
        sales_target::PeriodType::Weekly => "weekly",
        sales_target::PeriodType::Monthly => "monthly",
        sales_target::PeriodType::Quarterly => "quarterly",
        sales_target::PeriodType::Yearly => "yearly",
    }
}

/// Parses a "YYYY-MM" month key.
fn parse_month_key(key: &str) -> Option<(i32, u32)> {
    let (year_part, month_part) = key.split_once('-')?;
    let year: i32 = year_part.parse().ok()?;
    let month: u32 = month_part.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// Inserts or replaces a target row on its (agent, period, start) key and
/// reads the surviving row back.
async fn upsert_target_row(
    db: &DatabaseConnection,
    agent_id: i32,
    period_type: sales_target::PeriodType,
    start_date: NaiveDate,
    end_date: NaiveDate,
    target_amount: Decimal,
) -> Result<sales_target::Model, DbErr> {
    let active = sales_target::ActiveModel {
        agent_id: Set(agent_id),
        period_type: Set(period_type),
        start_date: Set(start_date),
        end_date: Set(end_date),
        target_amount: Set(target_amount),
        ..Default::default()
    };

    sales_target::Entity::insert(active)
        .on_conflict(
            OnConflict::columns([
                sales_target::Column::AgentId,
                sales_target::Column::PeriodType,
                sales_target::Column::StartDate,
            ])
            .update_columns([
                sales_target::Column::TargetAmount,
                sales_target::Column::EndDate,
            ])
            .to_owned(),
        )
        .exec(db)
        .await?;

    sales_target::Entity::find()
        .filter(sales_target::Column::AgentId.eq(agent_id))
        .filter(sales_target::Column::PeriodType.eq(period_type))
        .filter(sales_target::Column::StartDate.eq(start_date))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("upserted sales target".to_string()))
}

async fn ensure_agent_exists(state: &AppState, agent_id: i32) -> Result<(), StatusCode> {
    match profile::Entity::find_by_id(agent_id).one(&state.db).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            warn!("Agent with ID {} not found", agent_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to lookup agent with ID {}: {}", agent_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get an agent's sales targets, earliest first
#[utoipa::path(
    get,
    path = "/api/v1/agents/{agent_id}/targets",
    tag = "targets",
    params(
        ("agent_id" = i32, Path, description = "Agent ID"),
    ),
    responses(
        (status = 200, description = "Targets retrieved successfully", body = ApiResponse<Vec<TargetResponse>>),
        (status = 404, description = "Agent not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_agent_targets(
    Path(agent_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TargetResponse>>>, StatusCode> {
    trace!("Entering get_agent_targets function for agent_id: {}", agent_id);

    ensure_agent_exists(&state, agent_id).await?;

    match sales_target::Entity::find()
        .filter(sales_target::Column::AgentId.eq(agent_id))
        .order_by_asc(sales_target::Column::StartDate)
        .all(&state.db)
        .await
    {
        Ok(targets) => {
            debug!("Retrieved {} targets for agent {}", targets.len(), agent_id);
            let response = ApiResponse {
                data: targets.into_iter().map(TargetResponse::from).collect(),
                message: "Targets retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve targets for agent {}: {}", agent_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Upsert a sales target on its (agent, period, start) key
#[utoipa::path(
    put,
    path = "/api/v1/targets",
    tag = "targets",
    request_body = UpsertTargetRequest,
    responses(
        (status = 200, description = "Target upserted successfully", body = ApiResponse<TargetResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn upsert_target(
    State(state): State<AppState>,
    Json(request): Json<UpsertTargetRequest>,
) -> Result<Json<ApiResponse<TargetResponse>>, StatusCode> {
    trace!("Entering upsert_target function");
    debug!(
        "Upserting target of {} for agent {} starting {}",
        request.target_amount, request.agent_id, request.start_date
    );

    if request.target_amount < Decimal::ZERO {
        warn!("Rejected negative target amount: {}", request.target_amount);
        return Err(StatusCode::BAD_REQUEST);
    }

    let period_type = match request.period_type.as_deref() {
        None => sales_target::PeriodType::Monthly,
        Some(raw) => match parse_period(raw) {
            Some(period) => period,
            None => {
                warn!("Rejected unknown period type: {}", raw);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
    };

    ensure_agent_exists(&state, request.agent_id).await?;

    // Monthly targets always cover whole calendar months
    let (start_date, end_date) = if period_type == sales_target::PeriodType::Monthly {
        month_bounds(request.start_date.year(), request.start_date.month())
    } else {
        match request.end_date {
            Some(end) if end >= request.start_date => (request.start_date, end),
            Some(end) => {
                warn!("Rejected target ending {} before start {}", end, request.start_date);
                return Err(StatusCode::BAD_REQUEST);
            }
            None => {
                warn!("Rejected non-monthly target without end date");
                return Err(StatusCode::BAD_REQUEST);
            }
        }
    };

    match upsert_target_row(
        &state.db,
        request.agent_id,
        period_type,
        start_date,
        end_date,
        request.target_amount,
    )
    .await
    {
        Ok(target) => {
            info!(
                "Target upserted for agent {} starting {}",
                request.agent_id, start_date
            );
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: TargetResponse::from(target),
                message: "Target upserted successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!(
                "Failed to upsert target for agent {}: {}",
                request.agent_id, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Set an agent's monthly target by "YYYY-MM" key, optionally for every
/// remaining month of the year
#[utoipa::path(
    put,
    path = "/api/v1/agents/{agent_id}/targets/{month_key}",
    tag = "targets",
    params(
        ("agent_id" = i32, Path, description = "Agent ID"),
        ("month_key" = String, Path, description = "Month key in YYYY-MM form"),
    ),
    request_body = SetMonthTargetRequest,
    responses(
        (status = 200, description = "Targets set successfully", body = ApiResponse<Vec<TargetResponse>>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn set_month_target(
    Path((agent_id, month_key)): Path<(i32, String)>,
    State(state): State<AppState>,
    Json(request): Json<SetMonthTargetRequest>,
) -> Result<Json<ApiResponse<Vec<TargetResponse>>>, StatusCode> {
    trace!(
        "Entering set_month_target function for agent_id: {}, month_key: {}",
        agent_id,
        month_key
    );

    if request.target_amount < Decimal::ZERO {
        warn!("Rejected negative target amount: {}", request.target_amount);
        return Err(StatusCode::BAD_REQUEST);
    }

    let (year, month) = match parse_month_key(&month_key) {
        Some(parsed) => parsed,
        None => {
            warn!("Rejected malformed month key: {}", month_key);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let future = match request.scope.as_deref() {
        None | Some("specific") => false,
        Some("future") => true,
        Some(raw) => {
            warn!("Rejected unknown target scope: {}", raw);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    ensure_agent_exists(&state, agent_id).await?;

    let months: Vec<u32> = if future { (month..=12).collect() } else { vec![month] };

    let mut written = Vec::with_capacity(months.len());
    for m in months {
        let (start_date, end_date) = month_bounds(year, m);
        match upsert_target_row(
            &state.db,
            agent_id,
            sales_target::PeriodType::Monthly,
            start_date,
            end_date,
            request.target_amount,
        )
        .await
        {
            Ok(target) => written.push(TargetResponse::from(target)),
            Err(db_error) => {
                error!(
                    "Failed to set target for agent {} in {}-{:02}: {}",
                    agent_id, year, m, db_error
                );
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    info!(
        "Set {} monthly target(s) for agent {} from {}",
        written.len(),
        agent_id,
        month_key
    );
    state.cache.invalidate_all();
    let response = ApiResponse {
        data: written,
        message: "Targets set successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
