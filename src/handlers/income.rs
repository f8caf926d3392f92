use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::NaiveDate;
use model::entities::{bank_account, client, income_category, payment, profile, project};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// One row of the income ledger with every related name resolved
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IncomeRowResponse {
    pub payment_id: i32,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub project_id: i32,
    pub project_name: String,
    pub client_id: Option<i32>,
    pub client_name: Option<String>,
    pub agent_name: Option<String>,
    pub bank_account_name: Option<String>,
    pub category_name: Option<String>,
    pub note: Option<String>,
}

/// Request body for creating an income source lookup row
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateLookupRequest {
    /// Display name; must be unique
    pub name: String,
}

/// Lookup row response (bank account or income category)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LookupResponse {
    pub id: i32,
    pub name: String,
}

/// Get the income ledger: every payment with project, client, agent,
/// bank account and category names resolved, newest first
#[utoipa::path(
    get,
    path = "/api/v1/income",
    tag = "income",
    responses(
        (status = 200, description = "Income rows retrieved successfully", body = ApiResponse<Vec<IncomeRowResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_income(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<IncomeRowResponse>>>, StatusCode> {
    trace!("Entering get_income function");

    let payments = match payment::Entity::find()
        .find_also_related(project::Entity)
        .order_by_desc(payment::Column::PaymentDate)
        .all(&state.db)
        .await
    {
        Ok(rows) => rows,
        Err(db_error) => {
            error!("Failed to retrieve payments for income ledger: {}", db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // Name lookups resolved once for the whole ledger
    let client_names: HashMap<i32, String> = match client::Entity::find().all(&state.db).await {
        Ok(clients) => clients.into_iter().map(|c| (c.id, c.name)).collect(),
        Err(db_error) => {
            error!("Failed to retrieve client names: {}", db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let agent_names: HashMap<i32, Option<String>> =
        match profile::Entity::find().all(&state.db).await {
            Ok(profiles) => profiles.into_iter().map(|p| (p.id, p.full_name)).collect(),
            Err(db_error) => {
                error!("Failed to retrieve agent names: {}", db_error);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };
    let bank_names: HashMap<i32, String> = match bank_account::Entity::find().all(&state.db).await {
        Ok(rows) => rows.into_iter().map(|b| (b.id, b.name)).collect(),
        Err(db_error) => {
            error!("Failed to retrieve bank account names: {}", db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let category_names: HashMap<i32, String> =
        match income_category::Entity::find().all(&state.db).await {
            Ok(rows) => rows.into_iter().map(|c| (c.id, c.name)).collect(),
            Err(db_error) => {
                error!("Failed to retrieve income category names: {}", db_error);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

    let rows: Vec<IncomeRowResponse> = payments
        .into_iter()
        .map(|(pay, proj)| {
            let client_id = proj.as_ref().map(|p| p.client_id);
            let agent_name = proj
                .as_ref()
                .and_then(|p| p.agent_id)
                .and_then(|id| agent_names.get(&id).cloned())
                .flatten();
            IncomeRowResponse {
                payment_id: pay.id,
                amount: pay.amount,
                payment_date: pay.payment_date,
                payment_method: pay.payment_method,
                project_id: pay.project_id,
                project_name: proj.map(|p| p.name).unwrap_or_else(|| "Unknown".to_string()),
                client_name: client_id.and_then(|id| client_names.get(&id).cloned()),
                client_id,
                agent_name,
                bank_account_name: pay.bank_account_id.and_then(|id| bank_names.get(&id).cloned()),
                category_name: pay.category_id.and_then(|id| category_names.get(&id).cloned()),
                note: pay.note,
            }
        })
        .collect();

    info!("Retrieved income ledger with {} rows", rows.len());
    let response = ApiResponse {
        data: rows,
        message: "Income rows retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Get all bank accounts
#[utoipa::path(
    get,
    path = "/api/v1/bank-accounts",
    tag = "income",
    responses(
        (status = 200, description = "Bank accounts retrieved successfully", body = ApiResponse<Vec<LookupResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_bank_accounts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LookupResponse>>>, StatusCode> {
    trace!("Entering get_bank_accounts function");

    match bank_account::Entity::find()
        .order_by_asc(bank_account::Column::Name)
        .all(&state.db)
        .await
    {
        Ok(rows) => {
            debug!("Retrieved {} bank accounts", rows.len());
            let response = ApiResponse {
                data: rows
                    .into_iter()
                    .map(|b| LookupResponse { id: b.id, name: b.name })
                    .collect(),
                message: "Bank accounts retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve bank accounts: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Create a bank account
#[utoipa::path(
    post,
    path = "/api/v1/bank-accounts",
    tag = "income",
    request_body = CreateLookupRequest,
    responses(
        (status = 201, description = "Bank account created successfully", body = ApiResponse<LookupResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_bank_account(
    State(state): State<AppState>,
    Json(request): Json<CreateLookupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LookupResponse>>), StatusCode> {
    trace!("Entering create_bank_account function");

    if request.name.trim().is_empty() {
        warn!("Rejected bank account with empty name");
        return Err(StatusCode::BAD_REQUEST);
    }

    let new_account = bank_account::ActiveModel {
        name: Set(request.name.clone()),
        ..Default::default()
    };

    match new_account.insert(&state.db).await {
        Ok(model) => {
            info!("Bank account created successfully with ID: {}", model.id);
            let response = ApiResponse {
                data: LookupResponse { id: model.id, name: model.name },
                message: "Bank account created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create bank account '{}': {}", request.name, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all income categories
#[utoipa::path(
    get,
    path = "/api/v1/income-categories",
    tag = "income",
    responses(
        (status = 200, description = "Income categories retrieved successfully", body = ApiResponse<Vec<LookupResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_income_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LookupResponse>>>, StatusCode> {
    trace!("Entering get_income_categories function");

    match income_category::Entity::find()
        .order_by_asc(income_category::Column::Name)
        .all(&state.db)
        .await
    {
        Ok(rows) => {
            debug!("Retrieved {} income categories", rows.len());
            let response = ApiResponse {
                data: rows
                    .into_iter()
                    .map(|c| LookupResponse { id: c.id, name: c.name })
                    .collect(),
                message: "Income categories retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve income categories: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Create an income category
#[utoipa::path(
    post,
    path = "/api/v1/income-categories",
    tag = "income",
    request_body = CreateLookupRequest,
    responses(
        (status = 201, description = "Income category created successfully", body = ApiResponse<LookupResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_income_category(
    State(state): State<AppState>,
    Json(request): Json<CreateLookupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LookupResponse>>), StatusCode> {
    trace!("Entering create_income_category function");

    if request.name.trim().is_empty() {
        warn!("Rejected income category with empty name");
        return Err(StatusCode::BAD_REQUEST);
    }

    let new_category = income_category::ActiveModel {
        name: Set(request.name.clone()),
        ..Default::default()
    };

    match new_category.insert(&state.db).await {
        Ok(model) => {
            info!("Income category created successfully with ID: {}", model.id);
            let response = ApiResponse {
                data: LookupResponse { id: model.id, name: model.name },
                message: "Income category created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!(
                "Failed to create income category '{}': {}",
                request.name, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
