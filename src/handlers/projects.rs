use crate::handlers::payments::PaymentResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use common::ProjectLedgerRow;
use compute::ledger;
use model::entities::project;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating a new project
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateProjectRequest {
    /// Client this project belongs to
    pub client_id: i32,
    /// Sales agent credited with the deal
    pub agent_id: Option<i32>,
    /// Project name
    pub name: String,
    /// Project description
    pub description: Option<String>,
    /// Total contract value
    pub total_amount: Decimal,
    /// Status: "active", "completed", "cancelled" or "on_hold" (default: "active")
    pub status: Option<String>,
    /// Contract start date
    pub start_date: NaiveDate,
    /// Contract end date, if agreed
    pub end_date: Option<NaiveDate>,
}

/// Request body for updating a project
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateProjectRequest {
    /// Sales agent credited with the deal
    pub agent_id: Option<i32>,
    /// Project name
    pub name: Option<String>,
    /// Project description
    pub description: Option<String>,
    /// Total contract value
    pub total_amount: Option<Decimal>,
    /// Status: "active", "completed", "cancelled" or "on_hold"
    pub status: Option<String>,
    /// Contract start date
    pub start_date: Option<NaiveDate>,
    /// Contract end date
    pub end_date: Option<NaiveDate>,
}

/// Project response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: i32,
    pub client_id: i32,
    pub agent_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub total_amount: Decimal,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl From<project::Model> for ProjectResponse {
    fn from(model: project::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            agent_id: model.agent_id,
            name: model.name,
            description: model.description,
            total_amount: model.total_amount,
            status: project_status_str(model.status).to_string(),
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: model.created_at,
        }
    }
}

/// Project response with its payments and derived totals
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub payments: Vec<PaymentResponse>,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
}

pub(crate) fn parse_project_status(value: &str) -> Option<project::ProjectStatus> {
    match value {
        "active" => Some(project::ProjectStatus::Active),
        "completed" => Some(project::ProjectStatus::Completed),
        "cancelled" => Some(project::ProjectStatus::Cancelled),
        "on_hold" => Some(project::ProjectStatus::OnHold),
        _ => None,
    }
}

pub(crate) fn project_status_str(status: project::ProjectStatus) -> &'static str {
    match status {
        project::ProjectStatus::Active => "active",
        project::ProjectStatus::Completed => "completed",
        project::ProjectStatus::Cancelled => "cancelled",
        project::ProjectStatus::OnHold => "on_hold",
    }
}

/// Create a new project
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created successfully", body = ApiResponse<ProjectResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProjectResponse>>), StatusCode> {
    trace!("Entering create_project function");
    debug!(
        "Creating project '{}' for client {} with total {}",
        request.name, request.client_id, request.total_amount
    );

    if request.total_amount < Decimal::ZERO {
        warn!("Rejected project with negative total: {}", request.total_amount);
        return Err(StatusCode::BAD_REQUEST);
    }

    let status = match request.status.as_deref() {
        None => project::ProjectStatus::Active,
        Some(raw) => match parse_project_status(raw) {
            Some(status) => status,
            None => {
                warn!("Rejected unknown project status: {}", raw);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
    };

    let new_project = project::ActiveModel {
        client_id: Set(request.client_id),
        agent_id: Set(request.agent_id),
        name: Set(request.name.clone()),
        description: Set(request.description.clone()),
        total_amount: Set(request.total_amount),
        status: Set(status),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        ..Default::default()
    };

    trace!("Attempting to insert new project into database");
    match new_project.insert(&state.db).await {
        Ok(project_model) => {
            info!(
                "Project created successfully with ID: {}, name: {}",
                project_model.id, project_model.name
            );
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ProjectResponse::from(project_model),
                message: "Project created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!(
                "Failed to create project '{}' for client {}: {}",
                request.name, request.client_id, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a project with its payments and paid/remaining totals
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}",
    tag = "projects",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
    ),
    responses(
        (status = 200, description = "Project retrieved successfully", body = ApiResponse<ProjectDetailResponse>),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_project(
    Path(project_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ProjectDetailResponse>>, StatusCode> {
    trace!("Entering get_project function for project_id: {}", project_id);

    match ledger::project_detail(&state.db, project_id).await {
        Ok(Some(detail)) => {
            info!("Successfully retrieved project with ID: {}", project_id);
            let response = ApiResponse {
                data: ProjectDetailResponse {
                    project: ProjectResponse::from(detail.project),
                    payments: detail.payments.into_iter().map(PaymentResponse::from).collect(),
                    paid_amount: detail.paid_amount,
                    remaining_amount: detail.remaining_amount,
                },
                message: "Project retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Project with ID {} not found", project_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(compute_error) => {
            error!(
                "Failed to retrieve project with ID {}: {}",
                project_id, compute_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Update a project
#[utoipa::path(
    put,
    path = "/api/v1/projects/{project_id}",
    tag = "projects",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated successfully", body = ApiResponse<ProjectResponse>),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_project(
    Path(project_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<ApiResponse<ProjectResponse>>, StatusCode> {
    trace!("Entering update_project function for project_id: {}", project_id);

    let existing_project = match project::Entity::find_by_id(project_id).one(&state.db).await {
        Ok(Some(project)) => project,
        Ok(None) => {
            warn!("Project with ID {} not found for update", project_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!(
                "Failed to lookup project with ID {} for update: {}",
                project_id, db_error
            );
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut project_active: project::ActiveModel = existing_project.into();

    if let Some(agent_id) = request.agent_id {
        project_active.agent_id = Set(Some(agent_id));
    }
    if let Some(name) = request.name {
        project_active.name = Set(name);
    }
    if let Some(description) = request.description {
        project_active.description = Set(Some(description));
    }
    if let Some(total_amount) = request.total_amount {
        if total_amount < Decimal::ZERO {
            warn!("Rejected negative project total: {}", total_amount);
            return Err(StatusCode::BAD_REQUEST);
        }
        project_active.total_amount = Set(total_amount);
    }
    if let Some(raw_status) = request.status {
        match parse_project_status(&raw_status) {
            Some(status) => project_active.status = Set(status),
            None => {
                warn!("Rejected unknown project status: {}", raw_status);
                return Err(StatusCode::BAD_REQUEST);
            }
        }
    }
    if let Some(start_date) = request.start_date {
        project_active.start_date = Set(start_date);
    }
    if let Some(end_date) = request.end_date {
        project_active.end_date = Set(Some(end_date));
    }

    trace!("Attempting to update project in database");
    match project_active.update(&state.db).await {
        Ok(updated_project) => {
            info!("Project with ID {} updated successfully", project_id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ProjectResponse::from(updated_project),
                message: "Project updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update project with ID {}: {}", project_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a project and, through cascade, its payments
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}",
    tag = "projects",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
    ),
    responses(
        (status = 200, description = "Project deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_project(
    Path(project_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_project function for project_id: {}", project_id);

    match project::Entity::delete_by_id(project_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Project with ID {} deleted successfully", project_id);
                state.cache.invalidate_all();
                let response = ApiResponse {
                    data: format!("Project {} deleted", project_id),
                    message: "Project deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Project with ID {} not found for deletion", project_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete project with ID {}: {}", project_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get the flat project ledger, newest first
#[utoipa::path(
    get,
    path = "/api/v1/ledger",
    tag = "projects",
    responses(
        (status = 200, description = "Ledger retrieved successfully", body = ApiResponse<Vec<ProjectLedgerRow>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_ledger(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProjectLedgerRow>>>, StatusCode> {
    trace!("Entering get_ledger function");

    match ledger::project_ledger(&state.db).await {
        Ok(rows) => {
            info!("Retrieved ledger with {} rows", rows.len());
            let response = ApiResponse {
                data: rows,
                message: "Ledger retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(compute_error) => {
            error!("Failed to retrieve project ledger: {}", compute_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
