use crate::schemas::{ApiResponse, AppState, ClientSearchQuery, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use common::ClientSummary;
use compute::client_stats;
use model::entities::client;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating a new client
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateClientRequest {
    /// Client name
    pub name: String,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Company name
    pub company: Option<String>,
    /// Industry descriptor
    pub industry: Option<String>,
    /// Where the lead came from (referral, web, ...)
    pub source: Option<String>,
    /// Responsible sales agent ID
    pub assigned_agent_id: Option<i32>,
    /// Lifecycle status: "active", "inactive" or "churned" (default: "active")
    pub status: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Request body for updating a client
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateClientRequest {
    /// Client name
    pub name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Company name
    pub company: Option<String>,
    /// Industry descriptor
    pub industry: Option<String>,
    /// Where the lead came from
    pub source: Option<String>,
    /// Responsible sales agent ID
    pub assigned_agent_id: Option<i32>,
    /// Lifecycle status: "active", "inactive" or "churned"
    pub status: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// Client response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientResponse {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub source: Option<String>,
    pub assigned_agent_id: Option<i32>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<client::Model> for ClientResponse {
    fn from(model: client::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            company: model.company,
            industry: model.industry,
            source: model.source,
            assigned_agent_id: model.assigned_agent_id,
            status: status_str(model.status).to_string(),
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

/// Client response augmented with derived financial figures
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientDetailResponse {
    #[serde(flatten)]
    pub client: ClientResponse,
    /// Client lifetime value: sum of contract values over all projects
    pub cltv: Decimal,
    /// Sum of all payments against the client's projects
    pub total_paid: Decimal,
    /// cltv minus total_paid; negative on overpayment
    pub remaining_balance: Decimal,
}

/// One of the client's projects with derived payment totals
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientProjectResponse {
    pub id: i32,
    pub name: String,
    pub status: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub payment_count: u64,
    pub start_date: chrono::NaiveDate,
    pub end_date: Option<chrono::NaiveDate>,
    pub created_at: NaiveDateTime,
}

/// One of the client's payments with its project name resolved
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientPaymentResponse {
    pub id: i32,
    pub project_id: i32,
    pub project_name: String,
    pub amount: Decimal,
    pub payment_date: chrono::NaiveDate,
    pub payment_method: Option<String>,
    pub note: Option<String>,
}

pub(crate) fn parse_status(value: &str) -> Option<client::ClientStatus> {
    match value {
        "active" => Some(client::ClientStatus::Active),
        "inactive" => Some(client::ClientStatus::Inactive),
        "churned" => Some(client::ClientStatus::Churned),
        _ => None,
    }
}

pub(crate) fn status_str(status: client::ClientStatus) -> &'static str {
    match status {
        client::ClientStatus::Active => "active",
        client::ClientStatus::Inactive => "inactive",
        client::ClientStatus::Churned => "churned",
    }
}

/// Create a new client
#[utoipa::path(
    post,
    path = "/api/v1/clients",
    tag = "clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created successfully", body = ApiResponse<ClientResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ClientResponse>>), StatusCode> {
    trace!("Entering create_client function");
    debug!("Creating client with name: {}", request.name);

    let status = match request.status.as_deref() {
        None => client::ClientStatus::Active,
        Some(raw) => match parse_status(raw) {
            Some(status) => status,
            None => {
                warn!("Rejected unknown client status: {}", raw);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
    };

    let new_client = client::ActiveModel {
        name: Set(request.name.clone()),
        email: Set(request.email.clone()),
        phone: Set(request.phone.clone()),
        address: Set(request.address.clone()),
        company: Set(request.company.clone()),
        industry: Set(request.industry.clone()),
        source: Set(request.source.clone()),
        assigned_agent_id: Set(request.assigned_agent_id),
        status: Set(status),
        notes: Set(request.notes.clone()),
        ..Default::default()
    };

    trace!("Attempting to insert new client into database");
    match new_client.insert(&state.db).await {
        Ok(client_model) => {
            info!(
                "Client created successfully with ID: {}, name: {}",
                client_model.id, client_model.name
            );
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ClientResponse::from(client_model),
                message: "Client created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create client '{}': {}", request.name, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all clients, optionally filtered by a search string
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    tag = "clients",
    params(
        ("q" = Option<String>, Query, description = "Substring to match against name, company, email, phone and industry"),
    ),
    responses(
        (status = 200, description = "Clients retrieved successfully", body = ApiResponse<Vec<ClientResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_clients(
    Query(query): Query<ClientSearchQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ClientResponse>>>, StatusCode> {
    trace!("Entering get_clients function");

    let mut select = client::Entity::find();
    if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
        debug!("Searching clients for: {}", q);
        select = select.filter(
            Condition::any()
                .add(client::Column::Name.contains(q))
                .add(client::Column::Company.contains(q))
                .add(client::Column::Email.contains(q))
                .add(client::Column::Phone.contains(q))
                .add(client::Column::Industry.contains(q)),
        );
    }

    match select.all(&state.db).await {
        Ok(clients) => {
            let client_count = clients.len();
            debug!("Retrieved {} clients from database", client_count);

            let client_responses: Vec<ClientResponse> =
                clients.into_iter().map(ClientResponse::from).collect();

            info!("Successfully retrieved {} clients", client_count);
            let response = ApiResponse {
                data: client_responses,
                message: "Clients retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve clients from database: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific client by ID, with derived financial figures
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Client retrieved successfully", body = ApiResponse<ClientDetailResponse>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client(
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ClientDetailResponse>>, StatusCode> {
    trace!("Entering get_client function for client_id: {}", client_id);

    let client_model = match client::Entity::find_by_id(client_id).one(&state.db).await {
        Ok(Some(client)) => client,
        Ok(None) => {
            warn!("Client with ID {} not found", client_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!("Failed to retrieve client with ID {}: {}", client_id, db_error);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let financials = match client_stats::financials_for_client(&state.db, client_id).await {
        Ok(financials) => financials,
        Err(compute_error) => {
            error!(
                "Failed to compute financials for client {}: {}",
                client_id, compute_error
            );
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    info!("Successfully retrieved client with ID: {}", client_id);
    let response = ApiResponse {
        data: ClientDetailResponse {
            client: ClientResponse::from(client_model),
            cltv: financials.cltv,
            total_paid: financials.total_paid,
            remaining_balance: financials.remaining_balance,
        },
        message: "Client retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update a client
#[utoipa::path(
    put,
    path = "/api/v1/clients/{client_id}",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated successfully", body = ApiResponse<ClientResponse>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_client(
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<ApiResponse<ClientResponse>>, StatusCode> {
    trace!("Entering update_client function for client_id: {}", client_id);

    let existing_client = match client::Entity::find_by_id(client_id).one(&state.db).await {
        Ok(Some(client)) => client,
        Ok(None) => {
            warn!("Client with ID {} not found for update", client_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!(
                "Failed to lookup client with ID {} for update: {}",
                client_id, db_error
            );
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut client_active: client::ActiveModel = existing_client.into();

    if let Some(name) = request.name {
        client_active.name = Set(name);
    }
    if let Some(email) = request.email {
        client_active.email = Set(Some(email));
    }
    if let Some(phone) = request.phone {
        client_active.phone = Set(Some(phone));
    }
    if let Some(address) = request.address {
        client_active.address = Set(Some(address));
    }
    if let Some(company) = request.company {
        client_active.company = Set(Some(company));
    }
    if let Some(industry) = request.industry {
        client_active.industry = Set(Some(industry));
    }
    if let Some(source) = request.source {
        client_active.source = Set(Some(source));
    }
    if let Some(assigned_agent_id) = request.assigned_agent_id {
        client_active.assigned_agent_id = Set(Some(assigned_agent_id));
    }
    if let Some(raw_status) = request.status {
        match parse_status(&raw_status) {
            Some(status) => client_active.status = Set(status),
            None => {
                warn!("Rejected unknown client status: {}", raw_status);
                return Err(StatusCode::BAD_REQUEST);
            }
        }
    }
    if let Some(notes) = request.notes {
        client_active.notes = Set(Some(notes));
    }

    trace!("Attempting to update client in database");
    match client_active.update(&state.db).await {
        Ok(updated_client) => {
            info!("Client with ID {} updated successfully", client_id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: ClientResponse::from(updated_client),
                message: "Client updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update client with ID {}: {}", client_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a client and, through cascade, its projects and payments
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{client_id}",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Client deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_client(
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_client function for client_id: {}", client_id);

    match client::Entity::delete_by_id(client_id).exec(&state.db).await {
        Ok(delete_result) => {
            debug!(
                "Delete operation completed. Rows affected: {}",
                delete_result.rows_affected
            );
            if delete_result.rows_affected > 0 {
                info!("Client with ID {} deleted successfully", client_id);
                state.cache.invalidate_all();
                let response = ApiResponse {
                    data: format!("Client {} deleted", client_id),
                    message: "Client deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Client with ID {} not found for deletion", client_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete client with ID {}: {}", client_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a client's projects with paid/remaining totals, newest first
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/projects",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Client projects retrieved successfully", body = ApiResponse<Vec<ClientProjectResponse>>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_projects(
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ClientProjectResponse>>>, StatusCode> {
    trace!("Entering get_client_projects function for client_id: {}", client_id);

    ensure_client_exists(&state, client_id).await?;

    match client_stats::client_projects(&state.db, client_id).await {
        Ok(projects) => {
            let rows: Vec<ClientProjectResponse> = projects
                .into_iter()
                .map(|p| ClientProjectResponse {
                    id: p.project.id,
                    name: p.project.name,
                    status: crate::handlers::projects::project_status_str(p.project.status)
                        .to_string(),
                    total_amount: p.project.total_amount,
                    paid_amount: p.paid_amount,
                    remaining_amount: p.remaining_amount,
                    payment_count: p.payment_count,
                    start_date: p.project.start_date,
                    end_date: p.project.end_date,
                    created_at: p.project.created_at,
                })
                .collect();

            info!("Retrieved {} projects for client {}", rows.len(), client_id);
            let response = ApiResponse {
                data: rows,
                message: "Client projects retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(compute_error) => {
            error!(
                "Failed to retrieve projects for client {}: {}",
                client_id, compute_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a client's payments with project names, newest first
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/payments",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Client payments retrieved successfully", body = ApiResponse<Vec<ClientPaymentResponse>>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_payments(
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ClientPaymentResponse>>>, StatusCode> {
    trace!("Entering get_client_payments function for client_id: {}", client_id);

    ensure_client_exists(&state, client_id).await?;

    match client_stats::client_payments(&state.db, client_id).await {
        Ok(payments) => {
            let rows: Vec<ClientPaymentResponse> = payments
                .into_iter()
                .map(|row| ClientPaymentResponse {
                    id: row.payment.id,
                    project_id: row.payment.project_id,
                    project_name: row.project_name,
                    amount: row.payment.amount,
                    payment_date: row.payment.payment_date,
                    payment_method: row.payment.payment_method,
                    note: row.payment.note,
                })
                .collect();

            info!("Retrieved {} payments for client {}", rows.len(), client_id);
            let response = ApiResponse {
                data: rows,
                message: "Client payments retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(compute_error) => {
            error!(
                "Failed to retrieve payments for client {}: {}",
                client_id, compute_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a client's financial summary
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/summary",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Client summary retrieved successfully", body = ApiResponse<ClientSummary>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_summary(
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ClientSummary>>, StatusCode> {
    trace!("Entering get_client_summary function for client_id: {}", client_id);

    ensure_client_exists(&state, client_id).await?;

    match client_stats::client_summary(&state.db, client_id).await {
        Ok(summary) => {
            info!("Retrieved summary for client {}", client_id);
            let response = ApiResponse {
                data: summary,
                message: "Client summary retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(compute_error) => {
            error!(
                "Failed to compute summary for client {}: {}",
                client_id, compute_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn ensure_client_exists(state: &AppState, client_id: i32) -> Result<(), StatusCode> {
    match client::Entity::find_by_id(client_id).one(&state.db).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            warn!("Client with ID {} not found", client_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to lookup client with ID {}: {}", client_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
