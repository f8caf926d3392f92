use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::profile;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for creating a profile
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateAgentRequest {
    /// Display name
    pub full_name: Option<String>,
    /// Role: "admin" or "sales_agent" (default: "sales_agent")
    pub role: Option<String>,
}

/// Profile response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentResponse {
    pub id: i32,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: NaiveDateTime,
}

impl From<profile::Model> for AgentResponse {
    fn from(model: profile::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            role: role_str(model.role).to_string(),
            created_at: model.created_at,
        }
    }
}

fn parse_role(value: &str) -> Option<profile::ProfileRole> {
    match value {
        "admin" => Some(profile::ProfileRole::Admin),
        "sales_agent" => Some(profile::ProfileRole::SalesAgent),
        _ => None,
    }
}

fn role_str(role: profile::ProfileRole) -> &'static str {
    match role {
        profile::ProfileRole::Admin => "admin",
        profile::ProfileRole::SalesAgent => "sales_agent",
    }
}

/// Create a profile
#[utoipa::path(
    post,
    path = "/api/v1/agents",
    tag = "agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created successfully", body = ApiResponse<AgentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_agent(
    State(state): State<AppState>,
    Json(request): Json<CreateAgentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AgentResponse>>), StatusCode> {
    trace!("Entering create_agent function");
    debug!("Creating agent with name: {:?}", request.full_name);

    let role = match request.role.as_deref() {
        None => profile::ProfileRole::SalesAgent,
        Some(raw) => match parse_role(raw) {
            Some(role) => role,
            None => {
                warn!("Rejected unknown profile role: {}", raw);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
    };

    let new_profile = profile::ActiveModel {
        full_name: Set(request.full_name.clone()),
        role: Set(role),
        ..Default::default()
    };

    match new_profile.insert(&state.db).await {
        Ok(profile_model) => {
            info!("Agent created successfully with ID: {}", profile_model.id);
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: AgentResponse::from(profile_model),
                message: "Agent created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create agent: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get all sales agents, ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "agents",
    responses(
        (status = 200, description = "Agents retrieved successfully", body = ApiResponse<Vec<AgentResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_agents(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AgentResponse>>>, StatusCode> {
    trace!("Entering get_agents function");

    match profile::Entity::find()
        .filter(profile::Column::Role.eq(profile::ProfileRole::SalesAgent))
        .order_by_asc(profile::Column::FullName)
        .all(&state.db)
        .await
    {
        Ok(profiles) => {
            let count = profiles.len();
            debug!("Retrieved {} sales agents", count);
            let response = ApiResponse {
                data: profiles.into_iter().map(AgentResponse::from).collect(),
                message: "Agents retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve agents: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific agent by ID
#[utoipa::path(
    get,
    path = "/api/v1/agents/{agent_id}",
    tag = "agents",
    params(
        ("agent_id" = i32, Path, description = "Agent ID"),
    ),
    responses(
        (status = 200, description = "Agent retrieved successfully", body = ApiResponse<AgentResponse>),
        (status = 404, description = "Agent not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_agent(
    Path(agent_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AgentResponse>>, StatusCode> {
    trace!("Entering get_agent function for agent_id: {}", agent_id);

    match profile::Entity::find_by_id(agent_id).one(&state.db).await {
        Ok(Some(profile_model)) => {
            info!("Successfully retrieved agent with ID: {}", agent_id);
            let response = ApiResponse {
                data: AgentResponse::from(profile_model),
                message: "Agent retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Ok(None) => {
            warn!("Agent with ID {} not found", agent_id);
            Err(StatusCode::NOT_FOUND)
        }
        Err(db_error) => {
            error!("Failed to retrieve agent with ID {}: {}", agent_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
