use common::{
    ClientSummary, DashboardStats, DateWindow, FullPerformance, LeaderboardEntry,
    MonthlyBreakdown, OutstandingClient, ProjectLedgerRow, RevenuePoint,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use validator::Validate;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for expensive aggregates
    pub cache: Cache<String, CachedData>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Dashboard(DashboardStats),
    Chart(Vec<RevenuePoint>),
    Outstanding(Vec<OutstandingClient>),
    Performance(FullPerformance),
    Leaderboard(Vec<LeaderboardEntry>),
}

/// Query parameters for the dashboard stats endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct DashboardQuery {
    /// Date window to aggregate over (defaults to all time)
    pub window: Option<DateWindow>,
}

/// Query parameters for year-scoped endpoints
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct YearQuery {
    /// Calendar year (defaults to the current year)
    #[validate(range(min = 2000, max = 2100))]
    pub year: Option<i32>,
}

/// Query parameters for client listing
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClientSearchQuery {
    /// Substring to match against name, company, email, phone and industry
    pub q: Option<String>,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::clients::create_client,
        crate::handlers::clients::get_clients,
        crate::handlers::clients::get_client,
        crate::handlers::clients::update_client,
        crate::handlers::clients::delete_client,
        crate::handlers::clients::get_client_projects,
        crate::handlers::clients::get_client_payments,
        crate::handlers::clients::get_client_summary,
        crate::handlers::projects::create_project,
        crate::handlers::projects::get_project,
        crate::handlers::projects::update_project,
        crate::handlers::projects::delete_project,
        crate::handlers::projects::get_ledger,
        crate::handlers::payments::create_payment,
        crate::handlers::payments::delete_payment,
        crate::handlers::income::get_income,
        crate::handlers::income::get_bank_accounts,
        crate::handlers::income::create_bank_account,
        crate::handlers::income::get_income_categories,
        crate::handlers::income::create_income_category,
        crate::handlers::agents::create_agent,
        crate::handlers::agents::get_agents,
        crate::handlers::agents::get_agent,
        crate::handlers::targets::get_agent_targets,
        crate::handlers::targets::upsert_target,
        crate::handlers::targets::set_month_target,
        crate::handlers::dashboard::get_dashboard_stats,
        crate::handlers::dashboard::get_revenue_chart,
        crate::handlers::dashboard::get_outstanding,
        crate::handlers::dashboard::get_activity,
        crate::handlers::performance::get_performance,
        crate::handlers::performance::get_leaderboard,
        crate::handlers::performance::get_breakdown,
    ),
    components(
        schemas(
            ApiResponse<DashboardStats>,
            ApiResponse<Vec<RevenuePoint>>,
            ApiResponse<Vec<OutstandingClient>>,
            ApiResponse<FullPerformance>,
            ApiResponse<Vec<LeaderboardEntry>>,
            ApiResponse<Vec<MonthlyBreakdown>>,
            ApiResponse<Vec<ProjectLedgerRow>>,
            ApiResponse<ClientSummary>,
            ErrorResponse,
            HealthResponse,
            DashboardQuery,
            YearQuery,
            ClientSearchQuery,
            crate::handlers::clients::CreateClientRequest,
            crate::handlers::clients::UpdateClientRequest,
            crate::handlers::clients::ClientResponse,
            crate::handlers::clients::ClientDetailResponse,
            crate::handlers::clients::ClientProjectResponse,
            crate::handlers::clients::ClientPaymentResponse,
            crate::handlers::projects::CreateProjectRequest,
            crate::handlers::projects::UpdateProjectRequest,
            crate::handlers::projects::ProjectResponse,
            crate::handlers::projects::ProjectDetailResponse,
            crate::handlers::payments::CreatePaymentRequest,
            crate::handlers::payments::PaymentResponse,
            crate::handlers::income::IncomeRowResponse,
            crate::handlers::income::CreateLookupRequest,
            crate::handlers::income::LookupResponse,
            crate::handlers::agents::CreateAgentRequest,
            crate::handlers::agents::AgentResponse,
            crate::handlers::targets::UpsertTargetRequest,
            crate::handlers::targets::SetMonthTargetRequest,
            crate::handlers::targets::TargetResponse,
            crate::handlers::dashboard::RecentClient,
            crate::handlers::dashboard::RecentPayment,
            crate::handlers::dashboard::ActivityResponse,
            DashboardStats,
            RevenuePoint,
            OutstandingClient,
            FullPerformance,
            LeaderboardEntry,
            MonthlyBreakdown,
            ClientSummary,
            ProjectLedgerRow,
            DateWindow,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "clients", description = "Client directory endpoints"),
        (name = "projects", description = "Project and ledger endpoints"),
        (name = "payments", description = "Payment recording endpoints"),
        (name = "income", description = "Income listing and income source endpoints"),
        (name = "agents", description = "Sales agent endpoints"),
        (name = "targets", description = "Sales target endpoints"),
        (name = "dashboard", description = "Dashboard aggregate endpoints"),
        (name = "performance", description = "Agent performance endpoints"),
    ),
    info(
        title = "CRM Dashboard API",
        description = "Small-business CRM backend - client directory, project ledger, payment recording and sales performance tracking",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
