use crate::handlers::{
    agents::{create_agent, get_agent, get_agents},
    clients::{
        create_client, delete_client, get_client, get_client_payments, get_client_projects,
        get_client_summary, get_clients, update_client,
    },
    dashboard::{get_activity, get_dashboard_stats, get_outstanding, get_revenue_chart},
    health::health_check,
    income::{
        create_bank_account, create_income_category, get_bank_accounts, get_income,
        get_income_categories,
    },
    payments::{create_payment, delete_payment},
    performance::{get_breakdown, get_leaderboard, get_performance},
    projects::{create_project, delete_project, get_ledger, get_project, update_project},
    targets::{get_agent_targets, set_month_target, upsert_target},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Client directory routes
        .route("/api/v1/clients", post(create_client))
        .route("/api/v1/clients", get(get_clients))
        .route("/api/v1/clients/:client_id", get(get_client))
        .route("/api/v1/clients/:client_id", put(update_client))
        .route("/api/v1/clients/:client_id", delete(delete_client))
        .route("/api/v1/clients/:client_id/projects", get(get_client_projects))
        .route("/api/v1/clients/:client_id/payments", get(get_client_payments))
        .route("/api/v1/clients/:client_id/summary", get(get_client_summary))
        // Project and ledger routes
        .route("/api/v1/projects", post(create_project))
        .route("/api/v1/projects/:project_id", get(get_project))
        .route("/api/v1/projects/:project_id", put(update_project))
        .route("/api/v1/projects/:project_id", delete(delete_project))
        .route("/api/v1/ledger", get(get_ledger))
        // Payment routes
        .route("/api/v1/payments", post(create_payment))
        .route("/api/v1/payments/:payment_id", delete(delete_payment))
        .route("/api/v1/income", get(get_income))
        // Income source routes
        .route("/api/v1/bank-accounts", get(get_bank_accounts))
        .route("/api/v1/bank-accounts", post(create_bank_account))
        .route("/api/v1/income-categories", get(get_income_categories))
        .route("/api/v1/income-categories", post(create_income_category))
        // Agent and target routes
        .route("/api/v1/agents", post(create_agent))
        .route("/api/v1/agents", get(get_agents))
        .route("/api/v1/agents/:agent_id", get(get_agent))
        .route("/api/v1/agents/:agent_id/targets", get(get_agent_targets))
        .route("/api/v1/agents/:agent_id/targets/:month_key", put(set_month_target))
        .route("/api/v1/targets", put(upsert_target))
        // Dashboard aggregate routes
        .route("/api/v1/dashboard/stats", get(get_dashboard_stats))
        .route("/api/v1/dashboard/revenue-chart", get(get_revenue_chart))
        .route("/api/v1/dashboard/outstanding", get(get_outstanding))
        .route("/api/v1/dashboard/activity", get(get_activity))
        // Performance routes (the static leaderboard segment wins over :agent)
        .route("/api/v1/performance/leaderboard", get(get_leaderboard))
        .route("/api/v1/performance/:agent", get(get_performance))
        .route("/api/v1/performance/:agent/breakdown", get(get_breakdown))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
