use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Top-line figures for the landing dashboard.
///
/// The `period_*` fields respect the selected [`super::DateWindow`];
/// `outstanding_balance` and `collection_rate` are always all-time, and
/// `mtd_revenue` is always anchored to the real current calendar month so the
/// dashboard keeps one stable reference figure however the window is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    /// Payments received inside the selected window.
    pub period_revenue: Decimal,
    /// Active projects created inside the selected window.
    pub period_projects: u64,
    /// Clients created inside the selected window.
    pub period_clients: u64,
    /// Clients currently in `active` status (all-time).
    pub active_clients: u64,
    /// All-time active contract value minus all-time payments.
    pub outstanding_balance: Decimal,
    /// All-time paid / all-time active contract value, as a percentage.
    pub collection_rate: Decimal,
    /// Payments received since the first day of the current month.
    pub mtd_revenue: Decimal,
}

/// One month bucket of the current-year revenue chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RevenuePoint {
    /// Short month name ("Jan" .. "Dec").
    pub name: String,
    pub revenue: Decimal,
}

/// Aggregated outstanding position of one client across its active projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OutstandingClient {
    pub client_id: i32,
    pub client_name: String,
    pub total_contract: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
    pub project_count: u64,
}

/// Sales performance of one agent (or the whole team) over one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PeriodMetrics {
    /// Contract value of projects created in the period.
    pub sales: Decimal,
    /// Payments collected in the period on the agent's projects.
    pub collections: Decimal,
    pub project_count: u64,
    /// Sum of the explicit monthly targets covering the period.
    pub target: Decimal,
    /// collections / target * 100; exactly zero when no target is set.
    pub achievement: Decimal,
}

/// Month-, quarter- and year-to-date metrics for one agent selector.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FullPerformance {
    pub mtd: PeriodMetrics,
    pub qtd: PeriodMetrics,
    pub ytd: PeriodMetrics,
}

/// One row of the team leaderboard, ranked by MTD achievement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub agent_id: i32,
    pub agent_name: Option<String>,
    pub mtd_collected: Decimal,
    pub mtd_target: Decimal,
    pub mtd_achievement: Decimal,
    pub project_count: u64,
    /// Rank-1 marker; set only when the top entry actually achieved
    /// something this month.
    pub is_winner: bool,
}

/// One month of an agent's yearly breakdown table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlyBreakdown {
    /// Short month name ("Jan" .. "Dec").
    pub month_name: String,
    /// Month key in `YYYY-MM` form.
    pub month_key: String,
    pub sales: Decimal,
    pub collections: Decimal,
    pub target: Decimal,
    pub achievement: Decimal,
    /// How far collections trail the target; zero once the target is met.
    pub lag: Decimal,
}

/// Financial summary of a single client across all its projects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ClientSummary {
    pub total_projects: u64,
    pub active_projects: u64,
    pub total_contract_value: Decimal,
    pub total_paid: Decimal,
    pub total_outstanding: Decimal,
    pub total_payments: u64,
}

/// A project row flattened for the ledger table, with client and agent
/// names resolved and paid/remaining amounts derived.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectLedgerRow {
    pub project_id: i32,
    pub project_name: String,
    pub client_id: i32,
    pub client_name: String,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub agent_id: Option<i32>,
    pub agent_name: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
}
