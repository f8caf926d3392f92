//! Common transport-layer types shared between the compute crate and the
//! HTTP handlers. Everything the aggregation layer derives and the API
//! serves lives here so both sides agree on one shape.

mod metrics;
mod periods;

pub use metrics::{
    ClientSummary, DashboardStats, FullPerformance, LeaderboardEntry, MonthlyBreakdown,
    OutstandingClient, PeriodMetrics, ProjectLedgerRow, RevenuePoint,
};
pub use periods::{DateWindow, MONTH_NAMES};
