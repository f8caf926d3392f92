//! Agent performance period aggregation (MTD / QTD / YTD).
//!
//! Month-level sales/collections come from two queries per month: projects
//! created in the month window, and payments dated in the window whose
//! project belongs to the agent (a join by project ownership, not by payment
//! metadata). Targets are resolved from that year's explicit monthly targets
//! only; a month without its own target contributes zero to every rollup,
//! with no fallback to the reference month's target.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use common::{FullPerformance, MonthlyBreakdown, PeriodMetrics, MONTH_NAMES};
use model::entities::{payment, project, sales_target};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait,
};
use tracing::{debug, instrument};

use crate::error::{ComputeError, Result};

/// Whose numbers to aggregate: one agent, or the whole company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentSelector {
    /// Company-wide aggregate over every agent.
    All,
    /// A single agent by profile id.
    Agent(i32),
}

impl FromStr for AgentSelector {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(AgentSelector::All);
        }
        s.parse::<i32>()
            .map(AgentSelector::Agent)
            .map_err(|_| ComputeError::Target(format!("invalid agent selector: {s}")))
    }
}

/// Raw sales performance of one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthPerformance {
    /// Contract value of projects created in the month.
    pub sales: Decimal,
    /// Payments dated in the month against the agent's projects.
    pub collections: Decimal,
    pub project_count: u64,
}

/// Returns the 1-based months of the quarter containing `month`.
/// May (5) belongs to Q2, so `quarter_months(5)` is `[4, 5, 6]`.
pub fn quarter_months(month: u32) -> [u32; 3] {
    let q = (month - 1) / 3;
    [q * 3 + 1, q * 3 + 2, q * 3 + 3]
}

/// First and last calendar day of the given month.
pub fn month_bounds(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap();

    // Get the first day of the next month, then subtract one day
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .pred_opt()
        .unwrap();

    (start, end)
}

/// collections / target * 100, uncapped; exactly zero when no target is set
/// so the figure never degenerates to NaN or infinity.
pub fn achievement(collections: Decimal, target: Decimal) -> Decimal {
    if target > Decimal::ZERO {
        collections / target * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Sums the explicit monthly targets covering `year`/`month` over the given
/// rows. For a single agent the rows hold at most one match; for the
/// company-wide case this sums every agent's target for the month (agents
/// without one simply contribute nothing).
pub fn target_for_month(targets: &[sales_target::Model], year: i32, month: u32) -> Decimal {
    targets
        .iter()
        .filter(|t| {
            t.period_type == sales_target::PeriodType::Monthly
                && t.start_date.year() == year
                && t.start_date.month() == month
        })
        .map(|t| t.target_amount)
        .sum()
}

/// Fetches the monthly targets of one year, optionally restricted to one
/// agent.
#[instrument(skip(db))]
pub async fn year_targets(
    db: &DatabaseConnection,
    selector: AgentSelector,
    year: i32,
) -> Result<Vec<sales_target::Model>> {
    let (jan1, _) = month_bounds(year, 1);
    let (_, dec31) = month_bounds(year, 12);

    let mut query = sales_target::Entity::find()
        .filter(sales_target::Column::PeriodType.eq(sales_target::PeriodType::Monthly))
        .filter(sales_target::Column::StartDate.gte(jan1))
        .filter(sales_target::Column::StartDate.lte(dec31));
    if let AgentSelector::Agent(id) = selector {
        query = query.filter(sales_target::Column::AgentId.eq(id));
    }

    Ok(query.all(db).await?)
}

/// Computes one month's sales, collections and project count for the
/// selected agent (or the whole company).
#[instrument(skip(db))]
pub async fn month_performance(
    db: &DatabaseConnection,
    selector: AgentSelector,
    year: i32,
    month: u32,
) -> Result<MonthPerformance> {
    let (start, end) = month_bounds(year, month);
    let start_at = start.and_hms_opt(0, 0, 0).unwrap();
    let end_at = end.and_hms_opt(23, 59, 59).unwrap();

    let mut projects_query = project::Entity::find()
        .filter(project::Column::CreatedAt.gte(start_at))
        .filter(project::Column::CreatedAt.lte(end_at));
    if let AgentSelector::Agent(id) = selector {
        projects_query = projects_query.filter(project::Column::AgentId.eq(id));
    }
    let projects = projects_query.all(db).await?;

    let mut payments_query = payment::Entity::find()
        .filter(payment::Column::PaymentDate.gte(start))
        .filter(payment::Column::PaymentDate.lte(end));
    if let AgentSelector::Agent(id) = selector {
        payments_query = payments_query
            .join(JoinType::InnerJoin, payment::Relation::Project.def())
            .filter(project::Column::AgentId.eq(id));
    }
    let payments = payments_query.all(db).await?;

    let sales: Decimal = projects.iter().map(|p| p.total_amount).sum();
    let collections: Decimal = payments.iter().map(|p| p.amount).sum();
    debug!(%sales, %collections, projects = projects.len(), "Month performance computed");

    Ok(MonthPerformance {
        sales,
        collections,
        project_count: projects.len() as u64,
    })
}

/// Computes MTD, QTD and YTD metrics for the selector at `reference`.
///
/// Every calendar month from January through the reference month is
/// aggregated exactly once and contributes to each rollup it belongs to;
/// months after the reference month are not summed at all, neither their
/// performance nor their targets, so a still-running quarter is never
/// inflated by future targets.
#[instrument(skip(db))]
pub async fn full_performance(
    db: &DatabaseConnection,
    selector: AgentSelector,
    reference: NaiveDate,
) -> Result<FullPerformance> {
    let year = reference.year();
    let ref_month = reference.month();
    let q_months = quarter_months(ref_month);

    let targets = year_targets(db, selector, year).await?;

    let mut mtd = PeriodMetrics::default();
    let mut qtd = PeriodMetrics::default();
    let mut ytd = PeriodMetrics::default();

    for m in 1..=ref_month {
        let perf = month_performance(db, selector, year, m).await?;
        let target = target_for_month(&targets, year, m);

        ytd.sales += perf.sales;
        ytd.collections += perf.collections;
        ytd.project_count += perf.project_count;
        ytd.target += target;

        if q_months.contains(&m) {
            qtd.sales += perf.sales;
            qtd.collections += perf.collections;
            qtd.project_count += perf.project_count;
            qtd.target += target;
        }

        if m == ref_month {
            mtd = PeriodMetrics {
                sales: perf.sales,
                collections: perf.collections,
                project_count: perf.project_count,
                target,
                achievement: achievement(perf.collections, target),
            };
        }
    }

    qtd.achievement = achievement(qtd.collections, qtd.target);
    ytd.achievement = achievement(ytd.collections, ytd.target);

    Ok(FullPerformance { mtd, qtd, ytd })
}

/// Builds the 12-row yearly breakdown from already-fetched rows.
pub fn breakdown_rows(
    projects: &[project::Model],
    payments: &[payment::Model],
    targets: &[sales_target::Model],
    year: i32,
) -> Vec<MonthlyBreakdown> {
    (1..=12u32)
        .map(|m| {
            let sales: Decimal = projects
                .iter()
                .filter(|p| p.created_at.date().month() == m && p.created_at.date().year() == year)
                .map(|p| p.total_amount)
                .sum();
            let collections: Decimal = payments
                .iter()
                .filter(|p| p.payment_date.month() == m && p.payment_date.year() == year)
                .map(|p| p.amount)
                .sum();
            let target = target_for_month(targets, year, m);
            let lag = if target > collections {
                target - collections
            } else {
                Decimal::ZERO
            };

            MonthlyBreakdown {
                month_name: MONTH_NAMES[(m - 1) as usize].to_string(),
                month_key: format!("{year}-{m:02}"),
                sales,
                collections,
                target,
                achievement: achievement(collections, target),
                lag,
            }
        })
        .collect()
}

/// Per-month breakdown of one agent's year: sales, collections, target,
/// achievement and lag, computed from three bulk fetches.
#[instrument(skip(db))]
pub async fn yearly_breakdown(
    db: &DatabaseConnection,
    agent_id: i32,
    year: i32,
) -> Result<Vec<MonthlyBreakdown>> {
    let (jan1, _) = month_bounds(year, 1);
    let (_, dec31) = month_bounds(year, 12);
    let year_start = jan1.and_hms_opt(0, 0, 0).unwrap();
    let year_end = dec31.and_hms_opt(23, 59, 59).unwrap();

    let projects = project::Entity::find()
        .filter(project::Column::AgentId.eq(agent_id))
        .filter(project::Column::CreatedAt.gte(year_start))
        .filter(project::Column::CreatedAt.lte(year_end))
        .all(db)
        .await?;

    let payments = payment::Entity::find()
        .filter(payment::Column::PaymentDate.gte(jan1))
        .filter(payment::Column::PaymentDate.lte(dec31))
        .join(JoinType::InnerJoin, payment::Relation::Project.def())
        .filter(project::Column::AgentId.eq(agent_id))
        .all(db)
        .await?;

    let targets = year_targets(db, AgentSelector::Agent(agent_id), year).await?;

    Ok(breakdown_rows(&projects, &payments, &targets, year))
}
