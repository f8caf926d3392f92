//! Landing dashboard aggregation: period figures for the selected date
//! window, the current-year revenue chart, and the outstanding-by-client
//! table.
//!
//! Every function here returns a `Result`; degrading to zeroed defaults on
//! failure is the caller's decision, never taken silently in this layer.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use common::{DashboardStats, DateWindow, OutstandingClient, RevenuePoint, MONTH_NAMES};
use model::entities::{client, payment, project};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::performance::month_bounds;

/// Resolves a dashboard date window to a concrete `[start, end]` day pair.
/// `None` means unbounded ("all time").
pub fn resolve_window(window: DateWindow, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match window {
        DateWindow::All => None,
        DateWindow::ThisMonth => Some(month_bounds(today.year(), today.month())),
        DateWindow::LastMonth => {
            let (year, month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            Some(month_bounds(year, month))
        }
        DateWindow::Ytd => Some((
            NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap(),
        )),
    }
}

/// Buckets payments into the 12 months of `year`. Payments dated in any
/// other year are silently excluded; they belong to another year's chart.
pub fn revenue_chart(payments: &[payment::Model], year: i32) -> Vec<RevenuePoint> {
    let mut points: Vec<RevenuePoint> = MONTH_NAMES
        .iter()
        .map(|name| RevenuePoint {
            name: name.to_string(),
            revenue: Decimal::ZERO,
        })
        .collect();

    for pay in payments {
        if pay.payment_date.year() == year {
            let idx = (pay.payment_date.month() - 1) as usize;
            points[idx].revenue += pay.amount;
        }
    }

    points
}

/// Groups active projects (with their payments) into per-client outstanding
/// positions: only clients still owing something are kept, largest debt
/// first. Ties keep their input order (stable sort).
pub fn fold_outstanding(
    rows: &[(project::Model, Vec<payment::Model>)],
    client_names: &HashMap<i32, String>,
) -> Vec<OutstandingClient> {
    let mut order: Vec<i32> = Vec::new();
    let mut by_client: HashMap<i32, OutstandingClient> = HashMap::new();

    for (proj, payments) in rows {
        let paid: Decimal = payments.iter().map(|p| p.amount).sum();
        let entry = by_client.entry(proj.client_id).or_insert_with(|| {
            order.push(proj.client_id);
            OutstandingClient {
                client_id: proj.client_id,
                client_name: client_names
                    .get(&proj.client_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                total_contract: Decimal::ZERO,
                total_paid: Decimal::ZERO,
                outstanding: Decimal::ZERO,
                project_count: 0,
            }
        });
        entry.total_contract += proj.total_amount;
        entry.total_paid += paid;
        entry.outstanding += proj.total_amount - paid;
        entry.project_count += 1;
    }

    let mut entries: Vec<OutstandingClient> = order
        .into_iter()
        .filter_map(|id| by_client.remove(&id))
        .filter(|c| c.outstanding > Decimal::ZERO)
        .collect();
    entries.sort_by(|a, b| b.outstanding.cmp(&a.outstanding));
    entries
}

/// Computes the dashboard's top-line figures for the selected window.
///
/// `outstanding_balance`, `collection_rate` and `mtd_revenue` ignore the
/// window on purpose: the first two are all-time positions, and MTD revenue
/// is anchored to the real current month so the dashboard always shows one
/// stable reference figure.
#[instrument(skip(db))]
pub async fn dashboard_stats(
    db: &DatabaseConnection,
    window: DateWindow,
    today: NaiveDate,
) -> Result<DashboardStats> {
    let range = resolve_window(window, today);

    let payments = payment::Entity::find().all(db).await?;

    let mut period_projects_query = project::Entity::find()
        .filter(project::Column::Status.eq(project::ProjectStatus::Active));
    let mut period_clients_query = client::Entity::find();
    if let Some((start, end)) = range {
        let start_at = start.and_hms_opt(0, 0, 0).unwrap();
        let end_at = end.and_hms_opt(23, 59, 59).unwrap();
        period_projects_query = period_projects_query
            .filter(project::Column::CreatedAt.gte(start_at))
            .filter(project::Column::CreatedAt.lte(end_at));
        period_clients_query = period_clients_query
            .filter(client::Column::CreatedAt.gte(start_at))
            .filter(client::Column::CreatedAt.lte(end_at));
    }
    let period_projects = period_projects_query.count(db).await?;
    let period_clients = period_clients_query.count(db).await?;

    let active_clients = client::Entity::find()
        .filter(client::Column::Status.eq(client::ClientStatus::Active))
        .count(db)
        .await?;

    let active_contract_value: Decimal = project::Entity::find()
        .filter(project::Column::Status.eq(project::ProjectStatus::Active))
        .all(db)
        .await?
        .iter()
        .map(|p| p.total_amount)
        .sum();

    let period_revenue: Decimal = payments
        .iter()
        .filter(|p| match range {
            Some((start, end)) => p.payment_date >= start && p.payment_date <= end,
            None => true,
        })
        .map(|p| p.amount)
        .sum();

    let all_time_paid: Decimal = payments.iter().map(|p| p.amount).sum();
    let outstanding_balance = active_contract_value - all_time_paid;
    let collection_rate = if active_contract_value > Decimal::ZERO {
        all_time_paid / active_contract_value * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap();
    let mtd_revenue: Decimal = payments
        .iter()
        .filter(|p| p.payment_date >= month_start)
        .map(|p| p.amount)
        .sum();

    debug!(%period_revenue, %outstanding_balance, "Dashboard stats computed");
    Ok(DashboardStats {
        period_revenue,
        period_projects,
        period_clients,
        active_clients,
        outstanding_balance,
        collection_rate,
        mtd_revenue,
    })
}

/// Fetches all payments and buckets them into the given year's chart.
#[instrument(skip(db))]
pub async fn revenue_chart_for_year(
    db: &DatabaseConnection,
    year: i32,
) -> Result<Vec<RevenuePoint>> {
    let payments = payment::Entity::find()
        .order_by_asc(payment::Column::PaymentDate)
        .all(db)
        .await?;
    Ok(revenue_chart(&payments, year))
}

/// Per-client outstanding positions over active projects, largest first.
#[instrument(skip(db))]
pub async fn outstanding_by_client(db: &DatabaseConnection) -> Result<Vec<OutstandingClient>> {
    let rows = project::Entity::find()
        .filter(project::Column::Status.eq(project::ProjectStatus::Active))
        .find_with_related(payment::Entity)
        .all(db)
        .await?;

    let client_names: HashMap<i32, String> = client::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    Ok(fold_outstanding(&rows, &client_names))
}

/// The most recently onboarded clients, newest first.
#[instrument(skip(db))]
pub async fn latest_registrations(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<client::Model>> {
    Ok(client::Entity::find()
        .order_by_desc(client::Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?)
}

/// The most recent payments with their projects, newest first.
#[instrument(skip(db))]
pub async fn latest_payments(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<(payment::Model, Option<project::Model>)>> {
    Ok(payment::Entity::find()
        .find_also_related(project::Entity)
        .order_by_desc(payment::Column::PaymentDate)
        .limit(limit)
        .all(db)
        .await?)
}
