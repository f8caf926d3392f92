//! Client financial aggregation.
//!
//! Everything derived about a client's money is computed here from rows the
//! store already joined: CLTV (sum of contract values over all of the
//! client's projects, whatever their status), total paid, and the remaining
//! balance. Nothing is clamped; an overpaid client simply has a negative
//! remaining balance.

use common::ClientSummary;
use model::entities::{payment, project};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::instrument;

use crate::error::Result;

/// Derived financial figures of one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientFinancials {
    /// Client lifetime value: sum of contract values over all projects.
    pub cltv: Decimal,
    /// Sum of all payments against the client's projects.
    pub total_paid: Decimal,
    /// `cltv - total_paid`; negative on overpayment.
    pub remaining_balance: Decimal,
}

/// A project augmented with its derived payment totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectWithTotals {
    pub project: project::Model,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub payment_count: u64,
}

/// A payment joined with the name of the project it was made against.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientPaymentRow {
    pub payment: payment::Model,
    pub project_name: String,
}

/// Reduces a client's projects (each with its payments) into the derived
/// financial figures. A client with zero projects yields all zeros.
pub fn client_financials(projects: &[(project::Model, Vec<payment::Model>)]) -> ClientFinancials {
    let cltv: Decimal = projects.iter().map(|(p, _)| p.total_amount).sum();
    let total_paid: Decimal = projects
        .iter()
        .flat_map(|(_, payments)| payments.iter())
        .map(|pay| pay.amount)
        .sum();

    ClientFinancials {
        cltv,
        total_paid,
        remaining_balance: cltv - total_paid,
    }
}

/// Derives `(paid_amount, remaining_amount)` for one project.
pub fn project_totals(total_amount: Decimal, payments: &[payment::Model]) -> (Decimal, Decimal) {
    let paid: Decimal = payments.iter().map(|p| p.amount).sum();
    (paid, total_amount - paid)
}

/// Fetches one client's derived financials.
#[instrument(skip(db))]
pub async fn financials_for_client(
    db: &DatabaseConnection,
    client_id: i32,
) -> Result<ClientFinancials> {
    let projects = project::Entity::find()
        .filter(project::Column::ClientId.eq(client_id))
        .find_with_related(payment::Entity)
        .all(db)
        .await?;
    Ok(client_financials(&projects))
}

/// Fetches a client's projects with paid/remaining amounts, newest first.
#[instrument(skip(db))]
pub async fn client_projects(
    db: &DatabaseConnection,
    client_id: i32,
) -> Result<Vec<ProjectWithTotals>> {
    let projects = project::Entity::find()
        .filter(project::Column::ClientId.eq(client_id))
        .find_with_related(payment::Entity)
        .all(db)
        .await?;

    let mut rows: Vec<ProjectWithTotals> = projects
        .into_iter()
        .map(|(p, payments)| {
            let (paid_amount, remaining_amount) = project_totals(p.total_amount, &payments);
            ProjectWithTotals {
                paid_amount,
                remaining_amount,
                payment_count: payments.len() as u64,
                project: p,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.project.created_at.cmp(&a.project.created_at));

    Ok(rows)
}

/// Fetches a client's payments joined with their project names,
/// newest first.
#[instrument(skip(db))]
pub async fn client_payments(
    db: &DatabaseConnection,
    client_id: i32,
) -> Result<Vec<ClientPaymentRow>> {
    let payments = payment::Entity::find()
        .find_also_related(project::Entity)
        .filter(project::Column::ClientId.eq(client_id))
        .order_by_desc(payment::Column::PaymentDate)
        .all(db)
        .await?;

    let rows = payments
        .into_iter()
        .map(|(pay, proj)| ClientPaymentRow {
            payment: pay,
            project_name: proj.map(|p| p.name).unwrap_or_else(|| "Unknown".to_string()),
        })
        .collect();

    Ok(rows)
}

/// Summarizes one client: project counts, contract value, paid, outstanding.
#[instrument(skip(db))]
pub async fn client_summary(db: &DatabaseConnection, client_id: i32) -> Result<ClientSummary> {
    let projects = client_projects(db, client_id).await?;

    let total_payments: u64 = projects.iter().map(|p| p.payment_count).sum();
    Ok(ClientSummary {
        total_projects: projects.len() as u64,
        active_projects: projects
            .iter()
            .filter(|p| p.project.status == project::ProjectStatus::Active)
            .count() as u64,
        total_contract_value: projects.iter().map(|p| p.project.total_amount).sum(),
        total_paid: projects.iter().map(|p| p.paid_amount).sum(),
        total_outstanding: projects.iter().map(|p| p.remaining_amount).sum(),
        total_payments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn project(id: i32, client_id: i32, total: Decimal) -> project::Model {
        project::Model {
            id,
            client_id,
            agent_id: None,
            name: format!("Project {id}"),
            description: None,
            total_amount: total,
            status: project::ProjectStatus::Active,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn pay(id: i32, project_id: i32, amount: Decimal) -> payment::Model {
        payment::Model {
            id,
            project_id,
            amount,
            payment_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            payment_method: None,
            bank_account_id: None,
            category_id: None,
            is_verified: false,
            note: None,
            created_at: NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn end_to_end_scenario() {
        // Project A: 1000 with payments 400 + 300; Project B: 500 unpaid.
        let rows = vec![
            (
                project(1, 7, Decimal::new(1000, 0)),
                vec![pay(1, 1, Decimal::new(400, 0)), pay(2, 1, Decimal::new(300, 0))],
            ),
            (project(2, 7, Decimal::new(500, 0)), vec![]),
        ];

        let fin = client_financials(&rows);
        assert_eq!(fin.cltv, Decimal::new(1500, 0));
        assert_eq!(fin.total_paid, Decimal::new(700, 0));
        assert_eq!(fin.remaining_balance, Decimal::new(800, 0));

        let (paid_a, remaining_a) = project_totals(rows[0].0.total_amount, &rows[0].1);
        assert_eq!(paid_a, Decimal::new(700, 0));
        assert_eq!(remaining_a, Decimal::new(300, 0));

        let (paid_b, remaining_b) = project_totals(rows[1].0.total_amount, &rows[1].1);
        assert_eq!(paid_b, Decimal::ZERO);
        assert_eq!(remaining_b, Decimal::new(500, 0));
    }

    #[test]
    fn zero_projects_yield_zeros() {
        let fin = client_financials(&[]);
        assert_eq!(fin.cltv, Decimal::ZERO);
        assert_eq!(fin.total_paid, Decimal::ZERO);
        assert_eq!(fin.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn overpayment_goes_negative() {
        // The formula is asserted as-is; remaining balance is not floored.
        let rows = vec![(
            project(1, 1, Decimal::new(100, 0)),
            vec![pay(1, 1, Decimal::new(250, 0))],
        )];
        let fin = client_financials(&rows);
        assert_eq!(fin.remaining_balance, Decimal::new(-150, 0));
        assert!(fin.remaining_balance < fin.cltv);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rows = vec![(
            project(1, 1, Decimal::new(1234, 2)),
            vec![pay(1, 1, Decimal::new(567, 2))],
        )];
        let first = client_financials(&rows);
        let second = client_financials(&rows);
        assert_eq!(first, second);
    }
}
