//! Project ledger assembly: every project flattened into one row with its
//! client and agent names resolved and paid/remaining amounts derived.

use std::collections::HashMap;

use common::ProjectLedgerRow;
use model::entities::{client, payment, profile, project};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::instrument;

use crate::client_stats::project_totals;
use crate::error::Result;

/// A single project with its payments and derived totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDetail {
    pub project: project::Model,
    pub payments: Vec<payment::Model>,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
}

/// Builds ledger rows from already-fetched projects and name lookups.
pub fn ledger_rows(
    rows: Vec<(project::Model, Vec<payment::Model>)>,
    client_names: &HashMap<i32, String>,
    agent_names: &HashMap<i32, Option<String>>,
) -> Vec<ProjectLedgerRow> {
    let mut out: Vec<ProjectLedgerRow> = rows
        .into_iter()
        .map(|(p, payments)| {
            let (paid_amount, remaining_amount) = project_totals(p.total_amount, &payments);
            ProjectLedgerRow {
                project_id: p.id,
                project_name: p.name,
                client_id: p.client_id,
                client_name: client_names
                    .get(&p.client_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown Client".to_string()),
                total_amount: p.total_amount,
                paid_amount,
                remaining_amount,
                agent_id: p.agent_id,
                agent_name: p.agent_id.and_then(|id| agent_names.get(&id).cloned().flatten()),
                status: match p.status {
                    project::ProjectStatus::Active => "active",
                    project::ProjectStatus::Completed => "completed",
                    project::ProjectStatus::Cancelled => "cancelled",
                    project::ProjectStatus::OnHold => "on_hold",
                }
                .to_string(),
                created_at: p.created_at,
            }
        })
        .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out
}

/// Fetches the full project ledger, newest projects first.
#[instrument(skip(db))]
pub async fn project_ledger(db: &DatabaseConnection) -> Result<Vec<ProjectLedgerRow>> {
    let rows = project::Entity::find()
        .find_with_related(payment::Entity)
        .all(db)
        .await?;

    let client_names: HashMap<i32, String> = client::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let agent_names: HashMap<i32, Option<String>> = profile::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.full_name))
        .collect();

    Ok(ledger_rows(rows, &client_names, &agent_names))
}

/// Fetches one project with its payments and derived totals, or `None`.
#[instrument(skip(db))]
pub async fn project_detail(
    db: &DatabaseConnection,
    project_id: i32,
) -> Result<Option<ProjectDetail>> {
    let mut rows = project::Entity::find_by_id(project_id)
        .find_with_related(payment::Entity)
        .all(db)
        .await?;

    Ok(rows.pop().map(|(p, payments)| {
        let (paid_amount, remaining_amount) = project_totals(p.total_amount, &payments);
        ProjectDetail {
            project: p,
            payments,
            paid_amount,
            remaining_amount,
        }
    }))
}
