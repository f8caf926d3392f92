//! Team leaderboard: every sales agent ranked by current-month target
//! achievement.

use chrono::{Datelike, NaiveDate};
use common::LeaderboardEntry;
use model::entities::{profile, sales_target};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::performance::{achievement, month_bounds, month_performance, AgentSelector};

/// Ranks every sales agent by MTD achievement for the month of `reference`.
///
/// The month's monthly targets are fetched once for all agents up front;
/// an agent without a target gets achievement 0 and therefore sorts to the
/// bottom (the sort is stable, so equal achievements keep name order).
#[instrument(skip(db))]
pub async fn team_leaderboard(
    db: &DatabaseConnection,
    reference: NaiveDate,
) -> Result<Vec<LeaderboardEntry>> {
    let year = reference.year();
    let month = reference.month();
    let (month_start, month_end) = month_bounds(year, month);

    let agents = profile::Entity::find()
        .filter(profile::Column::Role.eq(profile::ProfileRole::SalesAgent))
        .order_by_asc(profile::Column::FullName)
        .all(db)
        .await?;

    // One bulk fetch of the month's targets instead of per-agent queries
    let targets = sales_target::Entity::find()
        .filter(sales_target::Column::PeriodType.eq(sales_target::PeriodType::Monthly))
        .filter(sales_target::Column::StartDate.gte(month_start))
        .filter(sales_target::Column::StartDate.lte(month_end))
        .all(db)
        .await?;
    debug!(
        agents = agents.len(),
        targets = targets.len(),
        "Building leaderboard"
    );

    let mut entries = Vec::with_capacity(agents.len());
    for agent in agents {
        let perf = month_performance(db, AgentSelector::Agent(agent.id), year, month).await?;
        let target = targets
            .iter()
            .find(|t| t.agent_id == agent.id)
            .map(|t| t.target_amount)
            .unwrap_or(Decimal::ZERO);

        entries.push(LeaderboardEntry {
            agent_id: agent.id,
            agent_name: agent.full_name,
            mtd_collected: perf.collections,
            mtd_target: target,
            mtd_achievement: achievement(perf.collections, target),
            project_count: perf.project_count,
            is_winner: false,
        });
    }

    entries.sort_by(|a, b| b.mtd_achievement.cmp(&a.mtd_achievement));
    if let Some(idx) = winner_index(&entries) {
        entries[idx].is_winner = true;
    }
    Ok(entries)
}

/// Index of the entry that should carry the winner marker: the top rank,
/// but only when it actually achieved something. A leaderboard where
/// nobody has any data has no winner.
pub fn winner_index(entries: &[LeaderboardEntry]) -> Option<usize> {
    match entries.first() {
        Some(first) if first.mtd_achievement > Decimal::ZERO => Some(0),
        _ => None,
    }
}
