//! Aggregation core of the CRM dashboard.
//!
//! Every derived figure the API serves is computed here, from rows the
//! store layer fetched: client financials (CLTV, outstanding), the landing
//! dashboard metrics and revenue chart, agent period performance
//! (MTD/QTD/YTD), the yearly breakdown, and the team leaderboard. The
//! reductions themselves are pure functions over row slices; the async
//! entry points only fetch and delegate.

pub mod client_stats;
pub mod dashboard;
pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod performance;

#[cfg(test)]
mod db_tests {
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use model::entities::{client, payment, profile, project, sales_target};
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

    use crate::client_stats::financials_for_client;
    use crate::dashboard::outstanding_by_client;
    use crate::leaderboard::team_leaderboard;
    use crate::performance::{full_performance, month_performance, AgentSelector};

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None).await.expect("Migrations failed.");
        db
    }

    fn at(year: i32, month: u32, day: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    async fn seed_agent(db: &DatabaseConnection, name: &str) -> profile::Model {
        profile::ActiveModel {
            full_name: Set(Some(name.to_string())),
            role: Set(profile::ProfileRole::SalesAgent),
            created_at: Set(at(2024, 1, 1)),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create agent")
    }

    async fn seed_client(db: &DatabaseConnection, name: &str) -> client::Model {
        client::ActiveModel {
            name: Set(name.to_string()),
            status: Set(client::ClientStatus::Active),
            created_at: Set(at(2024, 1, 1)),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create client")
    }

    async fn seed_project(
        db: &DatabaseConnection,
        client_id: i32,
        agent_id: Option<i32>,
        total: i64,
        created: chrono::NaiveDateTime,
    ) -> project::Model {
        project::ActiveModel {
            client_id: Set(client_id),
            agent_id: Set(agent_id),
            name: Set("Project".to_string()),
            total_amount: Set(Decimal::new(total, 0)),
            status: Set(project::ProjectStatus::Active),
            start_date: Set(created.date()),
            created_at: Set(created),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create project")
    }

    async fn seed_payment(
        db: &DatabaseConnection,
        project_id: i32,
        amount: i64,
        date: NaiveDate,
    ) -> payment::Model {
        payment::ActiveModel {
            project_id: Set(project_id),
            amount: Set(Decimal::new(amount, 0)),
            payment_date: Set(date),
            created_at: Set(date.and_hms_opt(12, 0, 0).unwrap()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create payment")
    }

    async fn seed_monthly_target(
        db: &DatabaseConnection,
        agent_id: i32,
        year: i32,
        month: u32,
        amount: i64,
    ) -> sales_target::Model {
        let (start, end) = crate::performance::month_bounds(year, month);
        sales_target::ActiveModel {
            agent_id: Set(agent_id),
            period_type: Set(sales_target::PeriodType::Monthly),
            start_date: Set(start),
            end_date: Set(end),
            target_amount: Set(Decimal::new(amount, 0)),
            created_at: Set(start.and_hms_opt(0, 0, 0).unwrap()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create target")
    }

    /// Collections are joined by project ownership: another agent's payment
    /// in the same month must not leak into this agent's numbers.
    #[tokio::test]
    async fn month_performance_joins_by_project_ownership() {
        let db = setup_db().await;
        let agent_a = seed_agent(&db, "Agent A").await;
        let agent_b = seed_agent(&db, "Agent B").await;
        let c = seed_client(&db, "Acme").await;

        let p_a = seed_project(&db, c.id, Some(agent_a.id), 3000, at(2024, 5, 3)).await;
        let p_b = seed_project(&db, c.id, Some(agent_b.id), 999, at(2024, 5, 4)).await;
        seed_payment(&db, p_a.id, 400, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()).await;
        seed_payment(&db, p_b.id, 111, NaiveDate::from_ymd_opt(2024, 5, 11).unwrap()).await;
        // Outside the month window
        seed_payment(&db, p_a.id, 777, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).await;

        let perf = month_performance(&db, AgentSelector::Agent(agent_a.id), 2024, 5)
            .await
            .unwrap();
        assert_eq!(perf.sales, Decimal::new(3000, 0));
        assert_eq!(perf.collections, Decimal::new(400, 0));
        assert_eq!(perf.project_count, 1);

        let company = month_performance(&db, AgentSelector::All, 2024, 5)
            .await
            .unwrap();
        assert_eq!(company.sales, Decimal::new(3999, 0));
        assert_eq!(company.collections, Decimal::new(511, 0));
        assert_eq!(company.project_count, 2);
    }

    /// MTD/QTD/YTD rollups count each month exactly once and never sum
    /// targets of months after the reference month.
    #[tokio::test]
    async fn full_performance_rollups() {
        let db = setup_db().await;
        let agent = seed_agent(&db, "Agent A").await;
        let c = seed_client(&db, "Acme").await;

        // March has a target but no activity; June's target must never count.
        seed_monthly_target(&db, agent.id, 2024, 3, 1000).await;
        seed_monthly_target(&db, agent.id, 2024, 4, 1000).await;
        seed_monthly_target(&db, agent.id, 2024, 5, 2000).await;
        seed_monthly_target(&db, agent.id, 2024, 6, 99999).await;

        let p_apr = seed_project(&db, c.id, Some(agent.id), 3000, at(2024, 4, 10)).await;
        seed_project(&db, c.id, Some(agent.id), 1500, at(2024, 5, 5)).await;
        seed_payment(&db, p_apr.id, 800, NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()).await;
        seed_payment(&db, p_apr.id, 400, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()).await;

        let reference = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let perf = full_performance(&db, AgentSelector::Agent(agent.id), reference)
            .await
            .unwrap();

        assert_eq!(perf.mtd.sales, Decimal::new(1500, 0));
        assert_eq!(perf.mtd.collections, Decimal::new(400, 0));
        assert_eq!(perf.mtd.project_count, 1);
        assert_eq!(perf.mtd.target, Decimal::new(2000, 0));
        assert_eq!(perf.mtd.achievement, Decimal::new(20, 0));

        // QTD = April + May only
        assert_eq!(perf.qtd.sales, Decimal::new(4500, 0));
        assert_eq!(perf.qtd.collections, Decimal::new(1200, 0));
        assert_eq!(perf.qtd.project_count, 2);
        assert_eq!(perf.qtd.target, Decimal::new(3000, 0));
        assert_eq!(perf.qtd.achievement, Decimal::new(40, 0));

        // YTD adds March's idle target but nothing from June
        assert_eq!(perf.ytd.sales, Decimal::new(4500, 0));
        assert_eq!(perf.ytd.collections, Decimal::new(1200, 0));
        assert_eq!(perf.ytd.target, Decimal::new(4000, 0));
        assert_eq!(perf.ytd.achievement, Decimal::new(30, 0));
    }

    /// An agent with no target for a month gets achievement exactly zero
    /// even with collections on the books.
    #[tokio::test]
    async fn no_target_means_zero_achievement() {
        let db = setup_db().await;
        let agent = seed_agent(&db, "Agent A").await;
        let c = seed_client(&db, "Acme").await;
        let p = seed_project(&db, c.id, Some(agent.id), 5000, at(2024, 5, 3)).await;
        seed_payment(&db, p.id, 2500, NaiveDate::from_ymd_opt(2024, 5, 8).unwrap()).await;

        let reference = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let perf = full_performance(&db, AgentSelector::Agent(agent.id), reference)
            .await
            .unwrap();
        assert_eq!(perf.mtd.collections, Decimal::new(2500, 0));
        assert_eq!(perf.mtd.target, Decimal::ZERO);
        assert_eq!(perf.mtd.achievement, Decimal::ZERO);
    }

    #[tokio::test]
    async fn leaderboard_ranks_by_achievement() {
        let db = setup_db().await;
        let agent_a = seed_agent(&db, "Alice").await;
        let agent_b = seed_agent(&db, "Bob").await;
        let c = seed_client(&db, "Acme").await;

        // Alice: 500 of 1000 (50%); Bob: 900 of 3000 (30%)
        seed_monthly_target(&db, agent_a.id, 2024, 5, 1000).await;
        seed_monthly_target(&db, agent_b.id, 2024, 5, 3000).await;
        let p_a = seed_project(&db, c.id, Some(agent_a.id), 1000, at(2024, 5, 1)).await;
        let p_b = seed_project(&db, c.id, Some(agent_b.id), 3000, at(2024, 5, 1)).await;
        seed_payment(&db, p_a.id, 500, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()).await;
        seed_payment(&db, p_b.id, 900, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()).await;

        let reference = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let board = team_leaderboard(&db, reference).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].agent_id, agent_a.id);
        assert_eq!(board[0].mtd_achievement, Decimal::new(50, 0));
        assert!(board[0].is_winner);
        assert_eq!(board[1].agent_id, agent_b.id);
        assert_eq!(board[1].mtd_achievement, Decimal::new(30, 0));
        assert!(!board[1].is_winner);
    }

    #[tokio::test]
    async fn client_financials_round_trip() {
        let db = setup_db().await;
        let c = seed_client(&db, "Acme").await;
        let p1 = seed_project(&db, c.id, None, 1000, at(2024, 2, 1)).await;
        seed_project(&db, c.id, None, 500, at(2024, 2, 2)).await;
        seed_payment(&db, p1.id, 400, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).await;
        seed_payment(&db, p1.id, 300, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()).await;

        let fin = financials_for_client(&db, c.id).await.unwrap();
        assert_eq!(fin.cltv, Decimal::new(1500, 0));
        assert_eq!(fin.total_paid, Decimal::new(700, 0));
        assert_eq!(fin.remaining_balance, Decimal::new(800, 0));

        let outstanding = outstanding_by_client(&db).await.unwrap();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].client_name, "Acme");
        assert_eq!(outstanding[0].outstanding, Decimal::new(800, 0));
        assert_eq!(outstanding[0].project_count, 2);
    }
}
