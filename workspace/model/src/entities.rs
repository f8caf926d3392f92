//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the CRM dashboard here: the client
//! directory, the project/payment ledger, agent profiles and their sales
//! targets, plus the two small lookup tables used by the income ledger.

pub mod bank_account;
pub mod client;
pub mod income_category;
pub mod payment;
pub mod profile;
pub mod project;
pub mod sales_target;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::bank_account::Entity as BankAccount;
    pub use super::client::Entity as Client;
    pub use super::income_category::Entity as IncomeCategory;
    pub use super::payment::Entity as Payment;
    pub use super::profile::Entity as Profile;
    pub use super::project::Entity as Project;
    pub use super::sales_target::Entity as SalesTarget;
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        // Try to apply migrations first
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        // Setup database
        let db = setup_db().await?;

        let now = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        // Create an admin and a sales agent
        let admin = profile::ActiveModel {
            full_name: Set(Some("Head Office".to_string())),
            role: Set(profile::ProfileRole::Admin),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let agent = profile::ActiveModel {
            full_name: Set(Some("Dana Sales".to_string())),
            role: Set(profile::ProfileRole::SalesAgent),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create a client assigned to the agent
        let client1 = client::ActiveModel {
            name: Set("Acme Corp".to_string()),
            email: Set(Some("contact@acme.example".to_string())),
            company: Set(Some("Acme".to_string())),
            industry: Set(Some("Manufacturing".to_string())),
            assigned_agent_id: Set(Some(agent.id)),
            status: Set(client::ClientStatus::Active),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create a project for the client, sold by the agent
        let project1 = project::ActiveModel {
            client_id: Set(client1.id),
            agent_id: Set(Some(agent.id)),
            name: Set("Website relaunch".to_string()),
            total_amount: Set(Decimal::new(150000, 2)), // 1500.00
            status: Set(project::ProjectStatus::Active),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create a bank account and an income category
        let bank = bank_account::ActiveModel {
            name: Set("Business Checking".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let category = income_category::ActiveModel {
            name: Set("Services".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Record a payment against the project
        let payment1 = payment::ActiveModel {
            project_id: Set(project1.id),
            amount: Set(Decimal::new(40000, 2)), // 400.00
            payment_date: Set(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()),
            bank_account_id: Set(Some(bank.id)),
            category_id: Set(Some(category.id)),
            is_verified: Set(true),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Set a monthly target for the agent
        let target = sales_target::ActiveModel {
            agent_id: Set(agent.id),
            period_type: Set(sales_target::PeriodType::Monthly),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            end_date: Set(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()),
            target_amount: Set(Decimal::new(1000000, 2)), // 10000.00
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify data

        let profiles = Profile::find().all(&db).await?;
        assert_eq!(profiles.len(), 2);
        assert!(profiles.iter().any(|p| p.id == admin.id));
        assert!(
            profiles
                .iter()
                .any(|p| p.role == profile::ProfileRole::SalesAgent)
        );

        let clients = Client::find().all(&db).await?;
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].assigned_agent_id, Some(agent.id));

        let projects = Project::find().all(&db).await?;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].total_amount, Decimal::new(150000, 2));

        let payments = Payment::find().all(&db).await?;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].project_id, project1.id);
        assert_eq!(payments[0].bank_account_id, Some(bank.id));
        assert_eq!(payments[0].category_id, Some(category.id));

        let targets = SalesTarget::find().all(&db).await?;
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id, target.id);
        assert_eq!(targets[0].agent_id, agent.id);

        // Verify the unique key on (agent_id, period_type, start_date) rejects
        // a second monthly target for the same month
        let duplicate = sales_target::ActiveModel {
            agent_id: Set(agent.id),
            period_type: Set(sales_target::PeriodType::Monthly),
            start_date: Set(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            end_date: Set(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()),
            target_amount: Set(Decimal::new(1200000, 2)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(duplicate.is_err());

        // Fetch projects with their payments through the relation
        let with_payments = Project::find()
            .find_with_related(Payment)
            .all(&db)
            .await?;
        assert_eq!(with_payments.len(), 1);
        assert_eq!(with_payments[0].1.len(), 1);
        assert_eq!(with_payments[0].1[0].id, payment1.id);

        // Fetch payments of the agent's projects via the project join
        let agent_payments = Payment::find()
            .join(JoinType::InnerJoin, payment::Relation::Project.def())
            .filter(project::Column::AgentId.eq(agent.id))
            .all(&db)
            .await?;
        assert_eq!(agent_payments.len(), 1);
        assert_eq!(agent_payments[0].amount, Decimal::new(40000, 2));

        Ok(())
    }
}
