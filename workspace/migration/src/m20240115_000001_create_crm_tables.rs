use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create profiles table
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(pk_auto(Profiles::Id))
                    .col(string_null(Profiles::FullName))
                    .col(string_len(Profiles::Role, 20))
                    .col(date_time(Profiles::CreatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // Create clients table
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(pk_auto(Clients::Id))
                    .col(string(Clients::Name))
                    .col(string_null(Clients::Email))
                    .col(string_null(Clients::Phone))
                    .col(string_null(Clients::Address))
                    .col(string_null(Clients::Company))
                    .col(string_null(Clients::Industry))
                    .col(string_null(Clients::Source))
                    .col(integer_null(Clients::AssignedAgentId))
                    .col(string_len(Clients::Status, 20))
                    .col(string_null(Clients::Notes))
                    .col(date_time(Clients::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_assigned_agent")
                            .from(Clients::Table, Clients::AssignedAgentId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create projects table
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(pk_auto(Projects::Id))
                    .col(integer(Projects::ClientId))
                    .col(integer_null(Projects::AgentId))
                    .col(string(Projects::Name))
                    .col(string_null(Projects::Description))
                    .col(decimal_len(Projects::TotalAmount, 16, 4))
                    .col(string_len(Projects::Status, 20))
                    .col(date(Projects::StartDate))
                    .col(date_null(Projects::EndDate))
                    .col(date_time(Projects::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_client")
                            .from(Projects::Table, Projects::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_agent")
                            .from(Projects::Table, Projects::AgentId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::ProjectId))
                    .col(decimal_len(Payments::Amount, 16, 4))
                    .col(date(Payments::PaymentDate))
                    .col(boolean(Payments::IsVerified).default(false))
                    .col(string_null(Payments::Note))
                    .col(date_time(Payments::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_project")
                            .from(Payments::Table, Payments::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create sales_targets table
        manager
            .create_table(
                Table::create()
                    .table(SalesTargets::Table)
                    .if_not_exists()
                    .col(pk_auto(SalesTargets::Id))
                    .col(integer(SalesTargets::AgentId))
                    .col(string_len(SalesTargets::PeriodType, 20))
                    .col(date(SalesTargets::StartDate))
                    .col(date(SalesTargets::EndDate))
                    .col(decimal_len(SalesTargets::TargetAmount, 16, 4))
                    .col(date_time(SalesTargets::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_target_agent")
                            .from(SalesTargets::Table, SalesTargets::AgentId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One target per (agent, period type, period start). Monthly targets
        // are normalized to start on the first of the month before writing,
        // so this index is the upsert conflict key.
        manager
            .create_index(
                Index::create()
                    .name("ux_sales_targets_agent_period_start")
                    .table(SalesTargets::Table)
                    .col(SalesTargets::AgentId)
                    .col(SalesTargets::PeriodType)
                    .col(SalesTargets::StartDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SalesTargets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    FullName,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Address,
    Company,
    Industry,
    Source,
    AssignedAgentId,
    Status,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    ClientId,
    AgentId,
    Name,
    Description,
    TotalAmount,
    Status,
    StartDate,
    EndDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    ProjectId,
    Amount,
    PaymentDate,
    IsVerified,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SalesTargets {
    Table,
    Id,
    AgentId,
    PeriodType,
    StartDate,
    EndDate,
    TargetAmount,
    CreatedAt,
}
