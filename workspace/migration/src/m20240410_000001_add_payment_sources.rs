use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create bank_accounts table
        manager
            .create_table(
                Table::create()
                    .table(BankAccounts::Table)
                    .if_not_exists()
                    .col(pk_auto(BankAccounts::Id))
                    .col(string(BankAccounts::Name).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create income_categories table
        manager
            .create_table(
                Table::create()
                    .table(IncomeCategories::Table)
                    .if_not_exists()
                    .col(pk_auto(IncomeCategories::Id))
                    .col(string(IncomeCategories::Name).unique_key())
                    .to_owned(),
            )
            .await?;

        // Extend payments with the income ledger bookkeeping columns.
        // Added without foreign key constraints so the ALTER also works on
        // SQLite; referential handling lives in the entity relations.
        manager
            .alter_table(
                Table::alter()
                    .table(Payments::Table)
                    .add_column(string_null(Payments::PaymentMethod))
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Payments::Table)
                    .add_column(integer_null(Payments::BankAccountId))
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Payments::Table)
                    .add_column(integer_null(Payments::CategoryId))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Payments::Table)
                    .drop_column(Payments::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Payments::Table)
                    .drop_column(Payments::BankAccountId)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Payments::Table)
                    .drop_column(Payments::PaymentMethod)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(IncomeCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankAccounts::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum BankAccounts {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum IncomeCategories {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    PaymentMethod,
    BankAccountId,
    CategoryId,
}
