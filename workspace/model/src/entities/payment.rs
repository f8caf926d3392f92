use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Money received against a project. Always positive; an overpayment is
/// accepted and simply drives the derived outstanding balance negative.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    /// Which bank account received the money, if recorded.
    pub bank_account_id: Option<i32>,
    /// Income category the payment is booked under, if any.
    pub category_id: Option<i32>,
    #[sea_orm(default_value = "false")]
    pub is_verified: bool,
    pub note: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::bank_account::Entity",
        from = "Column::BankAccountId",
        to = "super::bank_account::Column::Id",
        on_delete = "SetNull"
    )]
    BankAccount,
    #[sea_orm(
        belongs_to = "super::income_category::Entity",
        from = "Column::CategoryId",
        to = "super::income_category::Column::Id",
        on_delete = "SetNull"
    )]
    IncomeCategory,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::bank_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccount.def()
    }
}

impl Related<super::income_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncomeCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
