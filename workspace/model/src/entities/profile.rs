use sea_orm::entity::prelude::*;

/// Role of a profile within the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProfileRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "sales_agent")]
    SalesAgent,
}

/// A person using or referenced by the system: an administrator or a
/// sales agent. Sales agents own projects and carry sales targets.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub full_name: Option<String>,
    pub role: ProfileRole,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Clients assigned to this agent.
    #[sea_orm(has_many = "super::client::Entity")]
    Client,
    /// Projects this agent sold.
    #[sea_orm(has_many = "super::project::Entity")]
    Project,
    /// Sales targets set for this agent.
    #[sea_orm(has_many = "super::sales_target::Entity")]
    SalesTarget,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::sales_target::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesTarget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
