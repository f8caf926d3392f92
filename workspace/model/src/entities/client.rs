use sea_orm::entity::prelude::*;

/// Lifecycle status of a client relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ClientStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "churned")]
    Churned,
}

/// A client of the business. Financial figures (CLTV, remaining balance)
/// are derived from its projects and payments on every read, never stored.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    /// Where the lead came from (referral, web, ...).
    pub source: Option<String>,
    /// The agent responsible for this client, if any.
    pub assigned_agent_id: Option<i32>,
    pub status: ClientStatus,
    pub notes: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::AssignedAgentId",
        to = "super::profile::Column::Id",
        on_delete = "SetNull"
    )]
    AssignedAgent,
    #[sea_orm(has_many = "super::project::Entity")]
    Project,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedAgent.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
