use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "features")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Canonical JSON text; NULL when the flag carries no value.
    #[sea_orm(column_type = "Text", nullable)]
    pub value: Option<String>,

    pub resource_id: String,

    pub active: bool,

    /// RFC 3339, written once on insert.
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
