use sea_orm::entity::prelude::*;

/// A journaled dream together with the interpretation it received.
///
/// The table is append only, rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "dreams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    #[sea_orm(column_type = "Text")]
    pub dream_text: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub interpretation: Json,
    pub image_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}
