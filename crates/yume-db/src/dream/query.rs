use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use std::error::Error;
use yume_entity::dream;

pub struct Query;

impl Query {
    /// All journal entries of one user, newest first.
    pub async fn list_for_user(db: &DatabaseConnection, user_id: &str) -> Result<Vec<dream::Model>, DbErr> {
        dream::Entity::find()
            .filter(dream::Column::UserId.eq(user_id))
            .order_by_desc(dream::Column::CreatedAt)
            .all(db)
            .await
            .inspect_err(|error| tracing::error!(error = error as &dyn Error, "failed to load user journal entries"))
    }
}
