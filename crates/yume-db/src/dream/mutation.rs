use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};
use std::error::Error;
use yume_entity::dream;

pub struct Mutation;

impl Mutation {
    /// Appends a journal entry. Entries are never updated afterwards.
    ///
    /// The interpretation is stored exactly as handed in.
    pub async fn append(
        db: &DatabaseConnection,
        user_id: &str,
        dream_text: &str,
        interpretation: serde_json::Value,
        image_url: Option<String>,
    ) -> Result<dream::Model, DbErr> {
        let entry = dream::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id.to_owned()),
            dream_text: ActiveValue::Set(dream_text.to_owned()),
            interpretation: ActiveValue::Set(interpretation),
            image_url: ActiveValue::Set(image_url),
            created_at: ActiveValue::Set(Utc::now().fixed_offset()),
        };
        entry
            .insert(db)
            .await
            .inspect_err(|error| tracing::error!(error = error as &dyn Error, "failed to append journal entry"))
    }
}
