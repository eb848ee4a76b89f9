use crate::interpretation::Interpretation;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum EntryConversionError {
    #[error("stored interpretation is not valid interpretation data")]
    Interpretation(#[from] serde_json::Error),
}

/// A single journaled dream as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JournalEntry {
    pub id: i32,
    pub user_id: String,
    pub dream_text: String,
    pub interpretation: Interpretation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl TryFrom<yume_entity::dream::Model> for JournalEntry {
    type Error = EntryConversionError;

    fn try_from(model: yume_entity::dream::Model) -> Result<Self, Self::Error> {
        let interpretation = serde_json::from_value(model.interpretation)?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            dream_text: model.dream_text,
            interpretation,
            image_url: model.image_url,
            created_at: model.created_at,
        })
    }
}
