use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The structured reading of a dream as produced by the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Interpretation {
    /// One or two sentences capturing the essence of the dream.
    pub dream_summary: String,
    /// Short keywords naming the dream's main motifs.
    pub tags: Vec<String>,
    /// The overall emotional tone of the dream.
    pub mood: String,
    /// What the central images commonly stand for.
    pub symbolism: String,
    /// A gentle psychological reading of the dream.
    pub psychological_perspective: String,
    /// Questions inviting the dreamer to reflect.
    pub reflective_prompts: Vec<String>,
    /// The voice of the interpretation, for example reassuring or curious.
    pub tone: String,
    /// Link to a generated illustration, if one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
