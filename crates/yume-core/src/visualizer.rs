use crate::llm::LlmClient;
use crate::openai::error::OpenAiError;
use async_openai::types::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize};
use thiserror::Error;
use tracing::instrument;
use yume_model::interpretation::Interpretation;

#[derive(Error, Debug)]
pub enum VisualizeError {
    #[error("The scene description is empty")]
    EmptyDescription,

    #[error("The generated image carries no url")]
    MissingUrl,

    #[error(transparent)]
    OpenAi(#[from] OpenAiError),
}

fn image_prompt(description: &str) -> String {
    format!(
        "A surreal, artistic, and abstract representation of this dream: {description}. \
         Style: Mystical, deep colors, digital art, dreamscape. No text."
    )
}

/// Condenses an interpretation into a scene description for the image model.
#[must_use]
pub fn describe(interpretation: &Interpretation) -> String {
    let mut description = interpretation.dream_summary.clone();
    if !interpretation.tags.is_empty() {
        description.push_str(". Motifs: ");
        description.push_str(&interpretation.tags.join(", "));
    }
    description
}

/// Renders a dream scene and returns the url of the generated image.
///
/// Empty input is rejected before anything goes over the wire.
#[instrument(skip_all)]
pub async fn visualize(llm: &LlmClient, description: &str) -> Result<String, VisualizeError> {
    if description.trim().is_empty() {
        return Err(VisualizeError::EmptyDescription);
    }
    let client = llm.client()?;

    let request = CreateImageRequestArgs::default()
        .prompt(image_prompt(description))
        .model(ImageModel::Other(llm.image_model().to_owned()))
        .n(1)
        .size(ImageSize::S1792x1024)
        .response_format(ImageResponseFormat::Url)
        .build()
        .map_err(OpenAiError::from)?;

    let response = client.images().create(request).await.map_err(OpenAiError::from)?;
    let image = response.data.first().ok_or(OpenAiError::EmptyResponse)?;
    match image.as_ref() {
        Image::Url { url, .. } => Ok(url.clone()),
        Image::B64Json { .. } => Err(VisualizeError::MissingUrl),
    }
}
