pub(crate) mod error;

use crate::AppConfig;
use crate::routes::dream::error::DreamError;
use axum::response::IntoResponse;
use axum::routing::{Router, post};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use tracing::instrument;
use utoipa::ToSchema;
use yume_core::{interpreter, visualizer};
use yume_model::interpretation::Interpretation;

pub(crate) fn create_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/interpret", post(interpret_dream))
        .route("/visualize", post(visualize_dream))
        .with_state(())
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct InterpretRequest {
    /// The dream exactly as the user told it.
    dream: String,

    /// Also render an illustration of the dream.
    #[serde(default)]
    illustrate: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct InterpretResponse {
    interpretation: Interpretation,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct VisualizeRequest {
    /// The scene to render.
    description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct VisualizeResponse {
    #[serde(rename = "imageUrl")]
    image_url: String,
}

#[utoipa::path(
    post,
    path = "/interpret",
    request_body = InterpretRequest,
    responses(
        (status = OK, description = "The interpretation of the dream", body = InterpretResponse),
        (status = BAD_REQUEST, description = "The request carries no dream"),
        (status = INTERNAL_SERVER_ERROR, description = "The interpretation could not be produced"),
    ),
    tag = "dreams"
)]
#[instrument(skip_all)]
pub(crate) async fn interpret_dream(
    Extension(app_config): Extension<AppConfig>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, DreamError> {
    let Ok(request) = serde_json::from_value::<InterpretRequest>(body) else {
        return Err(DreamError::MissingDream);
    };

    let llm = app_config.llm();
    let mut interpretation = interpreter::interpret(llm, &request.dream)
        .await
        .inspect_err(|error| tracing::error!(error = error as &dyn Error, "failed to interpret the dream"))?;

    if request.illustrate {
        match visualizer::visualize(llm, &visualizer::describe(&interpretation)).await {
            Ok(url) => interpretation.image_url = Some(url),
            Err(error) => {
                // The interpretation still stands when the illustration fails.
                tracing::warn!(error = &error as &dyn Error, "failed to illustrate the dream");
            }
        }
    }

    Ok(Json(InterpretResponse { interpretation }))
}

#[utoipa::path(
    post,
    path = "/visualize",
    request_body = VisualizeRequest,
    responses(
        (status = OK, description = "The url of the rendered scene", body = VisualizeResponse),
        (status = BAD_REQUEST, description = "The request carries no description"),
        (status = INTERNAL_SERVER_ERROR, description = "The image could not be rendered"),
    ),
    tag = "dreams"
)]
#[instrument(skip_all)]
pub(crate) async fn visualize_dream(
    Extension(app_config): Extension<AppConfig>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, DreamError> {
    let Ok(request) = serde_json::from_value::<VisualizeRequest>(body) else {
        return Err(DreamError::MissingDescription);
    };

    let image_url = visualizer::visualize(app_config.llm(), &request.description)
        .await
        .inspect_err(|error| tracing::error!(error = error as &dyn Error, "failed to render the dream"))?;
    Ok(Json(VisualizeResponse { image_url }))
}
