pub(crate) mod error;

use crate::routes::journal::error::JournalError;
use crate::user::ExtractUserId;
use axum::response::IntoResponse;
use axum::routing::{Router, get};
use axum::{Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use utoipa::ToSchema;
use yume_db::dream::{Mutation, Query};
use yume_model::interpretation::Interpretation;
use yume_model::journal::JournalEntry;

pub(crate) fn create_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list_journal).post(append_journal))
        .with_state(())
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct JournalResponse {
    dreams: Vec<JournalEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct AppendRequest {
    /// The dream exactly as the user told it.
    dream_text: String,

    interpretation: Interpretation,

    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AppendResponse {
    success: bool,
}

#[utoipa::path(
    get,
    path = "/journal",
    responses(
        (status = OK, description = "The user's journal, newest first", body = JournalResponse),
        (status = UNAUTHORIZED, description = "The request carries no valid token"),
        (status = INTERNAL_SERVER_ERROR, description = "The journal could not be read"),
    ),
    tag = "journal",
    security(
        ("token" = [])
    )
)]
#[instrument(skip_all)]
pub(crate) async fn list_journal(
    ExtractUserId(user): ExtractUserId,
    Extension(conn): Extension<DatabaseConnection>,
) -> Result<impl IntoResponse, JournalError> {
    let entries = Query::list_for_user(&conn, &user).await?;
    let dreams = entries
        .into_iter()
        .map(JournalEntry::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(JournalResponse { dreams }))
}

#[utoipa::path(
    post,
    path = "/journal",
    request_body = AppendRequest,
    responses(
        (status = OK, description = "The entry was appended", body = AppendResponse),
        (status = BAD_REQUEST, description = "The entry carries no dream text or interpretation"),
        (status = UNAUTHORIZED, description = "The request carries no valid token"),
        (status = INTERNAL_SERVER_ERROR, description = "The entry could not be stored"),
    ),
    tag = "journal",
    security(
        ("token" = [])
    )
)]
#[instrument(skip_all)]
pub(crate) async fn append_journal(
    ExtractUserId(user): ExtractUserId,
    Extension(conn): Extension<DatabaseConnection>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, JournalError> {
    let Ok(request) = serde_json::from_value::<AppendRequest>(body) else {
        return Err(JournalError::MissingData);
    };
    if request.dream_text.trim().is_empty() {
        return Err(JournalError::MissingData);
    }

    let interpretation = serde_json::to_value(&request.interpretation)?;
    Mutation::append(&conn, &user, &request.dream_text, interpretation, request.image_url).await?;
    Ok(Json(AppendResponse { success: true }))
}
