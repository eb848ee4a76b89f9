use crate::routes::error::{ErrorData, ErrorDataProvider, GetStatusCode, error_to_response};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use yume_model::journal::EntryConversionError;

#[derive(Error, Debug)]
pub(crate) enum JournalError {
    #[error("The entry carries no dream text or interpretation")]
    MissingData,

    #[error("Error creating entry json")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Data(#[from] EntryConversionError),

    #[error("Database error.")]
    Database(#[from] DbErr),
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum JournalErrorType {
    MissingData,
    Data,
    Storage,
}

impl GetStatusCode for JournalError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingData => StatusCode::BAD_REQUEST,
            Self::Serde(_) | Self::Data(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl GetStatusCode for JournalErrorType {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingData => StatusCode::BAD_REQUEST,
            Self::Data | Self::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ErrorDataProvider<JournalErrorType> for JournalError {
    fn error_data(self) -> Option<ErrorData<JournalErrorType>> {
        let res = match self {
            Self::MissingData => ErrorData::new(
                JournalErrorType::MissingData,
                "The entry needs both a dream text and an interpretation",
            ),
            Self::Serde(_) => ErrorData::new(JournalErrorType::Storage, "The entry could not be stored"),
            Self::Data(_) => ErrorData::new(JournalErrorType::Data, "A stored entry could not be decoded"),
            Self::Database(error) => ErrorData::new(JournalErrorType::Storage, error.to_string()),
        };
        Some(res)
    }
}

impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        error_to_response(self)
    }
}
