use crate::routes::error::{ErrorData, ErrorDataProvider, GetStatusCode, error_to_response};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use yume_core::interpreter::InterpretError;
use yume_core::openai::error::OpenAiError;
use yume_core::visualizer::VisualizeError;

#[derive(Error, Debug)]
pub(crate) enum DreamError {
    #[error("The request carries no dream")]
    MissingDream,

    #[error("The request carries no description")]
    MissingDescription,

    #[error(transparent)]
    Interpret(#[from] InterpretError),

    #[error(transparent)]
    Visualize(#[from] VisualizeError),
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DreamErrorType {
    MissingDream,
    MissingDescription,
    MissingCredential,
    Upstream,
    Response,
}

impl GetStatusCode for DreamError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingDream | Self::MissingDescription => StatusCode::BAD_REQUEST,
            Self::Interpret(_) | Self::Visualize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl GetStatusCode for DreamErrorType {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingDream | Self::MissingDescription => StatusCode::BAD_REQUEST,
            Self::MissingCredential | Self::Upstream | Self::Response => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn openai_error_data(error: OpenAiError) -> ErrorData<DreamErrorType> {
    match error {
        OpenAiError::MissingApiKey => ErrorData::new(
            DreamErrorType::MissingCredential,
            "The language model api key is not configured",
        ),
        OpenAiError::Api(_) | OpenAiError::HttpClientBuild(_) => {
            ErrorData::new(DreamErrorType::Upstream, error.to_string())
        }
        OpenAiError::FunctionCall(_) => ErrorData::new(DreamErrorType::Response, error.to_string()),
        OpenAiError::EmptyResponse => ErrorData::new(DreamErrorType::Response, "The language model sent no response"),
    }
}

impl ErrorDataProvider<DreamErrorType> for DreamError {
    fn error_data(self) -> Option<ErrorData<DreamErrorType>> {
        let res = match self {
            Self::MissingDream | Self::Interpret(InterpretError::EmptyDream) => {
                ErrorData::new(DreamErrorType::MissingDream, "The request carries no dream")
            }
            Self::MissingDescription | Self::Visualize(VisualizeError::EmptyDescription) => {
                ErrorData::new(DreamErrorType::MissingDescription, "The request carries no description")
            }
            Self::Interpret(InterpretError::Incomplete(field)) => ErrorData::new(
                DreamErrorType::Response,
                format!("The interpretation is missing {field}"),
            ),
            Self::Visualize(VisualizeError::MissingUrl) => {
                ErrorData::new(DreamErrorType::Response, "The generated image carries no url")
            }
            Self::Interpret(InterpretError::OpenAi(error)) | Self::Visualize(VisualizeError::OpenAi(error)) => {
                openai_error_data(error)
            }
        };
        Some(res)
    }
}

impl IntoResponse for DreamError {
    fn into_response(self) -> Response {
        error_to_response(self)
    }
}
