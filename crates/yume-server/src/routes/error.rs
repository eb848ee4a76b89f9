use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::borrow::Cow;
use utoipa::ToSchema;

pub(crate) trait GetStatusCode {
    fn status_code(&self) -> http::StatusCode;
}

/// The wire shape of every error response, `{ "error": ..., "error_description": ... }`.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ErrorData<T> {
    pub(crate) error: T,
    pub(crate) error_description: Cow<'static, str>,
}

impl<T> ErrorData<T> {
    pub fn new<A: Into<Cow<'static, str>>>(error: T, error_description: A) -> Self {
        Self {
            error,
            error_description: error_description.into(),
        }
    }
}

/// Maps an internal error onto the wire shape. `None` sends a bare status code.
pub(crate) trait ErrorDataProvider<T: GetStatusCode> {
    fn error_data(self) -> Option<ErrorData<T>>;
}

pub(crate) fn error_to_response<E, T>(error: T) -> Response
where
    E: GetStatusCode + Serialize,
    T: GetStatusCode + ErrorDataProvider<E>,
{
    let fallback = error.status_code();
    match error.error_data() {
        Some(data) => (data.error.status_code(), Json(data)).into_response(),
        None => fallback.into_response(),
    }
}
