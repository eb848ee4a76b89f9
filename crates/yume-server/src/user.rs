use crate::app::AuthConfig;
use crate::routes::error::{ErrorData, ErrorDataProvider, GetStatusCode, error_to_response};
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::header::AUTHORIZATION;
use http::request::Parts;
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use utoipa::ToSchema;

/// Claims the journal cares about. The subject doubles as the user id.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserToken {
    pub(crate) sub: String,
}

#[derive(Error, Debug)]
pub(crate) enum SessionRejection {
    #[error("Not signed in")]
    Unauthorized,

    #[error("Authentication is not configured")]
    Misconfigured,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SessionRejectionType {
    Unauthorized,
    Misconfigured,
}

impl GetStatusCode for SessionRejection {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl GetStatusCode for SessionRejectionType {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ErrorDataProvider<SessionRejectionType> for SessionRejection {
    fn error_data(self) -> Option<ErrorData<SessionRejectionType>> {
        let res = match self {
            Self::Unauthorized => ErrorData::new(
                SessionRejectionType::Unauthorized,
                "The request carries no valid bearer token",
            ),
            Self::Misconfigured => {
                ErrorData::new(SessionRejectionType::Misconfigured, "Authentication is not configured")
            }
        };
        Some(res)
    }
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        error_to_response(self)
    }
}

struct Session {
    token: UserToken,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts.headers.get(AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth_config) = parts.extensions.get::<AuthConfig>().cloned() else {
            tracing::error!("auth config not found in app data");
            return Err(SessionRejection::Misconfigured);
        };
        let Some(token) = bearer_token(parts) else {
            return Err(SessionRejection::Unauthorized);
        };

        let config = auth_config.as_ref();
        match config.jwk().decode::<UserToken>(token, config.validation()).await {
            Ok(data) => Ok(Self { token: data.claims }),
            Err(error) => {
                tracing::debug!(error = &error as &dyn Error, "rejecting token");
                Err(SessionRejection::Unauthorized)
            }
        }
    }
}

#[derive(Clone)]
pub(crate) struct ExtractUserId(pub(crate) String);

impl<S> FromRequestParts<S> for ExtractUserId
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self(session.token.sub))
    }
}
