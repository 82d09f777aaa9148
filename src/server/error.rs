//! Errors returned by the HTTP API.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{pricing::PricingError, service::mail::MailError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("SMTP authentication failed")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Internal { message: String, details: Option<String> },
}

/// Body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// A 500 with a user-facing `message` and the underlying error as `details`.
    pub fn internal(message: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: message.into(),
            details: Some(err.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("{self}");
        }

        let details = match &self {
            Self::Internal { details, .. } => details.clone(),
            _ => None,
        };

        let body = ErrorBody { error: self.to_string(), details };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("Internal server error", format!("{err:#}"))
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Incomplete | MailError::InvalidAddress(_) => Self::BadRequest(err.to_string()),
            MailError::Authentication => Self::Unauthorized,
            MailError::Transport(_) => Self::Internal {
                message: err.to_string(),
                details: None,
            },
            MailError::Other(err) => Self::internal("Failed to send email", format!("{err:#}")),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
