use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

/// Failures surfaced by the plugin.
///
/// Cloneable so one failed remote lookup can be handed to every caller that
/// was waiting on it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid package name: {0}")]
    InvalidPackageName(String),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("publish denied: {0}")]
    PublishDenied(String),
    #[error("gitlab transport error: {0}")]
    Transport(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invalid_package_name(message: impl Into<String>) -> Self {
        Self::InvalidPackageName(message.into())
    }

    pub fn project_not_found(message: impl Into<String>) -> Self {
        Self::ProjectNotFound(message.into())
    }

    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::UserNotFound(message.into())
    }

    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed(message.into())
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    pub fn publish_denied(message: impl Into<String>) -> Self {
        Self::PublishDenied(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status the registry host expects for this outcome.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidPackageName(_) => StatusCode::BAD_REQUEST,
            AppError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
            AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::PublishDenied(_) => StatusCode::FORBIDDEN,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = self.to_string();
        let error = match &self {
            AppError::Configuration(_) => "configuration",
            AppError::InvalidPackageName(_) => "invalid_package_name",
            AppError::ProjectNotFound(_) => "project_not_found",
            AppError::UserNotFound(_) => "user_not_found",
            AppError::AuthenticationFailed(_) => "authentication_failed",
            AppError::AccessDenied(_) => "access_denied",
            AppError::PublishDenied(_) => "publish_denied",
            AppError::Transport(_) => "transport",
            AppError::Internal(_) => "internal",
        };

        let payload = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(payload)).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}
