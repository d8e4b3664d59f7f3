use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Request-level error. Handlers return `Result<T, AppError>` and the
/// underlying message is passed through to the caller unchanged.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Storage(#[from] std::io::Error),

    #[error("{0}")]
    ParseFailure(String),

    #[error("Error contacting LLM: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn upstream(err: anyhow::Error) -> Self {
        AppError::Upstream(format!("{err:#}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) | AppError::ParseFailure(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Storage(err) => tracing::error!(error = %err, "storage error"),
            AppError::ParseFailure(msg) => tracing::warn!(error = %msg, "log parse failure"),
            AppError::Upstream(msg) => tracing::error!(error = %msg, "upstream LLM error"),
            AppError::NotFound(_) | AppError::Validation(_) => {}
        }

        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}
