use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::ledger::LedgerError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("not found")]
    NotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Ledger(err) => match err {
                LedgerError::Validation(_)
                | LedgerError::InvalidId { .. }
                | LedgerError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
                LedgerError::Capacity { .. } => StatusCode::CONFLICT,
                LedgerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Io(_) | AppError::Database(_) | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        } else {
            warn!(status = status.as_u16(), "request rejected: {self}");
        }

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
