//! Mapping of failures to HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::blockchain::BlockchainError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed client input.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Chain(#[from] BlockchainError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Chain(e) => match e {
                BlockchainError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
                BlockchainError::Timeout(_) | BlockchainError::ConfirmationTimeout(_) => {
                    StatusCode::GATEWAY_TIMEOUT
                }
                BlockchainError::GasPriceTooHigh { .. } => StatusCode::SERVICE_UNAVAILABLE,
                BlockchainError::Rpc(_) | BlockchainError::ChainMismatch { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                BlockchainError::Wallet(_) | BlockchainError::Signing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Rejected request");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
