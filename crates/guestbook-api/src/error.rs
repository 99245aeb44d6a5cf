use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use guestbook_types::api::ErrorResponse;

use crate::hosting::HostingError;

/// Failures of the entry engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("unauthorized")]
    Unauthorized,

    /// Missing target, or a target the caller does not own.
    #[error("entry not found")]
    NotFound,

    #[error("store failure: {0}")]
    Store(#[from] anyhow::Error),
}

/// Everything an HTTP handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Hosting(#[from] HostingError),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Engine(EngineError::InvalidInput(message.into()))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Engine(EngineError::Store(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Engine(EngineError::InvalidInput(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Engine(EngineError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            Self::Engine(EngineError::NotFound) => {
                (StatusCode::NOT_FOUND, "Entry not found".to_string())
            }
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.to_string()),
            Self::Hosting(HostingError::NotConfigured) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            Self::Hosting(HostingError::Rejected(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Hosting(HostingError::Transport(e)) => {
                error!("Hosting provider request failed: {}", e);
                (StatusCode::BAD_GATEWAY, "Hosting provider unavailable".to_string())
            }
            Self::Engine(EngineError::Store(e)) => {
                error!("Store failure: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::Join(e) => {
                error!("spawn_blocking join error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
