use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Failures of the registry sync service.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Rejected input; the message is safe to show to the caller.
    #[error("{0}")]
    Validation(&'static str),

    /// The store could not serve the operation. Logged server-side and
    /// never detailed to callers.
    #[error("store unavailable: {0}")]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Store(err) => {
                error!("registry store failure: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
