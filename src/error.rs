use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Every way a request to the gate can fail.
///
/// Variants are terminal at the HTTP boundary: nothing is retried and no
/// partial chat response is ever produced.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `X-API-Key` header was absent (or not valid UTF-8).
    #[error("Not authenticated")]
    Unauthenticated,

    /// The key is not a member of the configured allow-set.
    #[error("Invalid API Key")]
    Unauthorized,

    #[error("Model '{model}' is not supported.")]
    UnsupportedModel { model: String },

    #[error(
        "Provider '{provider}' does not support model '{model}'. Available providers: {}",
        .available.join(", ")
    )]
    UnsupportedProviderForModel {
        provider: String,
        model: String,
        available: Vec<String>,
    },

    /// Permitted by the registry but not present in the engine's provider namespace.
    #[error("G4F Provider '{provider}' not found.")]
    UnknownProvider { provider: String },

    /// Anything the engine raised while producing (or streaming) a completion.
    #[error("{0}")]
    Upstream(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Unauthenticated | ProxyError::Unauthorized => StatusCode::FORBIDDEN,
            ProxyError::UnsupportedModel { .. }
            | ProxyError::UnsupportedProviderForModel { .. }
            | ProxyError::UnknownProvider { .. } => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body: `{"detail": "<message>"}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

/// Build a JSON error response with the given HTTP status and message.
pub fn error_response(status: StatusCode, msg: &str) -> Response {
    let body = ErrorBody {
        detail: msg.to_string(),
    };
    (status, axum::Json(body)).into_response()
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error_response(self.status(), &self.to_string())
    }
}
