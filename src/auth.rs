//! Static API-key gate for `/chat` and `/models`.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::HeaderMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::ProxyError;
use crate::server::AppState;

/// Header carrying the caller's key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Keys accepted when none are configured.
pub const DEFAULT_API_KEYS: [&str; 2] = ["123456", "marufking"];

/// Immutable allow-set of API keys. Membership is an exact string match.
#[derive(Debug, Clone)]
pub struct ApiKeySet {
    keys: HashSet<String>,
}

impl ApiKeySet {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list, ignoring blank entries.
    pub fn parse_list(raw: &str) -> Self {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        )
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Check a caller-supplied key (`None` when the header was absent).
    pub fn verify(&self, supplied: Option<&str>) -> Result<(), ProxyError> {
        match supplied {
            None => Err(ProxyError::Unauthenticated),
            Some(k) if self.contains(k) => Ok(()),
            Some(_) => Err(ProxyError::Unauthorized),
        }
    }

    /// Extract `X-API-Key` from headers and verify it.
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<(), ProxyError> {
        let supplied = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
        self.verify(supplied)
    }
}

impl Default for ApiKeySet {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEYS)
    }
}

/// Route layer rejecting requests without a valid key before any extractor runs,
/// so auth failures always win over body or validation errors.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(err) = state.api_keys.verify_headers(req.headers()) {
        tracing::warn!(path = %req.uri().path(), reason = %err, "rejected request");
        return err.into_response();
    }
    next.run(req).await
}
