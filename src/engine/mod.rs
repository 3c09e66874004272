//! The completion engine seam.
//!
//! The gate never talks to model backends itself; it hands a validated request to a
//! [`CompletionEngine`] and receives either the whole answer or a stream of fragments.

pub mod http;

use async_trait::async_trait;
use futures_util::Stream;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use crate::models::ResolvedRequest;
use crate::provider::ProviderNamespace;

pub use self::http::HttpEngine;

/// Fragments of a streamed completion, in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, EngineError>> + Send>>;

/// What the engine produced for one request.
pub enum Completion {
    /// The full text in one piece.
    Complete(String),
    /// Text delivered incrementally; must be drained to obtain the answer.
    Incremental(ChunkStream),
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Completion::Incremental(_) => f.write_str("Incremental(..)"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// Error reported by the engine itself (in a JSON body or inside a stream).
    #[error("{0}")]
    Provider(String),

    #[error("completion timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// A multi-provider completion engine.
#[async_trait]
pub trait CompletionEngine: Send + Sync {
    /// Providers the engine can be forced to use.
    fn providers(&self) -> &ProviderNamespace;

    /// Run one completion. `request.provider == None` lets the engine pick.
    async fn create(&self, request: &ResolvedRequest) -> Result<Completion, EngineError>;
}
