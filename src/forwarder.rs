//! Hands resolved requests to the engine and turns whatever comes back into one
//! `ChatResponse`.

use futures_util::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::engine::{Completion, CompletionEngine, EngineError};
use crate::error::ProxyError;
use crate::models::{ChatResponse, ResolvedRequest};

pub struct Forwarder {
    engine: Arc<dyn CompletionEngine>,
    /// Bound on engine call plus stream exhaustion. `None` waits indefinitely.
    timeout: Option<Duration>,
}

impl Forwarder {
    pub fn new(engine: Arc<dyn CompletionEngine>) -> Self {
        Self {
            engine,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn engine(&self) -> &dyn CompletionEngine {
        self.engine.as_ref()
    }

    /// Run the completion and buffer it into a single response.
    ///
    /// Streaming requests are still answered in one piece: incremental results are
    /// drained in arrival order before returning. Any engine failure becomes
    /// [`ProxyError::Upstream`] with the engine's error text.
    pub async fn forward(&self, resolved: &ResolvedRequest) -> Result<ChatResponse, ProxyError> {
        let start = Instant::now();

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.complete(resolved))
                .await
                .unwrap_or_else(|_| Err(EngineError::Timeout(limit))),
            None => self.complete(resolved).await,
        };

        let process_time = round_secs(start.elapsed());
        match outcome {
            Ok(response) => {
                tracing::info!(
                    model = %resolved.request.model,
                    provider = ?resolved.provider,
                    process_time,
                    "completion finished"
                );
                Ok(ChatResponse {
                    response,
                    process_time,
                })
            }
            Err(e) => {
                tracing::error!(
                    model = %resolved.request.model,
                    provider = ?resolved.provider,
                    error = %e,
                    "Error during chat completion"
                );
                Err(ProxyError::Upstream(e.to_string()))
            }
        }
    }

    async fn complete(&self, resolved: &ResolvedRequest) -> Result<String, EngineError> {
        let completion = self.engine.create(resolved).await?;
        collect_text(completion).await
    }
}

/// Flatten either completion shape into the final text.
pub async fn collect_text(completion: Completion) -> Result<String, EngineError> {
    match completion {
        Completion::Complete(text) => Ok(text),
        Completion::Incremental(mut chunks) => {
            let mut out = String::new();
            while let Some(chunk) = chunks.next().await {
                out.push_str(&chunk?);
            }
            Ok(out)
        }
    }
}

/// Seconds, rounded to two decimal places.
pub fn round_secs(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}
