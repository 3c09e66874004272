#![forbid(unsafe_code)]
#![doc = r#"
g4f-gate

A key-gated HTTP proxy in front of a g4f multi-provider completion engine. Callers may
only use the models in a fixed catalog, and may only force providers that the catalog
lists for that model.

Crate highlights
- Library: request validation via `resolve(&ModelRegistry, &ProviderNamespace, ChatRequest)`.
- HTTP server (in `server`): `POST /chat`, `GET /models` (both require `X-API-Key`), plus
  `/docs`, `/redoc` and `/openapi.json`.
- Engine seam (in `engine`): `CompletionEngine` trait with an HTTP implementation that talks
  to a g4f-compatible `/v1/chat/completions` endpoint.

Modules
- `models`: Wire types for `/chat` and `/models`.
- `registry`: Model -> permitted providers catalog.
- `provider`: Engine provider namespace.
- `auth`: API key allow-set and the route layer enforcing it.
- `resolver`: Validation and provider resolution.
- `engine`: Completion engine trait and HTTP engine.
- `forwarder`: Engine invocation, stream buffering, timing.
- `server`: Axum router/handlers.
- `docs`: OpenAPI document and documentation pages.
- `config`, `util`: Environment, tracing, HTTP client, CORS.
"#]

pub mod auth;
pub mod config;
pub mod docs;
pub mod engine;
pub mod error;
pub mod forwarder;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod server;
pub mod util;

pub use crate::auth::ApiKeySet;
pub use crate::engine::{Completion, CompletionEngine, EngineError, HttpEngine};
pub use crate::error::ProxyError;
pub use crate::provider::{Provider, ProviderNamespace};
pub use crate::registry::ModelRegistry;
pub use crate::resolver::resolve;

// Re-export model namespace for convenience (downstream users can do `use g4f_gate::chat`).
pub use crate::models::chat;
