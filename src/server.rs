use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use http::header;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth::{require_api_key, ApiKeySet};
use crate::docs;
use crate::engine::CompletionEngine;
use crate::error::{error_response, ErrorBody, ProxyError};
use crate::forwarder::Forwarder;
use crate::models::{ChatRequest, ChatResponse, ModelsResponse};
use crate::registry::ModelRegistry;
use crate::resolver::resolve;
use crate::util::cors_layer_from_env;

/// Shared application state used by the HTTP server and handlers.
///
/// Everything here is fixed at startup; handlers only read it.
pub struct AppState {
    pub registry: ModelRegistry,
    pub api_keys: ApiKeySet,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(
        registry: ModelRegistry,
        api_keys: ApiKeySet,
        engine: Arc<dyn CompletionEngine>,
    ) -> Self {
        Self {
            registry,
            api_keys,
            forwarder: Forwarder::new(engine),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.forwarder = self.forwarder.with_timeout(timeout);
        self
    }
}

/// Build the Axum router.
///
/// `/chat` and `/models` sit behind the API-key layer; `/docs`, `/redoc`,
/// `/openapi.json` and `/status` are open.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/chat", post(chat))
        .route("/models", get(list_models))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .merge(protected)
        .route("/status", get(status))
        .route("/openapi.json", get(docs::openapi_json))
        .route("/docs", get(docs::swagger_ui))
        .route("/redoc", get(docs::redoc))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer_from_env()),
        )
}

/// Service status endpoint.
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let routes = vec!["/chat", "/models", "/docs", "/redoc", "/openapi.json", "/status"];
    Json(serde_json::json!({
        "name": "g4f-gate",
        "version": env!("CARGO_PKG_VERSION"),
        "models": state.registry.len(),
        "routes": routes
    }))
}

/// Chat with a G4F-supported model.
///
/// Optionally specify a provider to force a particular backend. Returns the generated
/// text and the processing time in seconds.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Generated text", body = ChatResponse),
        (status = 400, description = "Unsupported model or provider", body = ErrorBody),
        (status = 403, description = "Missing or invalid API key", body = ErrorBody),
        (status = 500, description = "Completion engine failure", body = ErrorBody),
    ),
    security(("api_key" = []))
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, Response> {
    let Json(request) = body.map_err(|rej| error_response(rej.status(), &rej.body_text()))?;

    let resolved = resolve(
        &state.registry,
        state.forwarder.engine().providers(),
        request,
    )
    .map_err(|e| {
        tracing::debug!(reason = %e, "chat request rejected");
        e.into_response()
    })?;

    state
        .forwarder
        .forward(&resolved)
        .await
        .map(Json)
        .map_err(ProxyError::into_response)
}

/// List all supported models and their providers, in registry order.
#[utoipa::path(
    get,
    path = "/models",
    tag = "chat",
    responses(
        (status = 200, description = "Model -> providers map", body = ModelsResponse),
        (status = 403, description = "Missing or invalid API key", body = ErrorBody),
    ),
    security(("api_key" = []))
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.registry.catalog_json(),
    )
        .into_response()
}
