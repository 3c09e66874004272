#![allow(dead_code)]

pub mod upstream_stub;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use g4f_gate::engine::{Completion, CompletionEngine, EngineError};
use g4f_gate::models::ResolvedRequest;
use g4f_gate::server::{build_router, AppState};
use g4f_gate::{ApiKeySet, ModelRegistry, ProviderNamespace};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const VALID_KEY: &str = "123456";

/// What the scripted engine answers with.
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Chunks(Vec<String>),
    Fail(String),
}

/// In-process engine that records every request it receives.
pub struct ScriptedEngine {
    reply: Reply,
    providers: ProviderNamespace,
    calls: Mutex<Vec<ResolvedRequest>>,
}

impl ScriptedEngine {
    pub fn new(reply: Reply) -> Arc<Self> {
        Self::with_providers(reply, ProviderNamespace::builtin())
    }

    pub fn with_providers(reply: Reply, providers: ProviderNamespace) -> Arc<Self> {
        Arc::new(Self {
            reply,
            providers,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn text(text: &str) -> Arc<Self> {
        Self::new(Reply::Text(text.to_string()))
    }

    pub fn calls(&self) -> Vec<ResolvedRequest> {
        self.calls.lock().expect("lock calls").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock calls").len()
    }
}

#[async_trait]
impl CompletionEngine for ScriptedEngine {
    fn providers(&self) -> &ProviderNamespace {
        &self.providers
    }

    async fn create(&self, request: &ResolvedRequest) -> Result<Completion, EngineError> {
        self.calls.lock().expect("lock calls").push(request.clone());
        match &self.reply {
            Reply::Text(t) => Ok(Completion::Complete(t.clone())),
            Reply::Chunks(parts) => {
                let items: Vec<Result<String, EngineError>> =
                    parts.iter().cloned().map(Ok).collect();
                Ok(Completion::Incremental(Box::pin(stream::iter(items))))
            }
            Reply::Fail(msg) => Err(EngineError::Provider(msg.clone())),
        }
    }
}

/// A running gate bound to an ephemeral local port.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    join: JoinHandle<()>,
    client: reqwest::Client,
}

impl TestServer {
    fn make_client() -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed building reqwest client")
    }

    /// GET without credentials.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request")
    }

    /// GET with an optional `X-API-Key`.
    pub async fn get_with_key(&self, path: &str, key: Option<&str>) -> reqwest::Response {
        let mut rb = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(k) = key {
            rb = rb.header("X-API-Key", k);
        }
        rb.send().await.expect("GET request")
    }

    /// POST a JSON body to `/chat` with an optional `X-API-Key`.
    pub async fn post_chat(&self, body: &serde_json::Value, key: Option<&str>) -> reqwest::Response {
        let mut rb = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(body);
        if let Some(k) = key {
            rb = rb.header("X-API-Key", k);
        }
        rb.send().await.expect("POST /chat")
    }

    /// POST raw bytes to `/chat`.
    pub async fn post_chat_raw(&self, bytes: &'static str, key: Option<&str>) -> reqwest::Response {
        let mut rb = self
            .client
            .post(format!("{}/chat", self.base_url))
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(bytes);
        if let Some(k) = key {
            rb = rb.header("X-API-Key", k);
        }
        rb.send().await.expect("POST /chat")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Spawn the router with the given state on an ephemeral port.
pub async fn spawn_with_state(state: AppState) -> TestServer {
    let app = build_router(Arc::new(state));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let base_url = format!("http://{}", addr);
    let server = axum::serve(listener, app.into_make_service());

    let join = tokio::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("Test server error: {e:?}");
        }
    });

    TestServer {
        base_url,
        addr,
        join,
        client: TestServer::make_client(),
    }
}

/// Spawn with the built-in registry and default keys in front of `engine`.
pub async fn spawn_with_engine(engine: Arc<dyn CompletionEngine>) -> TestServer {
    spawn_with_state(AppState::new(
        ModelRegistry::builtin(),
        ApiKeySet::default(),
        engine,
    ))
    .await
}

/// Minimal chat body for tests.
pub fn chat_body(model: &str, provider: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "model": model,
        "messages": [
            {"role": "user", "content": "hi"}
        ]
    });
    if let Some(p) = provider {
        body["provider"] = serde_json::Value::String(p.to_string());
    }
    body
}

/// Read a `{"detail": ...}` error body.
pub async fn detail(resp: reqwest::Response) -> String {
    let v: serde_json::Value = resp.json().await.expect("json error body");
    v["detail"].as_str().unwrap_or_default().to_string()
}
