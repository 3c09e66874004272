use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use http::{header, StatusCode};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Canned behaviour of the fake g4f API.
#[derive(Clone)]
pub enum StubReply {
    /// Non-streaming OpenAI-style completion with this content.
    Json(String),
    /// SSE stream of delta fragments followed by `[DONE]`.
    Sse(Vec<String>),
    /// SSE stream of fragments followed by an in-band error event.
    SseError { chunks: Vec<String>, message: String },
    /// Arbitrary status and body.
    Status { status: StatusCode, body: String },
}

#[derive(Clone)]
struct StubState {
    reply: StubReply,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
}

/// Fake g4f `/v1/chat/completions` server on an ephemeral port.
pub struct UpstreamStub {
    base_url: String,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl UpstreamStub {
    pub async fn start(reply: StubReply) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let auth_headers = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(StubState {
            reply,
            requests: requests.clone(),
            auth_headers: auth_headers.clone(),
        });

        let router = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub upstream");
        let addr = listener.local_addr().expect("stub upstream local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service());
        tokio::spawn(async move {
            tokio::select! {
                res = server => {
                    if let Err(err) = res {
                        eprintln!("Stub upstream server error: {err:?}");
                    }
                }
                _ = rx => {}
            }
        });

        UpstreamStub {
            base_url: format!("http://{}", addr),
            requests,
            auth_headers,
            shutdown: Some(tx),
        }
    }

    pub fn url(&self) -> String {
        self.base_url.clone()
    }

    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().expect("lock stub requests").clone()
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.auth_headers.lock().expect("lock stub headers").clone()
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn sse_event(value: serde_json::Value) -> String {
    format!("data: {}\n\n", value)
}

fn delta_event(text: &str) -> String {
    sse_event(serde_json::json!({
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"content": text}}]
    }))
}

fn sse_response(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        body,
    )
        .into_response()
}

async fn completions(
    State(state): State<Arc<StubState>>,
    headers: http::HeaderMap,
    Json(req): Json<serde_json::Value>,
) -> Response {
    if let Ok(mut guard) = state.requests.lock() {
        guard.push(req);
    }
    if let Ok(mut guard) = state.auth_headers.lock() {
        guard.push(
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
    }

    match &state.reply {
        StubReply::Json(text) => Json(serde_json::json!({
            "id": "chatcmpl-stub",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        StubReply::Sse(chunks) => {
            let mut body = sse_event(serde_json::json!({
                "choices": [{"index": 0, "delta": {"role": "assistant"}}]
            }));
            for c in chunks {
                body.push_str(&delta_event(c));
            }
            body.push_str("data: [DONE]\n\n");
            sse_response(body)
        }
        StubReply::SseError { chunks, message } => {
            let mut body = String::new();
            for c in chunks {
                body.push_str(&delta_event(c));
            }
            body.push_str(&sse_event(serde_json::json!({
                "error": {"message": message}
            })));
            sse_response(body)
        }
        StubReply::Status { status, body } => (*status, body.clone()).into_response(),
    }
}
