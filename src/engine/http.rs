use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::{Completion, CompletionEngine, EngineError};
use crate::models::{ChatMessage, ResolvedRequest};
use crate::provider::ProviderNamespace;

/// Payload for the engine's OpenAI-style `/v1/chat/completions`.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
    stream: bool,
    provider: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamChoice {
    #[serde(default)]
    message: Option<UpstreamContent>,
    #[serde(default)]
    delta: Option<UpstreamContent>,
}

/// Both the full JSON body and a single SSE `data:` event share this shape.
#[derive(Debug, Deserialize)]
struct UpstreamBody {
    #[serde(default)]
    choices: Vec<UpstreamChoice>,
    #[serde(default)]
    error: Option<UpstreamError>,
}

impl UpstreamBody {
    fn into_result(self) -> Result<Self, EngineError> {
        match self.error {
            Some(e) => Err(EngineError::Provider(
                e.message.unwrap_or_else(|| "unknown upstream error".to_string()),
            )),
            None => Ok(self),
        }
    }

    fn message_text(self) -> Result<String, EngineError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Malformed("no choices in completion".into()))?;
        Ok(choice
            .message
            .and_then(|m| m.content)
            .unwrap_or_default())
    }

    fn delta_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.delta)
            .and_then(|d| d.content)
            .filter(|s| !s.is_empty())
    }
}

/// Engine backed by a g4f-compatible HTTP API.
///
/// Non-streaming requests yield [`Completion::Complete`]; `stream=true` requests are
/// sent with `Accept: text/event-stream` and yield [`Completion::Incremental`] over the
/// `choices[0].delta.content` fragments until `[DONE]`.
pub struct HttpEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    providers: ProviderNamespace,
}

impl HttpEngine {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            providers: ProviderNamespace::builtin(),
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_providers(mut self, providers: ProviderNamespace) -> Self {
        self.providers = providers;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    async fn send(&self, resolved: &ResolvedRequest) -> Result<reqwest::Response, EngineError> {
        let req = &resolved.request;
        let body = UpstreamRequest {
            model: &req.model,
            messages: &req.messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            stream: req.stream,
            provider: resolved.provider.map(|p| p.as_str()),
        };

        let accept = if req.stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        let mut rb = self
            .client
            .post(self.completions_url())
            .header(header::ACCEPT, accept)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(k) = &self.api_key {
            rb = rb.bearer_auth(k);
        }

        tracing::debug!(
            model = %req.model,
            provider = ?resolved.provider,
            stream = req.stream,
            "sending completion to engine"
        );

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(EngineError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl CompletionEngine for HttpEngine {
    fn providers(&self) -> &ProviderNamespace {
        &self.providers
    }

    async fn create(&self, request: &ResolvedRequest) -> Result<Completion, EngineError> {
        let resp = self.send(request).await?;

        if !request.request.stream {
            let bytes = resp.bytes().await?;
            let body: UpstreamBody = serde_json::from_slice(&bytes)
                .map_err(|e| EngineError::Malformed(e.to_string()))?;
            return Ok(Completion::Complete(body.into_result()?.message_text()?));
        }

        let mut upstream = resp.bytes_stream();
        let mut buf = Vec::<u8>::new();

        let chunks = try_stream! {
            let mut done = false;
            while !done {
                let Some(chunk) = upstream.next().await else { break };
                buf.extend_from_slice(&chunk?);
                while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    match parse_event_line(&line)? {
                        SseLine::Done => {
                            done = true;
                            break;
                        }
                        SseLine::Text(text) => yield text,
                        SseLine::Skip => {}
                    }
                }
            }
            // Trailing event without a final newline.
            if !done && !buf.is_empty() {
                if let SseLine::Text(text) = parse_event_line(&buf)? {
                    yield text;
                }
            }
        };

        Ok(Completion::Incremental(Box::pin(chunks)))
    }
}

enum SseLine {
    Text(String),
    Done,
    Skip,
}

fn parse_event_line(raw: &[u8]) -> Result<SseLine, EngineError> {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(SseLine::Skip);
    }
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }
    let event: UpstreamBody =
        serde_json::from_str(data).map_err(|e| EngineError::Malformed(e.to_string()))?;
    Ok(event
        .into_result()?
        .delta_text()
        .map(SseLine::Text)
        .unwrap_or(SseLine::Skip))
}
