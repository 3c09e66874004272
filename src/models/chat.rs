use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::provider::Provider;

/// One chat message.
///
/// Messages are string-valued maps: `role` and `content` are required, any further
/// string fields (e.g. `name`) are kept and forwarded untouched. Content is not
/// inspected; the engine rejects what it cannot handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    #[schema(example = "user")]
    pub role: String,
    #[schema(example = "What is AI?")]
    pub content: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: BTreeMap<String, String>,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            extra: BTreeMap::new(),
        }
    }
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

// Explicit `null` behaves like an omitted field.
fn temperature_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or_else(default_temperature))
}

fn max_tokens_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(d)?.unwrap_or_else(default_max_tokens))
}

fn flag_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(d)?.unwrap_or_default())
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "model": "gpt-4o-mini",
    "provider": "PollinationsAI",
    "messages": [{"role": "user", "content": "What is AI?"}]
}))]
pub struct ChatRequest {
    pub model: String,
    /// Force a backend. Must be one of the model's registered providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(
        default = "default_temperature",
        deserialize_with = "temperature_or_default"
    )]
    #[schema(default = 0.7)]
    pub temperature: f64,
    #[serde(
        default = "default_max_tokens",
        deserialize_with = "max_tokens_or_default"
    )]
    #[schema(default = 1000)]
    pub max_tokens: u32,
    /// Accepted for compatibility; output is always returned as a single body.
    #[serde(default, deserialize_with = "flag_or_default")]
    pub stream: bool,
}

impl ChatRequest {
    /// The explicit provider choice, if any. An empty string counts as no choice.
    pub fn requested_provider(&self) -> Option<&str> {
        self.provider.as_deref().filter(|p| !p.is_empty())
    }
}

/// A chat request that passed validation, with its provider pinned (or left to the engine).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub request: ChatRequest,
    pub provider: Option<Provider>,
}

/// Body of a successful `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    /// Seconds spent in the engine, rounded to two decimals.
    #[schema(example = 0.87)]
    pub process_time: f64,
}

/// Body of `GET /models`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelsResponse {
    #[schema(value_type = Object)]
    pub models: IndexMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply() {
        let req: ChatRequest = serde_json::from_value(json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();
        assert_eq!(req.provider, None);
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_tokens, 1000);
        assert!(!req.stream);
    }

    #[test]
    fn null_parameters_take_defaults() {
        let req: ChatRequest = serde_json::from_value(json!({
            "model": "gpt-4o-mini",
            "provider": null,
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": null,
            "max_tokens": null,
            "stream": null
        }))
        .unwrap();
        assert_eq!(req.provider, None);
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_tokens, 1000);
        assert!(!req.stream);
    }

    #[test]
    fn empty_provider_counts_as_absent() {
        let req: ChatRequest = serde_json::from_value(json!({
            "model": "gpt-4o-mini",
            "provider": "",
            "messages": []
        }))
        .unwrap();
        assert_eq!(req.requested_provider(), None);
    }

    #[test]
    fn message_extra_fields_round_trip() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "role": "user",
            "content": "hi",
            "name": "alice"
        }))
        .unwrap();
        assert_eq!(msg.extra.get("name").map(String::as_str), Some("alice"));
        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back, json!({"role": "user", "content": "hi", "name": "alice"}));
    }

    #[test]
    fn message_requires_role_and_content() {
        assert!(serde_json::from_value::<ChatMessage>(json!({"role": "user"})).is_err());
        assert!(serde_json::from_value::<ChatMessage>(json!({"content": "x"})).is_err());
    }
}
