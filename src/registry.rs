use anyhow::{bail, Context, Result};
use bytes::Bytes;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

/// Built-in model -> permitted providers table, in declared order.
const BUILTIN_MODELS: &[(&str, &[&str])] = &[
    ("gpt-4", &["Blackbox", "PollinationsAI", "Copilot"]),
    ("gpt-4o", &["Blackbox", "PollinationsAI"]),
    ("gpt-4o-mini", &["Blackbox", "PollinationsAI"]),
    ("gpt-4o-mini-audio", &["PollinationsAI"]),
    ("o1", &["Copilot"]),
    ("gpt-4.1", &["PollinationsAI"]),
    ("gpt-4.1-mini", &["Blackbox", "PollinationsAI"]),
    ("gpt-4.1-nano", &["Blackbox", "PollinationsAI"]),
    ("dall-e-3", &["Copilot"]),
    ("llama-2-7b", &["Cloudflare"]),
    ("llama-2-70b", &["Together"]),
    ("llama-3-8b", &["Together", "Cloudflare"]),
    ("llama-3.1-8b", &["Together", "Cloudflare"]),
    ("llama-3.1-405b", &["Together"]),
    ("llama-3.2-1b", &["Cloudflare"]),
    ("llama-3.2-3b", &["Together"]),
    ("llama-3.2-11b", &["Together"]),
    ("llama-3.2-90b", &["Together"]),
    ("llama-3.3-70b", &["PollinationsAI", "Together"]),
    ("llama-4-scout", &["PollinationsAI", "Together", "Cloudflare"]),
    ("llama-4-maverick", &["Together"]),
    ("mistral-7b", &["Together"]),
    ("mixtral-8x7b", &["Together"]),
    ("mistral-small-24b", &["Together"]),
    ("mistral-small-3.1-24b", &["PollinationsAI"]),
    ("hermes-2-dpo", &["Together"]),
    ("phi-4", &["PollinationsAI"]),
    ("gemini-1.5-flash", &["TeachAnything"]),
    ("gemini-1.5-pro", &["TeachAnything"]),
    ("gemma-2-27b", &["Together"]),
    ("blackboxai", &["Blackbox"]),
    ("qwen-1.5-7b", &["Cloudflare"]),
    ("qwen-2-72b", &["Together"]),
    ("qwen-2-vl-72b", &["Together"]),
    ("qwen-2.5-7b", &["Together"]),
    ("qwen-2.5-72b", &["Together"]),
    ("qwen-2.5-coder-32b", &["PollinationsAI", "Together"]),
    ("qwen-2.5-vl-72b", &["Together"]),
    ("qwen-3-235b", &["Together"]),
    ("qwq-32b", &["Together"]),
    ("deepseek-v3", &["PollinationsAI", "Together"]),
    ("deepseek-r1", &["Together"]),
    ("deepseek-r1-distill-qwen-1.5b", &["Together"]),
    ("deepseek-r1-distill-qwen-14b", &["Together"]),
    ("deepseek-r1-distill-qwen-32b", &["PollinationsAI"]),
    ("deepseek-v3-0324", &["PollinationsAI"]),
    ("grok-3-mini", &["PollinationsAI"]),
    ("sonar", &["PerplexityLabs"]),
    ("sonar-pro", &["PerplexityLabs"]),
    ("sonar-reasoning", &["PerplexityLabs"]),
    ("sonar-reasoning-pro", &["PerplexityLabs"]),
    ("r1-1776", &["Together", "PerplexityLabs"]),
    ("nemotron-70b", &["Together"]),
    ("evil", &["PollinationsAI"]),
    ("flux", &["Together"]),
    ("flux-pro", &["Together"]),
    ("flux-schnell", &["Together"]),
    ("flux-kontext-max", &["Together"]),
];

#[derive(Serialize)]
struct Catalog<'a> {
    models: &'a IndexMap<String, Vec<String>>,
}

/// Immutable model -> ordered provider list.
///
/// Provider order is the declared preference order and is preserved verbatim in
/// error messages and in the `/models` catalog. The catalog body is serialized once
/// at construction so repeated listings are byte-identical.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, Vec<String>>,
    catalog: Bytes,
}

impl ModelRegistry {
    /// Registry compiled into the binary.
    pub fn builtin() -> Self {
        let models = BUILTIN_MODELS
            .iter()
            .map(|(model, providers)| {
                (
                    (*model).to_string(),
                    providers.iter().map(|p| (*p).to_string()).collect(),
                )
            })
            .collect();
        // The built-in table is non-empty per entry; checked in tests.
        Self::with_catalog(models)
    }

    /// Build from an arbitrary ordered map, enforcing one provider minimum per model.
    pub fn from_map(models: IndexMap<String, Vec<String>>) -> Result<Self> {
        if models.is_empty() {
            bail!("model registry has no models");
        }
        for (model, providers) in &models {
            if model.is_empty() {
                bail!("model registry contains an empty model name");
            }
            if providers.is_empty() {
                bail!("model '{model}' has no providers");
            }
            if providers.iter().any(|p| p.is_empty()) {
                bail!("model '{model}' lists an empty provider name");
            }
        }
        Ok(Self::with_catalog(models))
    }

    /// Load a registry from a JSON object of `{"model": ["Provider", ...]}`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read model registry file: {}",
                path.as_ref().display()
            )
        })?;

        let models: IndexMap<String, Vec<String>> =
            serde_json::from_str(&content).with_context(|| "Failed to parse model registry JSON")?;

        Self::from_map(models)
            .with_context(|| format!("Invalid model registry: {}", path.as_ref().display()))
    }

    fn with_catalog(models: IndexMap<String, Vec<String>>) -> Self {
        // Serialized straight from the IndexMap; a serde_json::Value would reorder keys.
        // Serializing a map of strings cannot fail.
        let catalog = serde_json::to_vec(&Catalog { models: &models })
            .map(Bytes::from)
            .unwrap_or_default();
        Self { models, catalog }
    }

    /// Permitted providers for `model`, in registry order. Exact, case-sensitive match.
    pub fn providers_for(&self, model: &str) -> Option<&[String]> {
        self.models.get(model).map(Vec::as_slice)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn models(&self) -> &IndexMap<String, Vec<String>> {
        &self.models
    }

    /// Pre-serialized `{"models": {...}}` body.
    pub fn catalog_json(&self) -> Bytes {
        self.catalog.clone()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
