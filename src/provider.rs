//! Provider namespace of the completion engine.
//!
//! Provider names arrive as plain strings in requests and in the registry. They are
//! resolved here, once, into a tagged [`Provider`] value. A name that the engine does
//! not know resolves to `None`; lookups are exact and case-sensitive.

use std::collections::HashMap;
use std::fmt;

/// Backends the g4f engine can be forced to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Blackbox,
    PollinationsAI,
    Copilot,
    Cloudflare,
    Together,
    TeachAnything,
    PerplexityLabs,
    DeepInfra,
    HuggingChat,
    HuggingFace,
    LambdaChat,
    OpenaiChat,
    Gemini,
    Qwen,
    Yqcloud,
    Free2GPT,
    FreeGpt,
    DDG,
}

impl Provider {
    pub const ALL: [Provider; 18] = [
        Provider::Blackbox,
        Provider::PollinationsAI,
        Provider::Copilot,
        Provider::Cloudflare,
        Provider::Together,
        Provider::TeachAnything,
        Provider::PerplexityLabs,
        Provider::DeepInfra,
        Provider::HuggingChat,
        Provider::HuggingFace,
        Provider::LambdaChat,
        Provider::OpenaiChat,
        Provider::Gemini,
        Provider::Qwen,
        Provider::Yqcloud,
        Provider::Free2GPT,
        Provider::FreeGpt,
        Provider::DDG,
    ];

    /// Name as understood by the engine's API (`"provider"` field).
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Blackbox => "Blackbox",
            Provider::PollinationsAI => "PollinationsAI",
            Provider::Copilot => "Copilot",
            Provider::Cloudflare => "Cloudflare",
            Provider::Together => "Together",
            Provider::TeachAnything => "TeachAnything",
            Provider::PerplexityLabs => "PerplexityLabs",
            Provider::DeepInfra => "DeepInfra",
            Provider::HuggingChat => "HuggingChat",
            Provider::HuggingFace => "HuggingFace",
            Provider::LambdaChat => "LambdaChat",
            Provider::OpenaiChat => "OpenaiChat",
            Provider::Gemini => "Gemini",
            Provider::Qwen => "Qwen",
            Provider::Yqcloud => "Yqcloud",
            Provider::Free2GPT => "Free2GPT",
            Provider::FreeGpt => "FreeGpt",
            Provider::DDG => "DDG",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name -> provider table, built once at startup and owned by the engine.
#[derive(Debug, Clone)]
pub struct ProviderNamespace {
    by_name: HashMap<&'static str, Provider>,
}

impl ProviderNamespace {
    /// Every provider this build knows how to address.
    pub fn builtin() -> Self {
        Self::from_providers(Provider::ALL)
    }

    pub fn from_providers<I: IntoIterator<Item = Provider>>(providers: I) -> Self {
        let by_name = providers.into_iter().map(|p| (p.as_str(), p)).collect();
        Self { by_name }
    }

    pub fn lookup(&self, name: &str) -> Option<Provider> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for ProviderNamespace {
    fn default() -> Self {
        Self::builtin()
    }
}
