use anyhow::Result;
use std::time::Duration;

use crate::auth::ApiKeySet;
use crate::registry::ModelRegistry;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_ENGINE_URL: &str = "http://127.0.0.1:1337";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Process configuration, read once at startup.
///
/// Environment:
/// - HOST / PORT                     -> listen address (BIND_ADDR overrides both)
/// - PROXY_API_KEYS                  -> comma-separated key allow-set
/// - PROXY_MODEL_REGISTRY            -> JSON file replacing the built-in registry
/// - G4F_BASE_URL / G4F_API_KEY      -> completion engine endpoint and optional bearer
/// - PROXY_REQUEST_TIMEOUT_SECONDS   -> per-completion limit, 0 disables
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub bind_addr: String,
    pub api_keys: ApiKeySet,
    pub registry_path: Option<String>,
    pub engine_url: String,
    pub engine_api_key: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("{DEFAULT_HOST}:{DEFAULT_PORT}"),
            api_keys: ApiKeySet::default(),
            registry_path: None,
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            engine_api_key: None,
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get the bind address from BIND_ADDR, else HOST and PORT, else 0.0.0.0:9000.
pub fn env_bind_addr() -> String {
    if let Some(addr) = non_empty_var("BIND_ADDR") {
        return addr;
    }
    let host = non_empty_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match non_empty_var("PORT") {
        Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid PORT value '{}', using {}", raw, DEFAULT_PORT);
            DEFAULT_PORT
        }),
        None => DEFAULT_PORT,
    };
    format!("{host}:{port}")
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        let api_keys = match non_empty_var("PROXY_API_KEYS") {
            Some(raw) => {
                let keys = ApiKeySet::parse_list(&raw);
                if keys.is_empty() {
                    tracing::warn!("PROXY_API_KEYS contained no keys, using built-in keys");
                    ApiKeySet::default()
                } else {
                    keys
                }
            }
            None => ApiKeySet::default(),
        };

        let request_timeout = match non_empty_var("PROXY_REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(n) => Some(Duration::from_secs(n)),
                Err(_) => {
                    tracing::warn!(
                        "Ignoring invalid PROXY_REQUEST_TIMEOUT_SECONDS '{}', using {}s",
                        raw,
                        DEFAULT_REQUEST_TIMEOUT_SECS
                    );
                    Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
                }
            },
            None => Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        };

        Self {
            bind_addr: env_bind_addr(),
            api_keys,
            registry_path: non_empty_var("PROXY_MODEL_REGISTRY"),
            engine_url: non_empty_var("G4F_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ENGINE_URL.to_string()),
            engine_api_key: non_empty_var("G4F_API_KEY"),
            request_timeout,
        }
    }

    /// The registry named by `registry_path`, or the built-in one.
    pub fn load_registry(&self) -> Result<ModelRegistry> {
        match &self.registry_path {
            Some(path) => {
                tracing::info!("Loading model registry from: {}", path);
                ModelRegistry::load_from_file(path)
            }
            None => Ok(ModelRegistry::builtin()),
        }
    }
}
