use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

fn truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_flag(key: &str) -> bool {
    std::env::var(key).map(|v| truthy(&v)).unwrap_or(false)
}

/// Load an env file, then install the tracing subscriber.
///
/// The env file is taken from ENV_FILE or DOTENV_PATH when set, else `.env` discovery.
/// RUST_LOG (possibly provided by that file) drives the filter.
pub fn init_tracing() {
    let mut env_source: String = "none".into();
    for key in ["ENV_FILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                env_source = format!("{p} ({key})");
                break;
            }
        }
    }
    if env_source == "none" {
        if let Ok(path) = dotenvy::dotenv() {
            env_source = path.display().to_string();
        }
    }

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Build the engine HTTP client honoring proxy environment variables.
///
/// Environment:
/// - G4F_NO_PROXY = 1|true|yes|on  -> disable all proxies
/// - G4F_PROXY_URL = <url>         -> proxy for all schemes
/// - HTTP_PROXY / http_proxy       -> HTTP proxy
/// - HTTPS_PROXY / https_proxy     -> HTTPS proxy
///
/// `timeout` bounds a whole engine request; the forwarder applies its own limit on top.
pub fn build_http_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }

    if env_flag("G4F_NO_PROXY") {
        builder = builder.no_proxy();
    } else {
        let proxies = [
            ("G4F_PROXY_URL", None),
            ("HTTP_PROXY", Some("http_proxy")),
            ("HTTPS_PROXY", Some("https_proxy")),
        ];
        for (key, alt) in proxies {
            let url = std::env::var(key)
                .or_else(|e| alt.map(std::env::var).unwrap_or(Err(e)))
                .ok()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty());
            let Some(url) = url else { continue };
            let proxy = match key {
                "HTTP_PROXY" => reqwest::Proxy::http(&url),
                "HTTPS_PROXY" => reqwest::Proxy::https(&url),
                _ => reqwest::Proxy::all(&url),
            };
            match proxy {
                Ok(p) => builder = builder.proxy(p),
                Err(e) => tracing::warn!("Ignoring invalid proxy {}={}: {}", key, url, e),
            }
        }
    }

    builder = builder.user_agent(format!("g4f-gate/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default HTTP client: {}", e);
        reqwest::Client::new()
    })
}

/// Split a comma-separated value; `None` when unset or `*`.
fn split_list(raw: Option<String>) -> Option<Vec<String>> {
    let raw = raw?;
    let raw = raw.trim();
    if raw == "*" {
        return None;
    }
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Build a CORS layer from environment variables.
///
/// Environment variables:
/// - CORS_ALLOWED_ORIGINS: "*" or comma-separated origins
/// - CORS_ALLOWED_METHODS: "*" or comma-separated methods
/// - CORS_ALLOWED_HEADERS: "*" or comma-separated request header names
/// - CORS_ALLOW_CREDENTIALS: enable with 1,true,yes,on
/// - CORS_MAX_AGE: max age in seconds (u64)
///
/// Anything unset or unparseable is permissive: `Any`, or the mirrored request
/// value when credentials are enabled (browsers refuse `*` with credentials).
pub fn cors_layer_from_env() -> CorsLayer {
    cors_layer_with(|key| std::env::var(key).ok())
}

fn cors_layer_with(var: impl Fn(&str) -> Option<String>) -> CorsLayer {
    let credentials = var("CORS_ALLOW_CREDENTIALS").is_some_and(|v| truthy(&v));
    let mut layer = CorsLayer::new();

    let origins: Vec<http::HeaderValue> = split_list(var("CORS_ALLOWED_ORIGINS"))
        .unwrap_or_default()
        .iter()
        .filter_map(|o| http::HeaderValue::from_str(o).ok())
        .collect();
    layer = match (origins.is_empty(), credentials) {
        (false, _) => layer.allow_origin(AllowOrigin::list(origins)),
        (true, true) => layer.allow_origin(AllowOrigin::mirror_request()),
        (true, false) => layer.allow_origin(Any),
    };

    let methods: Vec<http::Method> = split_list(var("CORS_ALLOWED_METHODS"))
        .unwrap_or_default()
        .iter()
        .filter_map(|m| http::Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
        .collect();
    layer = match (methods.is_empty(), credentials) {
        (false, _) => layer.allow_methods(AllowMethods::list(methods)),
        (true, true) => layer.allow_methods(AllowMethods::mirror_request()),
        (true, false) => layer.allow_methods(Any),
    };

    let headers: Vec<http::HeaderName> = split_list(var("CORS_ALLOWED_HEADERS"))
        .unwrap_or_default()
        .iter()
        .filter_map(|h| http::HeaderName::try_from(h.as_str()).ok())
        .collect();
    layer = match (headers.is_empty(), credentials) {
        (false, _) => layer.allow_headers(AllowHeaders::list(headers)),
        (true, true) => layer.allow_headers(AllowHeaders::mirror_request()),
        (true, false) => layer.allow_headers(Any),
    };

    if credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(n) = var("CORS_MAX_AGE").and_then(|secs| secs.trim().parse::<u64>().ok()) {
        layer = layer.max_age(Duration::from_secs(n));
    }

    layer
}
