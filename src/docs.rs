//! OpenAPI document and the two human-facing renderings of it.

use axum::response::{Html, IntoResponse};
use axum::Json;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorBody;
use crate::models::{ChatMessage, ChatRequest, ChatResponse, ModelsResponse};

/// Name of the `X-API-Key` security scheme in the document.
pub const SECURITY_SCHEME: &str = "api_key";

struct ApiKeySecurity;

impl Modify for ApiKeySecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                SECURITY_SCHEME,
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "G4F Proxy API",
        description = "Proxy API for G4F models with restricted access to specific models and providers.",
        version = "1.0"
    ),
    paths(crate::server::chat, crate::server::list_models),
    components(schemas(ChatRequest, ChatMessage, ChatResponse, ModelsResponse, ErrorBody)),
    modifiers(&ApiKeySecurity),
    tags((name = "chat", description = "Chat completions and model catalog"))
)]
pub struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<link type="text/css" rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
<title>G4F Proxy API Docs</title>
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>
const ui = SwaggerUIBundle({
    url: '/openapi.json',
    dom_id: '#swagger-ui',
    layout: 'BaseLayout',
    deepLinking: true,
    showExtensions: true,
    showCommonExtensions: true,
    presets: [
        SwaggerUIBundle.presets.apis,
        SwaggerUIBundle.SwaggerUIStandalonePreset
    ],
})
</script>
</body>
</html>
"#;

const REDOC_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>G4F Proxy API - ReDoc</title>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>body { margin: 0; padding: 0; }</style>
</head>
<body>
<noscript>ReDoc requires Javascript to function. Please enable it to browse the documentation.</noscript>
<redoc spec-url="/openapi.json"></redoc>
<script src="https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"></script>
</body>
</html>
"#;

/// `GET /openapi.json`
pub async fn openapi_json() -> impl IntoResponse {
    Json(openapi())
}

/// `GET /docs`
pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

/// `GET /redoc`
pub async fn redoc() -> Html<&'static str> {
    Html(REDOC_HTML)
}
