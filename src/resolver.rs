//! Validation of chat requests against the registry and provider resolution.

use crate::error::ProxyError;
use crate::models::{ChatRequest, ResolvedRequest};
use crate::provider::ProviderNamespace;
use crate::registry::ModelRegistry;

/// Validate `request` and pin its provider.
///
/// Order of checks:
/// 1. the model must be in the registry;
/// 2. no provider (or an empty one) leaves the choice to the engine;
/// 3. an explicit provider must be registered for the model;
/// 4. and must exist in the engine's namespace.
///
/// All comparisons are exact and case-sensitive.
pub fn resolve(
    registry: &ModelRegistry,
    namespace: &ProviderNamespace,
    request: ChatRequest,
) -> Result<ResolvedRequest, ProxyError> {
    let available = registry
        .providers_for(&request.model)
        .ok_or_else(|| ProxyError::UnsupportedModel {
            model: request.model.clone(),
        })?;

    let provider = match request.requested_provider() {
        None => None,
        Some(name) => {
            if !available.iter().any(|p| p == name) {
                return Err(ProxyError::UnsupportedProviderForModel {
                    provider: name.to_string(),
                    model: request.model.clone(),
                    available: available.to_vec(),
                });
            }
            let resolved = namespace
                .lookup(name)
                .ok_or_else(|| ProxyError::UnknownProvider {
                    provider: name.to_string(),
                })?;
            Some(resolved)
        }
    };

    Ok(ResolvedRequest { request, provider })
}
