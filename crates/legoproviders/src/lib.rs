//! API providers and the built-in component catalog
//!
//! HTTP-backed providers for the citizen-service backends, plus the
//! descriptors of the blocks a flow can be assembled from and a few
//! ready-made flows built from them.

mod catalog;
mod config;
mod examples;
mod gov;
mod http;

pub use catalog::{default_component_registry, default_components};
pub use config::{ProviderConfig, RetryPolicy};
pub use examples::{
    all_example_flows, company_verification_flow, document_signing_flow, example_flow,
    traffic_fine_flow, TEMPLATE_NAMES,
};
pub use gov::{DiiaProvider, MonobankProvider, OpenDataBotProvider};
pub use http::HttpProvider;
use legoruntime::ProviderRegistry;

use std::sync::Arc;

/// Register all standard providers with a registry
pub fn register_all(registry: &mut ProviderRegistry) -> Result<(), reqwest::Error> {
    registry.register(Arc::new(DiiaProvider::new()?));
    registry.register(Arc::new(OpenDataBotProvider::new()?));
    registry.register(Arc::new(MonobankProvider::new()?));
    Ok(())
}

/// Registry holding the standard providers.
pub fn default_provider_registry() -> Result<ProviderRegistry, reqwest::Error> {
    let mut registry = ProviderRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}
