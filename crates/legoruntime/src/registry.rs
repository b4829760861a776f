use futures::future::try_join_all;
use legocore::{
    ApiError, ApiProvider, ComponentCatalog, ComponentCategory, ComponentDescriptor,
    ProviderLookup,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Catalog of available components, keyed by component id.
pub struct ComponentRegistry {
    components: HashMap<String, Arc<ComponentDescriptor>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            components: HashMap::new(),
        }
    }

    pub fn register(&mut self, component: ComponentDescriptor) {
        tracing::debug!("Registering component: {}", component.id);
        self.components
            .insert(component.id.clone(), Arc::new(component));
    }

    /// All components sorted by id
    pub fn all(&self) -> Vec<Arc<ComponentDescriptor>> {
        let mut all: Vec<_> = self.components.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn by_category(&self, category: ComponentCategory) -> Vec<Arc<ComponentDescriptor>> {
        self.all()
            .into_iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Case-insensitive match on name, description or tags.
    pub fn search(&self, query: &str) -> Vec<Arc<ComponentDescriptor>> {
        let query = query.to_lowercase();
        self.all()
            .into_iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&query)
                    || c.description.to_lowercase().contains(&query)
                    || c.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentCatalog for ComponentRegistry {
    fn get(&self, component_id: &str) -> Option<Arc<ComponentDescriptor>> {
        self.components.get(component_id).cloned()
    }
}

/// Registry of API providers. Names are case-insensitive.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ApiProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn ApiProvider>) {
        let name = provider.name().to_lowercase();
        tracing::info!("Registering API provider: {}", name);
        self.providers.insert(name, provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ApiProvider>> {
        self.providers.get(&name.to_lowercase()).cloned()
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn all(&self) -> Vec<Arc<dyn ApiProvider>> {
        self.names()
            .iter()
            .filter_map(|name| self.providers.get(name).cloned())
            .collect()
    }

    /// Authenticate every provider concurrently.
    pub async fn authenticate_all(&self) -> Result<(), ApiError> {
        try_join_all(self.providers.values().map(|p| p.authenticate())).await?;
        Ok(())
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderLookup for ProviderRegistry {
    fn provider(&self, name: &str) -> Option<Arc<dyn ApiProvider>> {
        self.get(name)
    }
}
