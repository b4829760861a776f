use crate::order::DependencyGraph;
use crate::registry::{ComponentRegistry, ProviderRegistry};
use crate::{ExecutionResult, FlowEngine};
use legocore::{
    ComponentCatalog, EventBus, ExecutionEvent, FlowDefinition, ProviderLookup, WorkflowError,
};
use std::sync::Arc;

/// Process-wide registries and settings, assembled once at startup and
/// handed to every engine it creates.
pub struct FlowRuntime {
    components: Arc<ComponentRegistry>,
    providers: Arc<ProviderRegistry>,
    event_bus: Arc<EventBus>,
    config: RuntimeConfig,
}

impl FlowRuntime {
    pub fn new(
        components: Arc<ComponentRegistry>,
        providers: Arc<ProviderRegistry>,
        config: RuntimeConfig,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        Self {
            components,
            providers,
            event_bus,
            config,
        }
    }

    pub fn components(&self) -> &Arc<ComponentRegistry> {
        &self.components
    }

    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Create an engine for one run of `flow`.
    pub fn engine(&self, flow: impl Into<Arc<FlowDefinition>>) -> FlowEngine {
        FlowEngine::new(flow, self.components.clone(), self.providers.clone())
            .with_config(self.config.clone())
            .with_events(self.event_bus.clone())
    }

    pub async fn execute(&self, flow: impl Into<Arc<FlowDefinition>>) -> ExecutionResult {
        self.engine(flow).execute().await
    }

    /// Structural validation against the registered components and providers.
    pub fn validate(&self, flow: &FlowDefinition) -> Result<Vec<String>, WorkflowError> {
        validate_flow(flow, self.components.as_ref(), self.providers.as_ref())
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }
}

/// Check everything the engine would reject at run time: duplicate ids,
/// dangling connections, cycles, unknown components and providers. Returns
/// the execution order on success.
pub fn validate_flow(
    flow: &FlowDefinition,
    components: &dyn ComponentCatalog,
    providers: &dyn ProviderLookup,
) -> Result<Vec<String>, WorkflowError> {
    flow.validate()?;
    let graph = DependencyGraph::build(flow)?;
    let order = graph.execution_order()?;

    for step in &flow.steps {
        if !components.contains(&step.component_id) {
            return Err(WorkflowError::UnknownComponent(step.component_id.clone()));
        }
        if let Some(binding) = &step.api_binding {
            if providers.provider(&binding.provider).is_none() {
                return Err(WorkflowError::UnknownProvider(binding.provider.clone()));
            }
        }
    }

    Ok(order.into_iter().map(str::to_string).collect())
}

/// How steps are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One step at a time in execution order.
    #[default]
    Sequential,
    /// Steps of each ready set run concurrently.
    Concurrent,
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub execution_mode: ExecutionMode,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::Sequential,
            event_buffer_size: 1000,
        }
    }
}
