use crate::context::{ExecutionContext, ExecutionResult, ExecutionStatus};
use crate::mapping::apply_response_mapping;
use crate::order::DependencyGraph;
use crate::resolve::VariableResolver;
use crate::runtime::{ExecutionMode, RuntimeConfig};
use chrono::Utc;
use futures::future::join_all;
use legocore::{
    ApiBinding, ApiError, ComponentCatalog, EventBus, EventEmitter, ExecutionEvent, ExecutionId,
    FlowDefinition, FlowError, ProviderLookup, RequestOptions, Step, StepError, WorkflowError,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Runs one flow definition and reports the outcome.
///
/// An engine owns the execution context of its run; concurrent runs of the
/// same flow need separate engines.
pub struct FlowEngine {
    flow: Arc<FlowDefinition>,
    components: Arc<dyn ComponentCatalog>,
    providers: Arc<dyn ProviderLookup>,
    config: RuntimeConfig,
    events: Option<Arc<EventBus>>,
    context: ExecutionContext,
}

impl FlowEngine {
    pub fn new(
        flow: impl Into<Arc<FlowDefinition>>,
        components: Arc<dyn ComponentCatalog>,
        providers: Arc<dyn ProviderLookup>,
    ) -> Self {
        let flow = flow.into();
        let context = ExecutionContext::new(flow.id.clone());
        Self {
            flow,
            components,
            providers,
            config: RuntimeConfig::default(),
            events: None,
            context,
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn step_result(&self, step_id: &str) -> Option<&Value> {
        self.context.step_result(step_id)
    }

    /// Execute the flow. Never fails: problems are reported in the result,
    /// together with the results of the steps that completed before them.
    pub async fn execute(&mut self) -> ExecutionResult {
        let execution_id = ExecutionId::new_v4();
        let start = Instant::now();
        let emitter = self
            .events
            .as_ref()
            .map(|bus| bus.create_emitter(execution_id));

        self.context = ExecutionContext::new(self.flow.id.clone());
        self.context.set_status(ExecutionStatus::Running);

        info!(
            "Starting flow execution: {} ({} steps, execution {})",
            self.flow.id,
            self.flow.steps.len(),
            execution_id
        );
        if let Some(emitter) = &emitter {
            emitter.emit(ExecutionEvent::FlowStarted {
                execution_id,
                flow_id: self.flow.id.clone(),
                step_count: self.flow.steps.len(),
                timestamp: Utc::now(),
            });
        }

        let outcome = match self.config.execution_mode {
            ExecutionMode::Sequential => self.run_sequential(emitter.as_ref()).await,
            ExecutionMode::Concurrent => self.run_concurrent(emitter.as_ref()).await,
        };

        let execution_time_ms = start.elapsed().as_millis() as u64;
        let error = match outcome {
            Ok(()) => {
                self.context.set_status(ExecutionStatus::Completed);
                info!("Flow {} completed in {}ms", self.flow.id, execution_time_ms);
                None
            }
            Err(e) => {
                self.context.fail(&e);
                error!("Flow {} failed after {}ms: {}", self.flow.id, execution_time_ms, e);
                Some(e)
            }
        };

        if let Some(emitter) = &emitter {
            emitter.emit(ExecutionEvent::FlowCompleted {
                execution_id,
                flow_id: self.flow.id.clone(),
                success: error.is_none(),
                duration_ms: execution_time_ms,
                timestamp: Utc::now(),
            });
        }

        ExecutionResult {
            success: error.is_none(),
            flow_id: self.flow.id.clone(),
            execution_id,
            results: self.context.step_results().clone(),
            execution_time_ms,
            error,
        }
    }

    async fn run_sequential(&mut self, emitter: Option<&EventEmitter>) -> Result<(), FlowError> {
        let flow = Arc::clone(&self.flow);
        let graph = DependencyGraph::build(&flow)?;
        let order = graph.execution_order()?;
        debug!("Execution order for {}: {:?}", flow.id, order);

        let runner = StepRunner {
            components: self.components.as_ref(),
            providers: self.providers.as_ref(),
            emitter,
        };

        for step_id in order {
            let step = flow
                .find_step(step_id)
                .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;

            self.context.set_current_step(step_id);
            let result = runner.run(step, self.context.step_results()).await?;
            self.context.record(step_id, result);
        }

        Ok(())
    }

    /// Run ready sets one after another, the steps of each set concurrently.
    /// Successful siblings of a failing step are still recorded.
    async fn run_concurrent(&mut self, emitter: Option<&EventEmitter>) -> Result<(), FlowError> {
        let flow = Arc::clone(&self.flow);
        let graph = DependencyGraph::build(&flow)?;
        let order = graph.execution_order()?;
        let sets = graph.ready_sets(&order);
        debug!("Ready sets for {}: {:?}", flow.id, sets);

        let runner = StepRunner {
            components: self.components.as_ref(),
            providers: self.providers.as_ref(),
            emitter,
        };

        for set in sets {
            let steps = set
                .iter()
                .map(|id| {
                    flow.find_step(id)
                        .ok_or_else(|| WorkflowError::StepNotFound(id.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            if let Some(first) = set.first() {
                self.context.set_current_step(first);
            }

            let results = self.context.step_results();
            let outcomes = join_all(steps.iter().map(|step| runner.run(step, results))).await;

            let mut first_error = None;
            for (step, outcome) in steps.iter().zip(outcomes) {
                match outcome {
                    Ok(result) => self.context.record(&step.id, result),
                    Err(e) => {
                        self.context.set_current_step(&step.id);
                        first_error.get_or_insert(e);
                    }
                }
            }

            if let Some(e) = first_error {
                return Err(e);
            }
        }

        Ok(())
    }
}

/// Executes single steps against a snapshot of earlier results.
struct StepRunner<'a> {
    components: &'a dyn ComponentCatalog,
    providers: &'a dyn ProviderLookup,
    emitter: Option<&'a EventEmitter>,
}

impl StepRunner<'_> {
    async fn run(&self, step: &Step, results: &Map<String, Value>) -> Result<Value, FlowError> {
        let start = Instant::now();
        debug!("Executing step {} ({})", step.id, step.component_id);
        self.emit(|execution_id| ExecutionEvent::StepStarted {
            execution_id,
            step_id: step.id.clone(),
            component_id: step.component_id.clone(),
            timestamp: Utc::now(),
        });

        match self.execute_step(step, results).await {
            Ok(result) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!("Step {} completed in {}ms", step.id, duration_ms);
                self.emit(|execution_id| ExecutionEvent::StepCompleted {
                    execution_id,
                    step_id: step.id.clone(),
                    result: result.clone(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
                Ok(result)
            }
            Err(e) => {
                error!("Step {} failed: {}", step.id, e);
                self.emit(|execution_id| ExecutionEvent::StepFailed {
                    execution_id,
                    step_id: step.id.clone(),
                    error: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(FlowError::step(step.id.clone(), e))
            }
        }
    }

    async fn execute_step(&self, step: &Step, results: &Map<String, Value>) -> Result<Value, StepError> {
        if !self.components.contains(&step.component_id) {
            return Err(StepError::UnknownComponent(step.component_id.clone()));
        }

        match &step.api_binding {
            Some(binding) => self.call_api(step, binding, results).await,
            None => {
                let mut resolver = VariableResolver::new(results);
                let config = resolver.resolve_map(&step.config);
                self.report_gaps(step, resolver.unresolved());
                Ok(Value::Object(config))
            }
        }
    }

    async fn call_api(
        &self,
        step: &Step,
        binding: &ApiBinding,
        results: &Map<String, Value>,
    ) -> Result<Value, StepError> {
        let provider = self
            .providers
            .provider(&binding.provider)
            .ok_or_else(|| StepError::UnknownProvider(binding.provider.clone()))?;

        let mut resolver = VariableResolver::new(results);
        let params = resolver.resolve_map(&binding.params);
        let body = binding.body.as_ref().map(|b| resolver.resolve(b));
        let headers = binding
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), resolver.resolve_str(value).render()))
            .collect();
        self.report_gaps(step, resolver.unresolved());

        check_required(binding, &params, body.as_ref())?;

        debug!(
            "Step {} calling {} {} {}",
            step.id, binding.provider, binding.method, binding.endpoint
        );
        let options = RequestOptions {
            method: binding.method,
            params: (!params.is_empty()).then_some(params),
            body,
            headers,
        };
        let response = provider.request(&binding.endpoint, options).await;

        if !response.success {
            let error = response
                .error
                .unwrap_or_else(|| ApiError::new("UNKNOWN", "Unknown error"));
            return Err(StepError::ApiCallFailed {
                provider: binding.provider.clone(),
                code: error.code,
                message: error.message,
            });
        }

        let data = response.data.unwrap_or(Value::Null);
        Ok(match &binding.response_mapping {
            Some(mapping) => apply_response_mapping(&data, mapping),
            None => data,
        })
    }

    fn report_gaps(&self, step: &Step, unresolved: &[String]) {
        for reference in unresolved {
            if let Some(emitter) = self.emitter {
                emitter.warn(
                    Some(&step.id),
                    format!("Unresolved reference {{{{{}}}}}", reference),
                );
            }
        }
    }

    fn emit(&self, event: impl FnOnce(ExecutionId) -> ExecutionEvent) {
        if let Some(emitter) = self.emitter {
            emitter.emit(event(emitter.execution_id()));
        }
    }
}

/// Fail when a field listed in `required` is absent or null after resolution.
/// A null query param does not hide a body value of the same name.
fn check_required(
    binding: &ApiBinding,
    params: &Map<String, Value>,
    body: Option<&Value>,
) -> Result<(), StepError> {
    for field in &binding.required {
        let value = params
            .get(field)
            .filter(|v| !v.is_null())
            .or_else(|| body.and_then(|b| b.get(field)));
        if value.map_or(true, Value::is_null) {
            return Err(StepError::UnresolvedField {
                field: field.clone(),
            });
        }
    }
    Ok(())
}
