use crate::flow::{ApiBinding, Connection, FlowDefinition, FlowMetadata, Position, Step, StepId};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Programmatic construction of a [`FlowDefinition`].
///
/// Step ids are assigned sequentially (`step_1`, `step_2`, ...) and
/// connection ids likewise (`conn_1`, ...).
pub struct FlowBuilder {
    flow: FlowDefinition,
}

impl FlowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let id = format!("flow_{}", Utc::now().timestamp_millis());
        Self {
            flow: FlowDefinition::new(id, name),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.flow.id = id.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.flow.description = Some(description.into());
        self
    }

    pub fn add_step(
        &mut self,
        component_id: impl Into<String>,
        config: Map<String, Value>,
        position: Option<Position>,
        api_binding: Option<ApiBinding>,
    ) -> StepId {
        let id = self.next_step_id();
        self.flow.steps.push(Step {
            id: id.clone(),
            component_id: component_id.into(),
            position: Some(position.unwrap_or(Position { x: 0.0, y: 0.0 })),
            config,
            api_binding,
        });
        id
    }

    /// Add a step built with the fluent [`Step`] helpers. An empty id is
    /// replaced by the next sequential one.
    pub fn add(&mut self, mut step: Step) -> StepId {
        if step.id.is_empty() {
            step.id = self.next_step_id();
        }
        let id = step.id.clone();
        self.flow.steps.push(step);
        id
    }

    pub fn connect(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        data_mapping: Option<BTreeMap<String, String>>,
    ) {
        let id = format!("conn_{}", self.flow.connections.len() + 1);
        self.flow.connections.push(Connection {
            id: Some(id),
            from: from.into(),
            to: to.into(),
            data_mapping,
        });
    }

    pub fn set_metadata(&mut self, metadata: FlowMetadata) {
        self.flow.metadata = Some(metadata);
    }

    pub fn build(self) -> FlowDefinition {
        self.flow
    }

    fn next_step_id(&self) -> StepId {
        format!("step_{}", self.flow.steps.len() + 1)
    }
}
