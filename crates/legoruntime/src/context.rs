use legocore::{ExecutionId, FlowError};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

/// Per-run state. Only the engine mutates it; callers get read access.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    flow_id: String,
    step_results: Map<String, Value>,
    current_step: Option<String>,
    status: ExecutionStatus,
    error: Option<String>,
}

impl ExecutionContext {
    pub(crate) fn new(flow_id: impl Into<String>) -> Self {
        Self {
            flow_id: flow_id.into(),
            step_results: Map::new(),
            current_step: None,
            status: ExecutionStatus::Idle,
            error: None,
        }
    }

    pub fn flow_id(&self) -> &str {
        &self.flow_id
    }

    /// Results keyed by step id, in completion order.
    pub fn step_results(&self) -> &Map<String, Value> {
        &self.step_results
    }

    pub fn step_result(&self, step_id: &str) -> Option<&Value> {
        self.step_results.get(step_id)
    }

    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_status(&mut self, status: ExecutionStatus) {
        self.status = status;
    }

    pub(crate) fn set_current_step(&mut self, step_id: &str) {
        self.current_step = Some(step_id.to_string());
    }

    pub(crate) fn record(&mut self, step_id: &str, result: Value) {
        self.step_results.insert(step_id.to_string(), result);
    }

    pub(crate) fn fail(&mut self, error: &FlowError) {
        self.status = ExecutionStatus::Error;
        self.error = Some(error.to_string());
    }
}

/// Outcome of one flow run, handed back to callers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub flow_id: String,
    pub execution_id: ExecutionId,
    /// Step results accumulated up to the point of completion or failure.
    pub results: Map<String, Value>,
    #[serde(rename = "executionTime")]
    pub execution_time_ms: u64,
    #[serde(
        serialize_with = "serialize_error",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<FlowError>,
}

impl ExecutionResult {
    /// Id of the step that caused the failure, if known.
    pub fn failed_step(&self) -> Option<&str> {
        self.error.as_ref().and_then(FlowError::step_id)
    }
}

fn serialize_error<S: Serializer>(error: &Option<FlowError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}
