use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Flow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Step '{step_id}' failed: {source}")]
    Step {
        step_id: String,
        #[source]
        source: StepError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlowError {
    pub fn step(step_id: impl Into<String>, source: StepError) -> Self {
        FlowError::Step {
            step_id: step_id.into(),
            source,
        }
    }

    /// Id of the step that triggered the failure, if any.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            FlowError::Step { step_id, .. } => Some(step_id),
            FlowError::Workflow(WorkflowError::CyclicDependency { step_id }) => Some(step_id),
            _ => None,
        }
    }
}

/// Errors raised while executing a single step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("Component not found: {0}")]
    UnknownComponent(String),

    #[error("API provider not found: {0}")]
    UnknownProvider(String),

    #[error("API call to '{provider}' failed [{code}]: {message}")]
    ApiCallFailed {
        provider: String,
        code: String,
        message: String,
    },

    #[error("Required field '{field}' resolved to nothing")]
    UnresolvedField { field: String },
}

/// Structural problems with a flow definition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Circular dependency detected at step: {step_id}")]
    CyclicDependency { step_id: String },

    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Duplicate step id: {0}")]
    DuplicateStep(String),

    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Unknown API provider: {0}")]
    UnknownProvider(String),
}

/// Structured failure reported by an API provider.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub const NETWORK: &'static str = "NETWORK_ERROR";
    pub const HTTP: &'static str = "HTTP_ERROR";
    pub const INVALID_RESPONSE: &'static str = "INVALID_RESPONSE";
    pub const INVALID_URL: &'static str = "INVALID_URL";
    pub const AUTHENTICATION: &'static str = "AUTHENTICATION_FAILED";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
