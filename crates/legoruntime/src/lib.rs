//! Flow execution runtime
//!
//! Orders the steps of a flow definition, resolves `{{step.field}}`
//! references between them, calls the bound API providers and reports a
//! structured execution result.

mod context;
mod engine;
mod loader;
mod mapping;
mod order;
mod registry;
mod resolve;
mod runtime;

pub use context::{ExecutionContext, ExecutionResult, ExecutionStatus};
pub use engine::FlowEngine;
pub use loader::load_flow;
pub use mapping::{apply_response_mapping, get_path, set_path};
pub use order::{execution_order, DependencyGraph};
pub use registry::{ComponentRegistry, ProviderRegistry};
pub use resolve::VariableResolver;
pub use runtime::{validate_flow, ExecutionMode, FlowRuntime, RuntimeConfig};
