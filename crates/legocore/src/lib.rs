//! Core abstractions for the LEGO flow engine
//!
//! Flow definitions, the provider and component contracts, and the error
//! taxonomy shared by the runtime, the providers and the front-ends. No
//! network code lives here.

mod builder;
mod component;
mod error;
pub mod events;
mod flow;
mod provider;
mod value;

pub use builder::FlowBuilder;
pub use component::{
    ComponentCatalog, ComponentCategory, ComponentDescriptor, PropDefinition, PropType,
};
pub use error::{ApiError, FlowError, StepError, WorkflowError};
pub use events::*;
pub use flow::{
    ApiBinding, Connection, FlowDefinition, FlowMetadata, HttpMethod, Position, Step, StepId,
};
pub use provider::{ApiProvider, ApiResponse, ProviderLookup, RequestOptions, ResponseMetadata};
pub use value::Resolved;

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
