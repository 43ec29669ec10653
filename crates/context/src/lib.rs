//! Request-scoped execution context for XChain commands.
//!
//! ## Key Abstractions
//!
//! - **`Context`**: scoped variable store passed through a command graph
//! - **`Scope`**: the request, execution and chain scopes a variable can live in
//! - **`ExecutionStack`**: nesting bookkeeping for filter lists and templates,
//!   carried by the context so it follows one logical call stack

mod context;
mod error;
mod state;

pub use context::{Context, Scope};
pub use error::ContextError;
pub use state::{
    CommandExecutionState, ElementOutputState, ExecutionStack, InstanceId, TemplateFrame,
};

/// Variable values held by a context.
pub type Value = serde_json::Value;
