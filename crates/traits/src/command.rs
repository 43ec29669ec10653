//! The command and filter contracts.
//!
//! A command is a stateless unit of work executed against a `Context`. The
//! same instance may run on many contexts at once, on different threads, so
//! everything that describes one invocation must live in the context.

use crate::resource::ResourceError;
use std::error::Error;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;
use xchain_context::{Context, ContextError};
use xchain_types::SaxError;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command failed: {0}")]
    Failed(String),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Output error: {0}")]
    Sax(#[from] SaxError),

    #[error("Malformed dynamic name: {0}")]
    DynamicName(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

impl CommandError {
    pub fn failed(message: impl Into<String>) -> Self {
        CommandError::Failed(message.into())
    }

    pub fn dynamic_name(message: impl Into<String>) -> Self {
        CommandError::DynamicName(message.into())
    }
}

/// What a command asks of the chain that runs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Let the remaining siblings run.
    #[default]
    Continue,
    /// The request has been handled; skip the remaining siblings.
    Stop,
}

impl Outcome {
    pub fn is_stop(self) -> bool {
        self == Outcome::Stop
    }
}

pub trait Command: Send + Sync + Debug {
    /// Runs the command. Returning `Err` ends the enclosing chain's forward
    /// pass just like `Outcome::Stop`, and the error propagates unless a
    /// filter handles it.
    fn execute(&self, context: &mut Context) -> Result<Outcome, CommandError>;

    /// The filter capability of this command, if it has one.
    fn as_filter(&self) -> Option<&dyn Filter> {
        None
    }
}

/// A command with a cleanup hook that runs while the enclosing chain unwinds.
pub trait Filter: Command {
    /// Called once, in reverse execution order, for every filter whose
    /// `execute` was entered. `error` is the error that ended the forward pass.
    /// Returning `Ok(true)` marks that error as handled.
    fn post_process(
        &self,
        context: &mut Context,
        error: Option<&CommandError>,
    ) -> Result<bool, CommandError>;
}

pub type SharedCommand = Arc<dyn Command>;
