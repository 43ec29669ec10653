//! Small commands for assembling chains without custom code.

use crate::run::execute_command;
use serde_json::Value;
use xchain_context::{Context, Scope};
use xchain_traits::{Command, CommandError, Outcome, SharedCommand};
use xchain_types::QName;

/// Declares a variable in a scope.
#[derive(Debug, Clone)]
pub struct VariableCommand {
    name: QName,
    value: Value,
    scope: Scope,
}

impl VariableCommand {
    pub fn new(name: impl Into<QName>, value: Value, scope: Scope) -> Self {
        Self {
            name: name.into(),
            value,
            scope,
        }
    }
}

impl Command for VariableCommand {
    fn execute(&self, context: &mut Context) -> Result<Outcome, CommandError> {
        context.declare(self.name.clone(), self.value.clone(), self.scope)?;
        Ok(Outcome::Continue)
    }
}

/// Updates an already declared variable.
#[derive(Debug, Clone)]
pub struct AssignCommand {
    name: QName,
    value: Value,
}

impl AssignCommand {
    pub fn new(name: impl Into<QName>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Command for AssignCommand {
    fn execute(&self, context: &mut Context) -> Result<Outcome, CommandError> {
        context.assign(&self.name, self.value.clone())?;
        Ok(Outcome::Continue)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StopCommand;

impl Command for StopCommand {
    fn execute(&self, _context: &mut Context) -> Result<Outcome, CommandError> {
        Ok(Outcome::Stop)
    }
}

#[derive(Debug, Clone)]
pub struct FailCommand {
    message: String,
}

impl FailCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Command for FailCommand {
    fn execute(&self, _context: &mut Context) -> Result<Outcome, CommandError> {
        Err(CommandError::failed(self.message.clone()))
    }
}

/// Runs a command inside a scope of its own. Variables declared in that
/// scope are gone afterwards, whatever the outcome.
#[derive(Debug)]
pub struct ScopedCommand {
    scope: Scope,
    command: SharedCommand,
}

impl ScopedCommand {
    pub fn new(scope: Scope, command: SharedCommand) -> Self {
        Self { scope, command }
    }
}

impl Command for ScopedCommand {
    fn execute(&self, context: &mut Context) -> Result<Outcome, CommandError> {
        context.start_scope(self.scope);
        let result = execute_command(self.command.as_ref(), context);
        let ended = context.end_scope(self.scope);
        let outcome = result?;
        ended?;
        Ok(outcome)
    }
}
