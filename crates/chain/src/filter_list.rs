use crate::run::{forward, unwind};
use xchain_context::{Context, InstanceId};
use xchain_traits::{Command, CommandError, Filter, Outcome, SharedCommand};

/// A list of commands that is itself a filter.
///
/// `execute` only runs the forward pass and leaves a cursor on the context;
/// the enclosing chain later calls `post_process`, which unwinds the children
/// the matching execution entered. Cursors are kept per instance in LIFO
/// order, so the same list can be re-entered recursively within one request
/// and shared between requests on other threads.
#[derive(Debug)]
pub struct FilterList {
    id: InstanceId,
    commands: Vec<SharedCommand>,
}

impl Default for FilterList {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterList {
    pub fn new() -> Self {
        Self::with_commands(Vec::new())
    }

    pub fn with_commands(commands: Vec<SharedCommand>) -> Self {
        Self {
            id: InstanceId::next(),
            commands,
        }
    }

    pub fn add_command(&mut self, command: SharedCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[SharedCommand] {
        &self.commands
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }
}

impl Command for FilterList {
    fn execute(&self, context: &mut Context) -> Result<Outcome, CommandError> {
        let (entered, result) = forward(&self.commands, context);
        context.execution_mut().push_cursor(self.id, entered);
        result
    }

    fn as_filter(&self) -> Option<&dyn Filter> {
        Some(self)
    }
}

impl Filter for FilterList {
    fn post_process(
        &self,
        context: &mut Context,
        error: Option<&CommandError>,
    ) -> Result<bool, CommandError> {
        let Some(entered) = context.execution_mut().pop_cursor(self.id) else {
            log::warn!("FilterList post-processed without a matching execution");
            return Ok(false);
        };
        Ok(unwind(&self.commands[..entered], context, error))
    }
}
