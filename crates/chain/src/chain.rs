use crate::run::{forward, unwind};
use xchain_context::Context;
use xchain_traits::{Command, CommandError, Outcome, SharedCommand};

/// An ordered list of commands run until one stops or fails, followed by a
/// reverse post-processing pass over the filters that were entered.
///
/// The command list is fixed once the chain is shared; `add_command` needs
/// exclusive access.
#[derive(Debug, Default, Clone)]
pub struct Chain {
    commands: Vec<SharedCommand>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commands(commands: Vec<SharedCommand>) -> Self {
        Self { commands }
    }

    pub fn add_command(&mut self, command: SharedCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[SharedCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for Chain {
    fn execute(&self, context: &mut Context) -> Result<Outcome, CommandError> {
        let (entered, result) = forward(&self.commands, context);
        let (outcome, failure) = match result {
            Ok(outcome) => (outcome, None),
            Err(err) => (Outcome::Continue, Some(err)),
        };

        // The command that failed was entered too, so it is unwound with the rest.
        let handled = unwind(&self.commands[..entered], context, failure.as_ref());

        match failure {
            Some(err) if !handled => Err(err),
            Some(err) => {
                log::debug!("Chain error handled by a filter: {}", err);
                Ok(Outcome::Continue)
            }
            None => Ok(outcome),
        }
    }
}
