use xchain_context::Context;
use xchain_traits::{Command, CommandError, Filter, Outcome, SharedCommand};

/// Runs a command and, if it is a filter, its post-process hook.
///
/// This is how a command is invoked from outside any chain: the cleanup hook
/// would otherwise be left to an enclosing chain that does not exist.
pub fn execute_command(
    command: &dyn Command,
    context: &mut Context,
) -> Result<Outcome, CommandError> {
    let result = command.execute(context);
    let Some(filter) = command.as_filter() else {
        return result;
    };
    let handled = post_process_quietly(filter, context, result.as_ref().err());
    match result {
        Err(err) if handled => {
            log::debug!("Error handled during post-processing: {}", err);
            Ok(Outcome::Continue)
        }
        other => other,
    }
}

/// Calls `post_process`, keeping any error it raises out of the unwind path.
pub(crate) fn post_process_quietly(
    filter: &dyn Filter,
    context: &mut Context,
    error: Option<&CommandError>,
) -> bool {
    match filter.post_process(context, error) {
        Ok(handled) => handled,
        Err(cleanup) => {
            log::warn!("Ignoring error from post-process: {}", cleanup);
            context.record_suppressed(Box::new(cleanup));
            false
        }
    }
}

/// Post-processes the filters among `entered` in reverse order and reports
/// whether any of them handled `error`.
pub(crate) fn unwind(
    entered: &[SharedCommand],
    context: &mut Context,
    error: Option<&CommandError>,
) -> bool {
    let mut handled = false;
    for command in entered.iter().rev() {
        if let Some(filter) = command.as_filter() {
            handled |= post_process_quietly(filter, context, error);
        }
    }
    handled
}

/// Runs commands in order until one stops or fails. Returns the number of
/// commands entered and the result of the last one.
pub(crate) fn forward(
    commands: &[SharedCommand],
    context: &mut Context,
) -> (usize, Result<Outcome, CommandError>) {
    let mut entered = 0;
    for command in commands {
        entered += 1;
        match command.execute(context) {
            Ok(Outcome::Continue) => {}
            other => return (entered, other),
        }
    }
    (entered, Ok(Outcome::Continue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, Journal, PostBehavior, Probe};

    #[test]
    fn test_execute_command_runs_filter_cleanup() {
        let journal = Journal::default();
        let probe = Probe::filter("A", &journal, Behavior::Continue, PostBehavior::Pass);

        let mut ctx = Context::new();
        let outcome = execute_command(&probe, &mut ctx).unwrap();

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(journal.entries(), vec!["exec:A", "post:A:none"]);
    }

    #[test]
    fn test_execute_command_filter_can_handle_own_error() {
        let journal = Journal::default();
        let probe = Probe::filter("A", &journal, Behavior::Fail("boom"), PostBehavior::Handle);

        let mut ctx = Context::new();
        let outcome = execute_command(&probe, &mut ctx).unwrap();

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(journal.entries(), vec!["exec:A", "post:A:boom"]);
    }

    #[test]
    fn test_execute_command_plain_command_passes_through() {
        let journal = Journal::default();
        let probe = Probe::command("A", &journal, Behavior::Fail("boom"));

        let mut ctx = Context::new();
        let err = execute_command(&probe, &mut ctx).unwrap_err();
        assert!(matches!(err, CommandError::Failed(ref m) if m == "boom"));
    }

    #[test]
    fn test_cleanup_errors_are_recorded_not_raised() {
        let journal = Journal::default();
        let probe = Probe::filter("A", &journal, Behavior::Continue, PostBehavior::Fail);

        let mut ctx = Context::new();
        assert_eq!(execute_command(&probe, &mut ctx).unwrap(), Outcome::Continue);
        assert_eq!(ctx.suppressed_errors().len(), 1);
    }
}
