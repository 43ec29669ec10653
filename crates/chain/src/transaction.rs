//! Transaction demarcation around a wrapped command.

use crate::run::execute_command;
use std::fmt::Debug;
use std::sync::Arc;
use xchain_context::Context;
use xchain_traits::{Command, CommandError, Outcome, SharedCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    NoTransaction,
    Active,
    MarkedRollback,
}

/// The operations the wrapper needs from an external transaction manager.
pub trait TransactionManager: Send + Sync + Debug {
    fn begin(&self) -> Result<(), CommandError>;
    fn commit(&self) -> Result<(), CommandError>;
    fn rollback(&self) -> Result<(), CommandError>;
    fn status(&self) -> Result<TransactionStatus, CommandError>;
}

/// Finds the transaction manager at execution time.
pub trait TransactionManagerLookup: Send + Sync + Debug {
    fn lookup(&self) -> Result<Arc<dyn TransactionManager>, CommandError>;
}

/// Always returns the same manager.
#[derive(Debug, Clone)]
pub struct StaticTransactionManagerLookup {
    manager: Arc<dyn TransactionManager>,
}

impl StaticTransactionManagerLookup {
    pub fn new(manager: Arc<dyn TransactionManager>) -> Self {
        Self { manager }
    }
}

impl TransactionManagerLookup for StaticTransactionManagerLookup {
    fn lookup(&self) -> Result<Arc<dyn TransactionManager>, CommandError> {
        Ok(self.manager.clone())
    }
}

/// Runs a command inside a transaction it begins itself.
///
/// A transaction that is already active belongs to someone else: the command
/// runs inside it and it is neither committed nor rolled back here.
#[derive(Debug)]
pub struct TransactionCommand {
    lookup: Arc<dyn TransactionManagerLookup>,
    command: SharedCommand,
}

impl TransactionCommand {
    pub fn new(lookup: Arc<dyn TransactionManagerLookup>, command: SharedCommand) -> Self {
        Self { lookup, command }
    }
}

impl Command for TransactionCommand {
    fn execute(&self, context: &mut Context) -> Result<Outcome, CommandError> {
        let manager = self.lookup.lookup()?;
        if manager.status()? != TransactionStatus::NoTransaction {
            return execute_command(self.command.as_ref(), context);
        }

        manager.begin()?;
        match execute_command(self.command.as_ref(), context) {
            Ok(outcome) => {
                let finished = match manager.status() {
                    Ok(TransactionStatus::MarkedRollback) => manager.rollback(),
                    Ok(_) => manager.commit(),
                    Err(err) => Err(err),
                };
                if let Err(err) = finished {
                    // A transaction that failed to finish must not be left open.
                    if manager.status().ok() != Some(TransactionStatus::NoTransaction) {
                        rollback_quietly(manager.as_ref(), context);
                    }
                    return Err(err);
                }
                Ok(outcome)
            }
            Err(err) => {
                rollback_quietly(manager.as_ref(), context);
                Err(err)
            }
        }
    }
}

fn rollback_quietly(manager: &dyn TransactionManager, context: &mut Context) {
    if let Err(rollback) = manager.rollback() {
        log::warn!("Rollback failed after transaction error: {}", rollback);
        context.record_suppressed(Box::new(rollback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chain;
    use crate::testing::{Behavior, Journal, PostBehavior, Probe};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct FakeManager {
        status: Mutex<TransactionStatus>,
        journal: Journal,
        fail_commit: bool,
        fail_rollback: bool,
    }

    impl FakeManager {
        fn new(status: TransactionStatus, journal: &Journal) -> Arc<Self> {
            Arc::new(Self {
                status: Mutex::new(status),
                journal: journal.clone(),
                fail_commit: false,
                fail_rollback: false,
            })
        }

        fn set(&self, status: TransactionStatus) {
            *self.status.lock().unwrap() = status;
        }
    }

    impl TransactionManager for FakeManager {
        fn begin(&self) -> Result<(), CommandError> {
            self.journal.record("tx:begin");
            self.set(TransactionStatus::Active);
            Ok(())
        }

        fn commit(&self) -> Result<(), CommandError> {
            self.journal.record("tx:commit");
            if self.fail_commit {
                return Err(CommandError::Transaction("commit refused".into()));
            }
            self.set(TransactionStatus::NoTransaction);
            Ok(())
        }

        fn rollback(&self) -> Result<(), CommandError> {
            self.journal.record("tx:rollback");
            self.set(TransactionStatus::NoTransaction);
            if self.fail_rollback {
                return Err(CommandError::Transaction("connection lost".into()));
            }
            Ok(())
        }

        fn status(&self) -> Result<TransactionStatus, CommandError> {
            Ok(*self.status.lock().unwrap())
        }
    }

    fn wrap(manager: Arc<FakeManager>, command: SharedCommand) -> TransactionCommand {
        TransactionCommand::new(
            Arc::new(StaticTransactionManagerLookup::new(manager)),
            command,
        )
    }

    #[test]
    fn test_commits_on_success() {
        let journal = Journal::default();
        let manager = FakeManager::new(TransactionStatus::NoTransaction, &journal);
        let command = wrap(
            manager,
            Arc::new(Probe::command("A", &journal, Behavior::Continue)),
        );

        let mut ctx = Context::new();
        command.execute(&mut ctx).unwrap();
        assert_eq!(journal.entries(), vec!["tx:begin", "exec:A", "tx:commit"]);
    }

    #[test]
    fn test_rolls_back_and_returns_original_error() {
        let journal = Journal::default();
        let manager = FakeManager::new(TransactionStatus::NoTransaction, &journal);
        let chain = Chain::with_commands(vec![
            Arc::new(Probe::filter("A", &journal, Behavior::Continue, PostBehavior::Pass)),
            Arc::new(Probe::command("B", &journal, Behavior::Fail("boom"))),
        ]);
        let command = wrap(manager, Arc::new(chain));

        let mut ctx = Context::new();
        let err = command.execute(&mut ctx).unwrap_err();

        assert!(matches!(err, CommandError::Failed(ref m) if m == "boom"));
        assert_eq!(
            journal.entries(),
            vec!["tx:begin", "exec:A", "exec:B", "post:A:boom", "tx:rollback"]
        );
    }

    #[test]
    fn test_rollback_failure_does_not_replace_error() {
        let journal = Journal::default();
        let manager = Arc::new(FakeManager {
            status: Mutex::new(TransactionStatus::NoTransaction),
            journal: journal.clone(),
            fail_commit: false,
            fail_rollback: true,
        });
        let command = wrap(
            manager,
            Arc::new(Probe::command("A", &journal, Behavior::Fail("boom"))),
        );

        let mut ctx = Context::new();
        let err = command.execute(&mut ctx).unwrap_err();
        assert!(matches!(err, CommandError::Failed(ref m) if m == "boom"));
        assert_eq!(ctx.suppressed_errors().len(), 1);
    }

    #[test]
    fn test_active_transaction_is_left_alone() {
        let journal = Journal::default();
        let manager = FakeManager::new(TransactionStatus::Active, &journal);
        let command = wrap(
            manager,
            Arc::new(Probe::command("A", &journal, Behavior::Fail("boom"))),
        );

        let mut ctx = Context::new();
        assert!(command.execute(&mut ctx).is_err());
        assert_eq!(journal.entries(), vec!["exec:A"]);
    }

    #[test]
    fn test_marked_rollback_is_rolled_back() {
        #[derive(Debug)]
        struct MarkRollback(Arc<FakeManager>);

        impl Command for MarkRollback {
            fn execute(&self, _context: &mut Context) -> Result<Outcome, CommandError> {
                self.0.set(TransactionStatus::MarkedRollback);
                Ok(Outcome::Continue)
            }
        }

        let journal = Journal::default();
        let manager = FakeManager::new(TransactionStatus::NoTransaction, &journal);
        let command = wrap(manager.clone(), Arc::new(MarkRollback(manager)));

        let mut ctx = Context::new();
        command.execute(&mut ctx).unwrap();
        assert_eq!(journal.entries(), vec!["tx:begin", "tx:rollback"]);
    }

    #[test]
    fn test_failed_commit_rolls_back_and_reports_commit_error() {
        let journal = Journal::default();
        let manager = Arc::new(FakeManager {
            status: Mutex::new(TransactionStatus::NoTransaction),
            journal: journal.clone(),
            fail_commit: true,
            fail_rollback: false,
        });
        let command = wrap(
            manager.clone(),
            Arc::new(Probe::command("A", &journal, Behavior::Continue)),
        );

        let mut ctx = Context::new();
        let err = command.execute(&mut ctx).unwrap_err();

        assert!(matches!(err, CommandError::Transaction(ref m) if m == "commit refused"));
        assert_eq!(
            journal.entries(),
            vec!["tx:begin", "exec:A", "tx:commit", "tx:rollback"]
        );
        assert_eq!(manager.status().unwrap(), TransactionStatus::NoTransaction);
        assert!(ctx.suppressed_errors().is_empty());
    }
}
