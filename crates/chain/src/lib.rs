//! The XChain execution engine.
//!
//! ## Key Abstractions
//!
//! - [`Chain`]: ordered commands with early stop and reverse post-processing
//! - [`FilterList`]: a chain that is also a filter and may be re-entered
//! - [`TemplateCommand`]: a command that emits output events around its children
//! - [`TransactionCommand`]: wraps a command in a transaction boundary
//! - [`ScopedCommand`], [`VariableCommand`] and friends: building blocks for catalogs
//! - [`execute_command`]: runs any command, including a filter's cleanup hook

mod builtin;
mod chain;
mod expr;
mod filter_list;
mod qname;
mod run;
mod template;
mod transaction;

#[cfg(test)]
mod testing;

pub use builtin::{AssignCommand, FailCommand, ScopedCommand, StopCommand, VariableCommand};
pub use chain::Chain;
pub use expr::ValueExpr;
pub use filter_list::FilterList;
pub use qname::dynamic_qname;
pub use run::execute_command;
pub use template::{AttributeTemplate, ElementTemplate, NameSpec, TemplateCommand, TemplateNode};
pub use transaction::{
    StaticTransactionManagerLookup, TransactionCommand, TransactionManager,
    TransactionManagerLookup, TransactionStatus,
};

pub use xchain_traits::{Command, CommandError, Filter, Outcome, SharedCommand};
