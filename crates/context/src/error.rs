use crate::context::Scope;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("No {0} scope is open")]
    ScopeNotOpen(Scope),

    #[error("Cannot end {expected} scope while a {found} scope is still open")]
    ScopeMismatch { expected: Scope, found: Scope },

    #[error("The outermost request scope ends with the context")]
    RootScope,

    #[error("Variable '{0}' is not declared")]
    Undeclared(String),
}
