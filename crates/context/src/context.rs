use crate::Value;
use crate::error::ContextError;
use crate::state::ExecutionStack;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt;
use xchain_types::{ContentHandler, QName, SaxError};

/// The scopes a variable can be declared in, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Request,
    Execution,
    Chain,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Request => "request",
            Scope::Execution => "execution",
            Scope::Chain => "chain",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Frame {
    scope: Scope,
    variables: HashMap<QName, Value>,
}

impl Frame {
    fn new(scope: Scope) -> Self {
        Self {
            scope,
            variables: HashMap::new(),
        }
    }
}

/// The variable store passed through a command graph during one request.
///
/// A context is owned by exactly one logical call stack. Commands are shared
/// between requests, so anything describing a single invocation (variables,
/// nesting state, the output handler) lives here rather than in the command.
pub struct Context {
    frames: Vec<Frame>,
    namespaces: BTreeMap<String, String>,
    handler: Option<Box<dyn ContentHandler>>,
    execution: ExecutionStack,
    pending_output_error: Option<SaxError>,
    suppressed: Vec<Box<dyn Error + Send + Sync>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("frames", &self.frames)
            .field("namespaces", &self.namespaces)
            .field("has_handler", &self.handler.is_some())
            .field("execution", &self.execution)
            .field("suppressed", &self.suppressed.len())
            .finish()
    }
}

impl Context {
    /// Creates a context with an open request scope.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(Scope::Request)],
            namespaces: BTreeMap::new(),
            handler: None,
            execution: ExecutionStack::default(),
            pending_output_error: None,
            suppressed: Vec::new(),
        }
    }

    // --- Scopes ---

    pub fn start_scope(&mut self, scope: Scope) {
        self.frames.push(Frame::new(scope));
    }

    /// Ends the innermost scope, which must be of the given kind. Only the
    /// variables declared in that scope are removed.
    pub fn end_scope(&mut self, scope: Scope) -> Result<(), ContextError> {
        if self.frames.len() == 1 {
            return Err(if scope == Scope::Request {
                ContextError::RootScope
            } else {
                ContextError::ScopeNotOpen(scope)
            });
        }
        if !self.is_open(scope) {
            return Err(ContextError::ScopeNotOpen(scope));
        }
        let innermost = self.frames[self.frames.len() - 1].scope;
        if innermost != scope {
            return Err(ContextError::ScopeMismatch {
                expected: scope,
                found: innermost,
            });
        }
        self.frames.pop();
        Ok(())
    }

    pub fn is_open(&self, scope: Scope) -> bool {
        self.frames.iter().any(|f| f.scope == scope)
    }

    // --- Variables ---

    /// Declares a variable in the innermost open scope of the given kind,
    /// shadowing any outer declaration of the same name.
    pub fn declare(
        &mut self,
        name: impl Into<QName>,
        value: Value,
        scope: Scope,
    ) -> Result<(), ContextError> {
        let frame = self
            .frames
            .iter_mut()
            .rev()
            .find(|f| f.scope == scope)
            .ok_or(ContextError::ScopeNotOpen(scope))?;
        frame.variables.insert(name.into(), value);
        Ok(())
    }

    /// Updates the nearest visible declaration.
    pub fn assign(&mut self, name: &QName, value: Value) -> Result<(), ContextError> {
        let slot = self
            .frames
            .iter_mut()
            .rev()
            .find_map(|f| f.variables.get_mut(name))
            .ok_or_else(|| ContextError::Undeclared(name.to_string()))?;
        *slot = value;
        Ok(())
    }

    /// Looks a variable up from the innermost scope outwards.
    pub fn get(&self, name: &QName) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| f.variables.get(name))
    }

    /// The variable rendered as a string; strings are returned without quotes.
    /// `null` counts as absent.
    pub fn get_string(&self, name: &QName) -> Option<String> {
        match self.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn contains(&self, name: &QName) -> bool {
        self.get(name).is_some()
    }

    /// The scope the visible declaration of `name` lives in.
    pub fn scope_of(&self, name: &QName) -> Option<Scope> {
        self.frames
            .iter()
            .rev()
            .find(|f| f.variables.contains_key(name))
            .map(|f| f.scope)
    }

    // --- Namespaces ---

    pub fn bind_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespaces.insert(prefix.into(), uri.into());
    }

    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// A prefix bound to `uri`. Non-empty prefixes are preferred over the
    /// default prefix.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        let mut found = None;
        for (prefix, bound) in &self.namespaces {
            if bound == uri {
                if !prefix.is_empty() {
                    return Some(prefix.as_str());
                }
                found = Some(prefix.as_str());
            }
        }
        found
    }

    // --- Output ---

    /// Installs the output handler, returning the previous one.
    pub fn set_content_handler(
        &mut self,
        handler: Box<dyn ContentHandler>,
    ) -> Option<Box<dyn ContentHandler>> {
        self.handler.replace(handler)
    }

    pub fn take_content_handler(&mut self) -> Option<Box<dyn ContentHandler>> {
        self.handler.take()
    }

    pub fn content_handler(&mut self) -> Result<&mut (dyn ContentHandler + 'static), SaxError> {
        self.handler.as_deref_mut().ok_or(SaxError::NoHandler)
    }

    /// Records an output error discovered somewhere the normal return channel
    /// cannot carry it. The first registered error is kept.
    pub fn register_output_error(&mut self, error: SaxError) {
        if self.pending_output_error.is_none() {
            self.pending_output_error = Some(error);
        }
    }

    pub fn has_pending_output_error(&self) -> bool {
        self.pending_output_error.is_some()
    }

    pub fn take_output_error(&mut self) -> Option<SaxError> {
        self.pending_output_error.take()
    }

    // --- Execution bookkeeping ---

    pub fn execution(&self) -> &ExecutionStack {
        &self.execution
    }

    pub fn execution_mut(&mut self) -> &mut ExecutionStack {
        &mut self.execution
    }

    /// Keeps an error that was deliberately swallowed during cleanup.
    pub fn record_suppressed(&mut self, error: Box<dyn Error + Send + Sync>) {
        self.suppressed.push(error);
    }

    pub fn suppressed_errors(&self) -> &[Box<dyn Error + Send + Sync>] {
        &self.suppressed
    }

    pub fn take_suppressed_errors(&mut self) -> Vec<Box<dyn Error + Send + Sync>> {
        std::mem::take(&mut self.suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_walks_innermost_first() {
        let mut ctx = Context::new();
        ctx.declare("x", json!("request"), Scope::Request).unwrap();
        ctx.start_scope(Scope::Execution);
        ctx.declare("x", json!("execution"), Scope::Execution).unwrap();

        assert_eq!(ctx.get(&"x".into()), Some(&json!("execution")));
        assert_eq!(ctx.scope_of(&"x".into()), Some(Scope::Execution));

        ctx.end_scope(Scope::Execution).unwrap();
        assert_eq!(ctx.get(&"x".into()), Some(&json!("request")));
    }

    #[test]
    fn test_end_scope_removes_only_that_scope() {
        let mut ctx = Context::new();
        ctx.start_scope(Scope::Execution);
        ctx.declare("outer", json!(1), Scope::Execution).unwrap();
        ctx.start_scope(Scope::Chain);
        ctx.declare("inner", json!(2), Scope::Chain).unwrap();

        ctx.end_scope(Scope::Chain).unwrap();
        assert!(!ctx.contains(&"inner".into()));
        assert!(ctx.contains(&"outer".into()));
    }

    #[test]
    fn test_declare_into_closed_scope_fails() {
        let mut ctx = Context::new();
        let err = ctx.declare("x", json!(1), Scope::Chain).unwrap_err();
        assert_eq!(err, ContextError::ScopeNotOpen(Scope::Chain));
    }

    #[test]
    fn test_end_scope_requires_innermost() {
        let mut ctx = Context::new();
        ctx.start_scope(Scope::Execution);
        ctx.start_scope(Scope::Chain);

        let err = ctx.end_scope(Scope::Execution).unwrap_err();
        assert_eq!(
            err,
            ContextError::ScopeMismatch {
                expected: Scope::Execution,
                found: Scope::Chain
            }
        );
        assert_eq!(ctx.end_scope(Scope::Request), Err(ContextError::ScopeMismatch {
            expected: Scope::Request,
            found: Scope::Chain
        }));
    }

    #[test]
    fn test_root_request_scope_cannot_end() {
        let mut ctx = Context::new();
        assert_eq!(ctx.end_scope(Scope::Request), Err(ContextError::RootScope));
        assert_eq!(
            ctx.end_scope(Scope::Chain),
            Err(ContextError::ScopeNotOpen(Scope::Chain))
        );
    }

    #[test]
    fn test_assign_updates_nearest_declaration() {
        let mut ctx = Context::new();
        ctx.declare("count", json!(1), Scope::Request).unwrap();
        ctx.start_scope(Scope::Chain);
        ctx.assign(&"count".into(), json!(2)).unwrap();
        ctx.end_scope(Scope::Chain).unwrap();

        assert_eq!(ctx.get(&"count".into()), Some(&json!(2)));
        assert!(matches!(
            ctx.assign(&"missing".into(), json!(0)),
            Err(ContextError::Undeclared(_))
        ));
    }

    #[test]
    fn test_get_string_renders_values() {
        let mut ctx = Context::new();
        ctx.declare("s", json!("text"), Scope::Request).unwrap();
        ctx.declare("n", json!(42), Scope::Request).unwrap();
        ctx.declare("z", Value::Null, Scope::Request).unwrap();

        assert_eq!(ctx.get_string(&"s".into()).as_deref(), Some("text"));
        assert_eq!(ctx.get_string(&"n".into()).as_deref(), Some("42"));
        assert_eq!(ctx.get_string(&"z".into()), None);
    }

    #[test]
    fn test_prefix_lookup_prefers_named_prefix() {
        let mut ctx = Context::new();
        ctx.bind_namespace("", "urn:a");
        assert_eq!(ctx.prefix_for("urn:a"), Some(""));

        ctx.bind_namespace("a", "urn:a");
        assert_eq!(ctx.prefix_for("urn:a"), Some("a"));
        assert_eq!(ctx.namespace_uri("a"), Some("urn:a"));
        assert_eq!(ctx.prefix_for("urn:missing"), None);
    }

    #[test]
    fn test_first_output_error_wins() {
        let mut ctx = Context::new();
        ctx.register_output_error(SaxError::Handler("first".into()));
        ctx.register_output_error(SaxError::Handler("second".into()));

        assert!(ctx.has_pending_output_error());
        assert_eq!(
            ctx.take_output_error(),
            Some(SaxError::Handler("first".into()))
        );
        assert!(!ctx.has_pending_output_error());
    }

    #[test]
    fn test_missing_handler_is_an_error() {
        let mut ctx = Context::new();
        assert!(matches!(ctx.content_handler(), Err(SaxError::NoHandler)));
    }
}
