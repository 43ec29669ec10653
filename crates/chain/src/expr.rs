use xchain_context::Context;
use xchain_types::QName;

/// A value computed at execution time: a literal or a context variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExpr {
    Literal(String),
    Variable(QName),
}

impl ValueExpr {
    pub fn literal(value: impl Into<String>) -> Self {
        ValueExpr::Literal(value.into())
    }

    pub fn variable(name: impl Into<QName>) -> Self {
        ValueExpr::Variable(name.into())
    }

    /// The string value, or `None` when the variable is unset or null.
    pub fn evaluate(&self, context: &Context) -> Option<String> {
        match self {
            ValueExpr::Literal(value) => Some(value.clone()),
            ValueExpr::Variable(name) => context.get_string(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use xchain_context::Scope;

    #[test]
    fn test_evaluate_literal_and_variable() {
        let mut ctx = Context::new();
        ctx.declare("title", json!("Hello"), Scope::Request).unwrap();

        assert_eq!(ValueExpr::literal("x").evaluate(&ctx).as_deref(), Some("x"));
        assert_eq!(
            ValueExpr::variable("title").evaluate(&ctx).as_deref(),
            Some("Hello")
        );
        assert_eq!(ValueExpr::variable("missing").evaluate(&ctx), None);
    }
}
