use crate::expr::ValueExpr;
use xchain_context::Context;
use xchain_traits::CommandError;
use xchain_types::QName;

/// Resolves a name computed at execution time into a prefix-consistent
/// `QName`.
///
/// - A non-empty prefix must be bound in the context; a namespace given
///   alongside it must match that binding.
/// - A namespace given without a prefix needs a prefix bound to it. When
///   `include_default_prefix` is false the default prefix does not count.
/// - With neither, element names (`include_default_prefix`) take the default
///   namespace and attribute names take no namespace.
///
/// Nothing is guessed: every inconsistency is a `DynamicName` error.
pub fn dynamic_qname(
    context: &Context,
    name: &ValueExpr,
    namespace: Option<&ValueExpr>,
    include_default_prefix: bool,
) -> Result<QName, CommandError> {
    let lexical = name
        .evaluate(context)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| CommandError::dynamic_name("names cannot be empty"))?;

    let namespace = match namespace {
        Some(expr) => Some(expr.evaluate(context).ok_or_else(|| {
            CommandError::dynamic_name(format!("namespace of '{}' has no value", lexical))
        })?),
        None => None,
    };

    let (prefix, local) = QName::split_lexical(&lexical);
    if local.is_empty() || local.contains(':') {
        return Err(CommandError::dynamic_name(format!(
            "'{}' is not a valid qualified name",
            lexical
        )));
    }

    if !prefix.is_empty() {
        let bound = context.namespace_uri(prefix).ok_or_else(|| {
            CommandError::dynamic_name(format!("prefix '{}' is not bound", prefix))
        })?;
        if let Some(ns) = &namespace
            && ns != bound
        {
            return Err(CommandError::dynamic_name(format!(
                "prefix '{}' is bound to '{}', not '{}'",
                prefix, bound, ns
            )));
        }
        return Ok(QName::new(bound, local).with_prefix(prefix));
    }

    match namespace.as_deref() {
        Some(ns) if !ns.is_empty() => {
            let prefix = context.prefix_for(ns).ok_or_else(|| {
                CommandError::dynamic_name(format!("no prefix is bound to '{}'", ns))
            })?;
            if prefix.is_empty() && !include_default_prefix {
                return Err(CommandError::dynamic_name(format!(
                    "'{}' is only bound to the default prefix",
                    ns
                )));
            }
            Ok(QName::new(ns, local).with_prefix(prefix))
        }
        Some(_) => Ok(QName::local(local)),
        None if include_default_prefix => {
            let default_ns = context.namespace_uri("").unwrap_or("");
            Ok(QName::new(default_ns, local))
        }
        None => Ok(QName::local(local)),
    }
}
