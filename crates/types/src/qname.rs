//! Qualified names.
//!
//! A `QName` pairs a namespace URI with a local name. The prefix is carried
//! along for output but does not take part in equality or hashing, so
//! `h:div` and `xhtml:div` bound to the same URI are the same name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QName {
    namespace: Arc<str>,
    local: Arc<str>,
    #[serde(default)]
    prefix: Option<Arc<str>>,
}

impl QName {
    /// A name in the given namespace with no prefix.
    pub fn new(namespace: impl Into<Arc<str>>, local: impl Into<Arc<str>>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
            prefix: None,
        }
    }

    /// A name in no namespace.
    pub fn local(local: impl Into<Arc<str>>) -> Self {
        Self::new("", local)
    }

    pub fn with_prefix(mut self, prefix: impl Into<Arc<str>>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The `prefix:local` form used on output.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.to_string(),
        }
    }

    /// Splits a lexical `prefix:local` name. Names without a colon have an
    /// empty prefix.
    pub fn split_lexical(name: &str) -> (&str, &str) {
        match name.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            None => ("", name),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local == other.local
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local.hash(state);
    }
}

impl From<&str> for QName {
    fn from(local: &str) -> Self {
        QName::local(local)
    }
}

impl fmt::Display for QName {
    /// Clark notation: `{uri}local`, or just `local` outside a namespace.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}
