//! Catalogs described as JSON.
//!
//! ```json
//! { "namespaces": { "h": "http://www.w3.org/1999/xhtml" },
//!   "commands": {
//!     "main": { "type": "chain", "commands": [
//!       { "type": "variable", "name": "title", "value": "Hello" },
//!       { "type": "template", "body": [
//!         { "type": "element", "name": "h:p", "body": [
//!           { "type": "text", "value": "$title" } ] } ] } ] } } }
//! ```
//!
//! String values starting with `$` refer to a context variable; `$$` escapes
//! a literal dollar sign.

use crate::catalog::{Catalog, CatalogBuilder};
use crate::error::CatalogError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use xchain_chain::{
    AssignCommand, Chain, ElementTemplate, FailCommand, FilterList, NameSpec, ScopedCommand,
    StopCommand, TemplateCommand, TemplateNode, ValueExpr, VariableCommand,
};
use xchain_context::Scope;
use xchain_traits::SharedCommand;
use xchain_types::QName;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDef {
    #[serde(default)]
    namespaces: BTreeMap<String, String>,
    commands: BTreeMap<String, CommandDef>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ScopeDef {
    #[default]
    Request,
    Execution,
    Chain,
}

impl From<ScopeDef> for Scope {
    fn from(scope: ScopeDef) -> Self {
        match scope {
            ScopeDef::Request => Scope::Request,
            ScopeDef::Execution => Scope::Execution,
            ScopeDef::Chain => Scope::Chain,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum CommandDef {
    Chain {
        commands: Vec<CommandDef>,
        /// Run the chain inside a scope of its own.
        #[serde(default)]
        scope: Option<ScopeDef>,
    },
    FilterList {
        commands: Vec<CommandDef>,
    },
    Variable {
        name: String,
        value: serde_json::Value,
        #[serde(default)]
        scope: ScopeDef,
    },
    Assign {
        name: String,
        value: serde_json::Value,
    },
    Stop,
    Fail {
        message: String,
    },
    Template {
        body: Vec<NodeDef>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum NodeDef {
    Text {
        value: String,
    },
    Element {
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "name-var")]
        name_var: Option<String>,
        #[serde(default)]
        namespace: Option<String>,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        body: Vec<NodeDef>,
    },
    Command {
        command: CommandDef,
    },
}

/// Builds catalogs from the JSON format above.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCatalogBuilder;

impl JsonCatalogBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl CatalogBuilder for JsonCatalogBuilder {
    fn build(&self, system_id: &str, source: &[u8]) -> Result<Catalog, CatalogError> {
        let def: CatalogDef = serde_json::from_slice(source)
            .map_err(|e| CatalogError::build(system_id, e.to_string()))?;

        let binder = Binder {
            system_id,
            namespaces: &def.namespaces,
        };
        let mut catalog = Catalog::new(system_id);
        for (prefix, uri) in &def.namespaces {
            catalog = catalog.with_namespace(prefix.clone(), uri.clone());
        }
        for (name, command) in &def.commands {
            catalog = catalog.with_command(name.clone(), binder.command(command)?);
        }
        Ok(catalog)
    }
}

/// Turns parsed definitions into commands, resolving static prefixes against
/// the catalog's namespace declarations.
struct Binder<'a> {
    system_id: &'a str,
    namespaces: &'a BTreeMap<String, String>,
}

impl Binder<'_> {
    fn command(&self, def: &CommandDef) -> Result<SharedCommand, CatalogError> {
        let command: SharedCommand = match def {
            CommandDef::Chain { commands, scope } => {
                let chain: SharedCommand = Arc::new(Chain::with_commands(self.commands(commands)?));
                match scope {
                    Some(scope) => Arc::new(ScopedCommand::new((*scope).into(), chain)),
                    None => chain,
                }
            }
            CommandDef::FilterList { commands } => {
                Arc::new(FilterList::with_commands(self.commands(commands)?))
            }
            CommandDef::Variable { name, value, scope } => Arc::new(VariableCommand::new(
                self.qname(name, false)?,
                value.clone(),
                (*scope).into(),
            )),
            CommandDef::Assign { name, value } => {
                Arc::new(AssignCommand::new(self.qname(name, false)?, value.clone()))
            }
            CommandDef::Stop => Arc::new(StopCommand),
            CommandDef::Fail { message } => Arc::new(FailCommand::new(message.clone())),
            CommandDef::Template { body } => Arc::new(TemplateCommand::new(self.nodes(body)?)),
        };
        Ok(command)
    }

    fn commands(&self, defs: &[CommandDef]) -> Result<Vec<SharedCommand>, CatalogError> {
        defs.iter().map(|def| self.command(def)).collect()
    }

    fn nodes(&self, defs: &[NodeDef]) -> Result<Vec<TemplateNode>, CatalogError> {
        defs.iter().map(|def| self.node(def)).collect()
    }

    fn node(&self, def: &NodeDef) -> Result<TemplateNode, CatalogError> {
        match def {
            NodeDef::Text { value } => Ok(TemplateNode::Text(self.value(value))),
            NodeDef::Command { command } => Ok(TemplateNode::Command(self.command(command)?)),
            NodeDef::Element {
                name,
                name_var,
                namespace,
                attributes,
                body,
            } => {
                let name = match (name, name_var) {
                    (Some(name), None) => match namespace {
                        Some(ns) if !name.contains(':') => {
                            NameSpec::Static(QName::new(ns.as_str(), name.as_str()))
                        }
                        _ => NameSpec::Static(self.qname(name, true)?),
                    },
                    (None, Some(var)) => NameSpec::Dynamic {
                        name: ValueExpr::variable(self.qname(var.trim_start_matches('$'), false)?),
                        namespace: namespace.as_deref().map(|ns| self.value(ns)),
                    },
                    _ => {
                        return Err(CatalogError::build(
                            self.system_id,
                            "an element needs exactly one of 'name' and 'name-var'",
                        ));
                    }
                };

                let mut element = ElementTemplate::new(name);
                for (attr, value) in attributes {
                    element = element.attribute(self.qname(attr, false)?, self.value(value));
                }
                for child in self.nodes(body)? {
                    element = element.child(child);
                }
                Ok(TemplateNode::Element(element))
            }
        }
    }

    fn value(&self, raw: &str) -> ValueExpr {
        if let Some(literal) = raw.strip_prefix("$$") {
            ValueExpr::literal(format!("${}", literal))
        } else if let Some(var) = raw.strip_prefix('$') {
            ValueExpr::variable(var)
        } else {
            ValueExpr::literal(raw)
        }
    }

    /// Unprefixed element names take the default namespace, if declared.
    /// Unprefixed attribute and variable names take no namespace.
    fn qname(&self, lexical: &str, use_default: bool) -> Result<QName, CatalogError> {
        let (prefix, local) = QName::split_lexical(lexical);
        if local.is_empty() || local.contains(':') {
            return Err(CatalogError::build(
                self.system_id,
                format!("'{}' is not a valid qualified name", lexical),
            ));
        }
        if prefix.is_empty() {
            let namespace = if use_default {
                self.namespaces.get("").map(String::as_str).unwrap_or("")
            } else {
                ""
            };
            return Ok(QName::new(namespace, local));
        }
        let uri = self.namespaces.get(prefix).ok_or_else(|| {
            CatalogError::build(self.system_id, format!("prefix '{}' is not declared", prefix))
        })?;
        Ok(QName::new(uri.as_str(), local).with_prefix(prefix))
    }
}
