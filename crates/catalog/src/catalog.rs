use crate::cache::CachingLoadStrategy;
use crate::error::CatalogError;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};
use std::sync::Arc;
use xchain_context::Context;
use xchain_traits::{ResourceProvider, SharedCommand};

/// Named command graphs loaded from one system-id.
///
/// A catalog is immutable once it has been built and published to the cache.
pub struct Catalog {
    system_id: String,
    commands: HashMap<String, SharedCommand>,
    namespaces: BTreeMap<String, String>,
}

impl Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.commands.keys().collect();
        names.sort();
        f.debug_struct("Catalog")
            .field("system_id", &self.system_id)
            .field("commands", &names)
            .field("namespaces", &self.namespaces)
            .finish()
    }
}

impl Catalog {
    pub fn new(system_id: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            commands: HashMap::new(),
            namespaces: BTreeMap::new(),
        }
    }

    pub fn with_command(mut self, name: impl Into<String>, command: SharedCommand) -> Self {
        self.commands.insert(name.into(), command);
        self
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    pub fn command(&self, name: &str) -> Result<SharedCommand, CatalogError> {
        self.commands
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownCommand {
                system_id: self.system_id.clone(),
                name: name.to_string(),
            })
    }

    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn namespaces(&self) -> &BTreeMap<String, String> {
        &self.namespaces
    }

    /// Makes the catalog's prefixes available to dynamic names.
    pub fn bind_namespaces(&self, context: &mut Context) {
        for (prefix, uri) in &self.namespaces {
            context.bind_namespace(prefix.clone(), uri.clone());
        }
    }
}

/// Turns the bytes behind a system-id into a catalog.
pub trait CatalogBuilder: Send + Sync + Debug {
    fn build(&self, system_id: &str, source: &[u8]) -> Result<Catalog, CatalogError>;
}

/// Loads catalogs by system-id, building each one at most once.
#[derive(Debug)]
pub struct CatalogFactory {
    provider: Arc<dyn ResourceProvider>,
    builder: Arc<dyn CatalogBuilder>,
    cache: CachingLoadStrategy<Catalog>,
}

impl CatalogFactory {
    pub fn new(
        provider: Arc<dyn ResourceProvider>,
        builder: Arc<dyn CatalogBuilder>,
        capacity: usize,
    ) -> Self {
        Self {
            provider,
            builder,
            cache: CachingLoadStrategy::new(capacity),
        }
    }

    pub fn catalog(&self, system_id: &str) -> Result<Arc<Catalog>, CatalogError> {
        self.cache.get_or_build(system_id, |id| -> Result<Catalog, CatalogError> {
            let source = self.provider.load(id)?;
            let catalog = self.builder.build(id, &source)?;
            log::info!(
                "Loaded catalog '{}' with {} command(s) via {}",
                id,
                catalog.commands.len(),
                self.provider.name()
            );
            Ok(catalog)
        })
    }

    pub fn cache(&self) -> &CachingLoadStrategy<Catalog> {
        &self.cache
    }
}
