//! The engine: catalogs and templates by system-id, and command execution.

pub mod builder;
pub mod config;

use crate::error::EngineError;
use std::sync::Arc;
use xchain_catalog::{Catalog, CatalogFactory, CompiledTemplates, TemplatesFactory};
use xchain_chain::{CommandError, Outcome, execute_command};
use xchain_context::{Context, Scope};
use xchain_resource::{UrlTranslationRegistry, UrlTranslationStrategy};

/// Loads catalogs and runs their commands. Cheap to share between threads;
/// each request brings its own `Context`.
#[derive(Debug)]
pub struct Engine {
    registry: Arc<UrlTranslationRegistry>,
    catalogs: CatalogFactory,
    templates: TemplatesFactory,
}

impl Engine {
    pub(crate) fn new(
        registry: Arc<UrlTranslationRegistry>,
        catalogs: CatalogFactory,
        templates: TemplatesFactory,
    ) -> Self {
        Self {
            registry,
            catalogs,
            templates,
        }
    }

    pub fn catalog(&self, system_id: &str) -> Result<Arc<Catalog>, EngineError> {
        Ok(self.catalogs.catalog(system_id)?)
    }

    pub fn templates(&self, system_id: &str) -> Result<Arc<CompiledTemplates>, EngineError> {
        Ok(self.templates.templates(system_id)?)
    }

    /// Runs the named command of a catalog, with the catalog's namespaces
    /// bound in the context. The run gets an execution scope of its own
    /// unless the caller already opened one.
    pub fn execute(
        &self,
        system_id: &str,
        name: &str,
        context: &mut Context,
    ) -> Result<Outcome, EngineError> {
        let catalog = self.catalog(system_id)?;
        let command = catalog.command(name)?;
        catalog.bind_namespaces(context);
        log::debug!("Executing '{}' from '{}'", name, system_id);

        let opens_scope = !context.is_open(Scope::Execution);
        if opens_scope {
            context.start_scope(Scope::Execution);
        }
        let result = execute_command(command.as_ref(), context);
        let ended = if opens_scope {
            context.end_scope(Scope::Execution)
        } else {
            Ok(())
        };

        if let Some(output_error) = context.take_output_error() {
            return Err(output_error.into());
        }
        let outcome = result?;
        ended.map_err(CommandError::from)?;
        Ok(outcome)
    }

    /// Installs a strategy, replacing any other for the same authority.
    pub fn install_strategy(
        &self,
        authority: impl Into<String>,
        strategy: Arc<dyn UrlTranslationStrategy>,
    ) -> Option<Arc<dyn UrlTranslationStrategy>> {
        self.registry.replace(authority, strategy)
    }

    pub fn remove_strategy(&self, authority: &str) -> Option<Arc<dyn UrlTranslationStrategy>> {
        self.registry.unregister(authority)
    }

    pub fn registry(&self) -> &Arc<UrlTranslationRegistry> {
        &self.registry
    }

    pub fn catalog_factory(&self) -> &CatalogFactory {
        &self.catalogs
    }

    pub fn templates_factory(&self) -> &TemplatesFactory {
        &self.templates
    }
}
