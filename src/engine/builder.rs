use super::Engine;
use super::config::EngineConfig;
use crate::error::EngineError;
use std::path::Path;
use std::sync::Arc;
use xchain_catalog::{
    CatalogBuilder, CatalogFactory, CopyTemplatesCompiler, JsonCatalogBuilder, TemplatesCompiler,
    TemplatesFactory,
};
use xchain_resource::{
    CONTEXT_CLASS_LOADER, CachedUrlTranslationStrategy, CompositeUrlTranslationStrategy,
    ResourceLoader, ResourceProvider, UrlTranslationRegistry, UrlTranslationStrategy, search_path,
};

/// A builder for creating an `Engine`.
pub struct EngineBuilder {
    config: EngineConfig,
    catalog_builder: Arc<dyn CatalogBuilder>,
    templates_compiler: Arc<dyn TemplatesCompiler>,
    strategies: Vec<(String, Arc<dyn UrlTranslationStrategy>)>,
    provider: Option<Arc<dyn ResourceProvider>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            catalog_builder: Arc::new(JsonCatalogBuilder),
            templates_compiler: Arc::new(CopyTemplatesCompiler),
            strategies: Vec::new(),
            provider: None,
        }
    }
}

impl EngineBuilder {
    /// Creates a builder that reads JSON catalogs and copies templates verbatim.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, EngineError> {
        self.config = EngineConfig::from_file(path)?;
        Ok(self)
    }

    pub fn with_catalog_builder(mut self, builder: Arc<dyn CatalogBuilder>) -> Self {
        self.catalog_builder = builder;
        self
    }

    pub fn with_templates_compiler(mut self, compiler: Arc<dyn TemplatesCompiler>) -> Self {
        self.templates_compiler = compiler;
        self
    }

    /// Registers a translation strategy for `resource://<authority>/` URLs.
    /// Strategies added here take precedence over the configured search path.
    pub fn with_strategy(
        mut self,
        authority: impl Into<String>,
        strategy: Arc<dyn UrlTranslationStrategy>,
    ) -> Self {
        self.strategies.push((authority.into(), strategy));
        self
    }

    /// Loads sources through `provider` instead of URL resolution.
    pub fn with_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Consumes the builder, installing the strategies and creating the caches.
    pub fn build(self) -> Result<Engine, EngineError> {
        let context_strategy = self.context_strategy()?;

        let registry = Arc::new(UrlTranslationRegistry::new());
        for (authority, strategy) in self.strategies {
            if !registry.register(authority.clone(), strategy) {
                log::warn!("Ignoring second strategy for '{}'", authority);
            }
        }
        if let Some(strategy) = context_strategy
            && !registry.register(CONTEXT_CLASS_LOADER, strategy)
        {
            log::info!(
                "'{}' is provided explicitly; search path not installed",
                CONTEXT_CLASS_LOADER
            );
        }

        let provider: Arc<dyn ResourceProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(ResourceLoader::new(registry.clone())),
        };

        let catalogs = CatalogFactory::new(
            provider.clone(),
            self.catalog_builder,
            self.config.catalog_cache_capacity,
        );
        let mut templates = TemplatesFactory::new(
            provider,
            self.templates_compiler,
            self.config.templates_cache_capacity,
        );
        if let Some(dir) = &self.config.templates_output_dir {
            templates = templates.with_output_dir(dir);
        }

        log::info!(
            "Engine ready: strategies {:?}, catalog cache {}, templates cache {}",
            registry.authorities(),
            self.config.catalog_cache_capacity,
            self.config.templates_cache_capacity
        );
        Ok(Engine::new(registry, catalogs, templates))
    }

    /// Cached translations first, then each search path directory.
    fn context_strategy(&self) -> Result<Option<Arc<dyn UrlTranslationStrategy>>, EngineError> {
        let config = &self.config;
        if config.search_path.is_empty() && config.cached_translations.is_empty() {
            return Ok(None);
        }

        let mut composite = CompositeUrlTranslationStrategy::default();
        if !config.cached_translations.is_empty() {
            let table = config
                .cached_translations
                .iter()
                .map(|(from, to)| (from.clone(), to.clone()))
                .collect();
            composite.push(Arc::new(CachedUrlTranslationStrategy::new(table)));
        }
        if !config.search_path.is_empty() {
            composite.push(Arc::new(search_path(&config.search_path)?));
        }
        Ok(Some(Arc::new(composite)))
    }
}
