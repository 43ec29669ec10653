use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use url::Url;

/// Maps an abstract URL onto a concrete one. `None` means this strategy
/// cannot resolve the URL and the next one should be tried.
pub trait UrlTranslationStrategy: Send + Sync + Debug {
    fn translate(&self, url: &Url) -> Option<Url>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Tries each strategy in order and returns the first translation.
#[derive(Debug, Default, Clone)]
pub struct CompositeUrlTranslationStrategy {
    strategies: Vec<Arc<dyn UrlTranslationStrategy>>,
}

impl CompositeUrlTranslationStrategy {
    pub fn new(strategies: Vec<Arc<dyn UrlTranslationStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn push(&mut self, strategy: Arc<dyn UrlTranslationStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl UrlTranslationStrategy for CompositeUrlTranslationStrategy {
    fn translate(&self, url: &Url) -> Option<Url> {
        for (position, strategy) in self.strategies.iter().enumerate() {
            if let Some(translated) = strategy.translate(url) {
                log::debug!(
                    "Translated '{}' to '{}' with strategy {} ({})",
                    url,
                    translated,
                    position,
                    strategy.name()
                );
                return Some(translated);
            }
        }
        None
    }

    fn name(&self) -> &'static str {
        "CompositeUrlTranslationStrategy"
    }
}

/// Pins URLs that have already been resolved: exact external form in,
/// replacement URL out.
#[derive(Debug, Default, Clone)]
pub struct CachedUrlTranslationStrategy {
    table: HashMap<String, String>,
}

impl CachedUrlTranslationStrategy {
    pub fn new(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.table.insert(from.into(), to.into());
    }
}

impl UrlTranslationStrategy for CachedUrlTranslationStrategy {
    fn translate(&self, url: &Url) -> Option<Url> {
        let replacement = self.table.get(url.as_str())?;
        match Url::parse(replacement) {
            Ok(translated) => Some(translated),
            Err(e) => {
                log::warn!("Ignoring cached translation '{}': {}", replacement, e);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "CachedUrlTranslationStrategy"
    }
}
