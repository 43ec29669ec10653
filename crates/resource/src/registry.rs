use crate::strategy::UrlTranslationStrategy;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Strategy backed by the process-wide search path.
pub const SYSTEM_CLASS_LOADER: &str = "system-class-loader";
/// Strategy backed by the application's own search path.
pub const CONTEXT_CLASS_LOADER: &str = "context-class-loader";
/// Strategy installed while a hosting web application is running.
pub const SERVLET_CONTEXT: &str = "servlet-context";

type StrategyMap = HashMap<String, Arc<dyn UrlTranslationStrategy>>;

/// Translation strategies keyed by the authority of `resource:` URLs.
///
/// Entries are installed and removed at lifecycle start and stop and are
/// otherwise only read while requests are served. Every map update is a
/// single insert or remove, so a lock poisoned by a panicking caller still
/// guards a consistent map and is used as is.
#[derive(Debug, Default)]
pub struct UrlTranslationRegistry {
    strategies: RwLock<StrategyMap>,
}

impl UrlTranslationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StrategyMap> {
        self.strategies.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StrategyMap> {
        self.strategies.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs a strategy unless the authority is already taken. Returns
    /// whether it was installed.
    pub fn register(
        &self,
        authority: impl Into<String>,
        strategy: Arc<dyn UrlTranslationStrategy>,
    ) -> bool {
        let mut strategies = self.write();
        let authority = authority.into();
        if strategies.contains_key(&authority) {
            log::debug!("Strategy for '{}' already registered", authority);
            return false;
        }
        log::info!("Registered {} for '{}'", strategy.name(), authority);
        strategies.insert(authority, strategy);
        true
    }

    /// Installs a strategy, returning the one it replaced.
    pub fn replace(
        &self,
        authority: impl Into<String>,
        strategy: Arc<dyn UrlTranslationStrategy>,
    ) -> Option<Arc<dyn UrlTranslationStrategy>> {
        let authority = authority.into();
        log::info!("Installing {} for '{}'", strategy.name(), authority);
        self.write().insert(authority, strategy)
    }

    pub fn unregister(&self, authority: &str) -> Option<Arc<dyn UrlTranslationStrategy>> {
        let removed = self.write().remove(authority);
        if removed.is_some() {
            log::info!("Removed strategy for '{}'", authority);
        }
        removed
    }

    pub fn get(&self, authority: &str) -> Option<Arc<dyn UrlTranslationStrategy>> {
        self.read().get(authority).cloned()
    }

    pub fn authorities(&self) -> Vec<String> {
        let mut authorities: Vec<String> = self.read().keys().cloned().collect();
        authorities.sort();
        authorities
    }
}
