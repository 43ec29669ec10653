//! ResourceProvider trait for loading catalog and template sources by
//! system-id.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to load resource '{system_id}': {message}")]
    LoadFailed { system_id: String, message: String },

    #[error("Invalid resource URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResourceError {
    fn from(err: std::io::Error) -> Self {
        ResourceError::Io(err.to_string())
    }
}

pub type SharedResourceData = Arc<Vec<u8>>;

/// Loads the bytes behind a system-id.
pub trait ResourceProvider: Send + Sync + Debug {
    fn load(&self, system_id: &str) -> Result<SharedResourceData, ResourceError>;

    fn exists(&self, system_id: &str) -> bool;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Serves pre-registered sources from memory.
#[derive(Debug, Default)]
pub struct InMemoryResourceProvider {
    sources: RwLock<HashMap<String, SharedResourceData>>,
}

impl InMemoryResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `data` under `system_id`, replacing any earlier source.
    pub fn insert(
        &self,
        system_id: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Result<(), ResourceError> {
        let system_id = system_id.into();
        let mut sources = self.sources.write().map_err(|_| ResourceError::LoadFailed {
            system_id: system_id.clone(),
            message: "source table lock poisoned".to_string(),
        })?;
        sources.insert(system_id, Arc::new(data.into()));
        Ok(())
    }

    pub fn remove(&self, system_id: &str) -> Option<SharedResourceData> {
        self.sources.write().ok()?.remove(system_id)
    }

    pub fn len(&self) -> usize {
        self.sources.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceProvider for InMemoryResourceProvider {
    fn load(&self, system_id: &str) -> Result<SharedResourceData, ResourceError> {
        let sources = self.sources.read().map_err(|_| ResourceError::LoadFailed {
            system_id: system_id.to_string(),
            message: "source table lock poisoned".to_string(),
        })?;
        sources
            .get(system_id)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(system_id.to_string()))
    }

    fn exists(&self, system_id: &str) -> bool {
        self.sources
            .read()
            .map(|s| s.contains_key(system_id))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryResourceProvider"
    }
}
