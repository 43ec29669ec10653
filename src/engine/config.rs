use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Engine settings, usually read from a JSON file.
///
/// ```json
/// { "catalog_cache_capacity": 16,
///   "search_path": ["catalogs", "/usr/share/xchain"],
///   "cached_translations": {
///     "resource://context-class-loader/old.json": "file:///srv/new.json" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub catalog_cache_capacity: usize,
    pub templates_cache_capacity: usize,
    /// Directories searched, in order, for `resource://context-class-loader/` URLs.
    pub search_path: Vec<PathBuf>,
    /// Exact URL to replacement URL, consulted before the search path.
    pub cached_translations: BTreeMap<String, String>,
    /// Where compiled templates are persisted. In memory only when unset.
    pub templates_output_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_cache_capacity: DEFAULT_CACHE_CAPACITY,
            templates_cache_capacity: DEFAULT_CACHE_CAPACITY,
            search_path: Vec::new(),
            cached_translations: BTreeMap::new(),
            templates_output_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(source: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Relative search path entries are taken relative to the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("Failed to read config from '{}': {}", path.display(), e))
        })?;
        let mut config = Self::from_json(&source)?;
        if let Some(dir) = path.parent() {
            for entry in &mut config.search_path {
                if entry.is_relative() {
                    *entry = dir.join(&*entry);
                }
            }
        }
        Ok(config)
    }
}
