use crate::connection::{ResourceConnection, resolve};
use crate::exists::{CompositeUrlExists, UrlExistsStrategy};
use crate::registry::UrlTranslationRegistry;
use std::path::Path;
use std::sync::Arc;
use url::Url;
use xchain_traits::{ResourceError, ResourceProvider, SharedResourceData};

/// Loads system-ids through the translation registry.
///
/// System-ids are URLs (`resource:`, `file:`, `jar:`) or plain file paths, which are
/// made absolute against the working directory.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    registry: Arc<UrlTranslationRegistry>,
}

impl ResourceLoader {
    pub fn new(registry: Arc<UrlTranslationRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<UrlTranslationRegistry> {
        &self.registry
    }

    pub fn parse_system_id(system_id: &str) -> Result<Url, ResourceError> {
        match Url::parse(system_id) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let path = std::path::absolute(Path::new(system_id))?;
                Url::from_file_path(&path).map_err(|()| ResourceError::InvalidUrl {
                    url: system_id.to_string(),
                    message: "not a usable file path".to_string(),
                })
            }
            Err(e) => Err(ResourceError::InvalidUrl {
                url: system_id.to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn open(&self, system_id: &str) -> Result<ResourceConnection, ResourceError> {
        let url = Self::parse_system_id(system_id)?;
        Ok(ResourceConnection::open(url, self.registry.clone()))
    }
}

impl ResourceProvider for ResourceLoader {
    fn load(&self, system_id: &str) -> Result<SharedResourceData, ResourceError> {
        self.open(system_id)?.read()
    }

    fn exists(&self, system_id: &str) -> bool {
        Self::parse_system_id(system_id)
            .and_then(|url| resolve(&self.registry, &url))
            .map(|url| CompositeUrlExists::concrete().exists(&url))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "ResourceLoader"
    }
}
