use crate::jar::{JAR_SCHEME, read_jar_entry};
use crate::registry::UrlTranslationRegistry;
use std::sync::Arc;
use url::Url;
use xchain_traits::{ResourceError, SharedResourceData};

pub const RESOURCE_SCHEME: &str = "resource";

/// Translations that lead to further `resource:` URLs are followed at most
/// this many times.
const MAX_NESTING: usize = 16;

/// Follows `resource:` URLs through the registry until a concrete URL is
/// reached. Any other URL resolves to itself.
pub fn resolve(registry: &UrlTranslationRegistry, url: &Url) -> Result<Url, ResourceError> {
    let mut current = url.clone();
    for _ in 0..MAX_NESTING {
        if current.scheme() != RESOURCE_SCHEME {
            return Ok(current);
        }
        let authority = current
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ResourceError::InvalidUrl {
                url: current.to_string(),
                message: "resource URLs need a strategy authority".to_string(),
            })?;
        let strategy = registry
            .get(authority)
            .ok_or_else(|| ResourceError::NotFound(url.to_string()))?;
        current = strategy
            .translate(&current)
            .ok_or_else(|| ResourceError::NotFound(url.to_string()))?;
    }
    Err(ResourceError::LoadFailed {
        system_id: url.to_string(),
        message: format!("more than {} nested translations", MAX_NESTING),
    })
}

/// Reads the bytes behind a concrete URL.
pub fn read_url(url: &Url) -> Result<SharedResourceData, ResourceError> {
    if url.scheme() == JAR_SCHEME {
        return read_jar_entry(url);
    }
    if url.scheme() != "file" {
        return Err(ResourceError::LoadFailed {
            system_id: url.to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    let path = url.to_file_path().map_err(|()| ResourceError::InvalidUrl {
        url: url.to_string(),
        message: "not a local file path".to_string(),
    })?;
    std::fs::read(&path).map(Arc::new).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ResourceError::NotFound(url.to_string())
        } else {
            ResourceError::LoadFailed {
                system_id: url.to_string(),
                message: e.to_string(),
            }
        }
    })
}

/// A connection to a URL whose resolution is deferred until `connect`.
///
/// Opening a connection never fails. An unknown strategy or a failed
/// translation surfaces as `ResourceError::NotFound` from `connect` (and so
/// from `read`), not before.
#[derive(Debug)]
pub struct ResourceConnection {
    url: Url,
    registry: Arc<UrlTranslationRegistry>,
    resolved: Option<Url>,
}

impl ResourceConnection {
    pub fn open(url: Url, registry: Arc<UrlTranslationRegistry>) -> Self {
        Self {
            url,
            registry,
            resolved: None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The concrete URL, once connected.
    pub fn resolved_url(&self) -> Option<&Url> {
        self.resolved.as_ref()
    }

    pub fn connect(&mut self) -> Result<&Url, ResourceError> {
        if self.resolved.is_none() {
            let resolved = resolve(&self.registry, &self.url)?;
            log::debug!("Resolved '{}' to '{}'", self.url, resolved);
            self.resolved = Some(resolved);
        }
        self.resolved.as_ref().ok_or_else(|| ResourceError::NotFound(self.url.to_string()))
    }

    pub fn read(&mut self) -> Result<SharedResourceData, ResourceError> {
        let url = self.connect()?.clone();
        read_url(&url)
    }
}
