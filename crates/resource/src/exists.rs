use crate::connection::{RESOURCE_SCHEME, resolve};
use crate::jar::{JAR_SCHEME, jar_entry_exists};
use crate::registry::UrlTranslationRegistry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use url::Url;

/// Confirms that a candidate URL really points at something.
pub trait UrlExistsStrategy: Send + Sync + Debug {
    fn exists(&self, url: &Url) -> bool;
}

/// `file:` URLs exist when the path does.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileUrlExists;

impl UrlExistsStrategy for FileUrlExists {
    fn exists(&self, url: &Url) -> bool {
        url.scheme() == "file"
            && url
                .to_file_path()
                .map(|path| path.exists())
                .unwrap_or(false)
    }
}

/// `jar:<archive-url>!/<entry>` URLs exist when the archive has the entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct JarEntryExists;

impl UrlExistsStrategy for JarEntryExists {
    fn exists(&self, url: &Url) -> bool {
        url.scheme() == JAR_SCHEME && jar_entry_exists(url)
    }
}

/// `resource:` URLs exist when they translate through the registry to a URL
/// the inner strategy accepts.
#[derive(Debug, Clone)]
pub struct ResourceUrlExists {
    registry: Arc<UrlTranslationRegistry>,
    inner: Arc<dyn UrlExistsStrategy>,
}

impl ResourceUrlExists {
    pub fn new(registry: Arc<UrlTranslationRegistry>, inner: Arc<dyn UrlExistsStrategy>) -> Self {
        Self { registry, inner }
    }
}

impl UrlExistsStrategy for ResourceUrlExists {
    fn exists(&self, url: &Url) -> bool {
        resolve(&self.registry, url)
            .map(|resolved| self.inner.exists(&resolved))
            .unwrap_or(false)
    }
}

/// Dispatches on the URL scheme. Unknown schemes do not exist.
#[derive(Debug, Default, Clone)]
pub struct CompositeUrlExists {
    by_scheme: HashMap<String, Arc<dyn UrlExistsStrategy>>,
}

impl CompositeUrlExists {
    pub fn new() -> Self {
        Self::default()
    }

    /// `file:` and `jar:` URLs.
    pub fn concrete() -> Self {
        Self::new()
            .with_scheme("file", Arc::new(FileUrlExists))
            .with_scheme(JAR_SCHEME, Arc::new(JarEntryExists))
    }

    /// `file:`, `jar:` and `resource:` URLs, the last resolved through `registry`.
    pub fn standard(registry: Arc<UrlTranslationRegistry>) -> Self {
        Self::concrete().with_scheme(
            RESOURCE_SCHEME,
            Arc::new(ResourceUrlExists::new(registry, Arc::new(Self::concrete()))),
        )
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>, strategy: Arc<dyn UrlExistsStrategy>) -> Self {
        self.by_scheme.insert(scheme.into(), strategy);
        self
    }
}

impl UrlExistsStrategy for CompositeUrlExists {
    fn exists(&self, url: &Url) -> bool {
        self.by_scheme
            .get(url.scheme())
            .is_some_and(|strategy| strategy.exists(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_url::BaseUrlTranslationStrategy;
    use crate::jar::tests::write_archive;
    use crate::strategy::CachedUrlTranslationStrategy;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_exists() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let present = Url::from_file_path(dir.path().join("a.txt")).unwrap();
        let absent = Url::from_file_path(dir.path().join("b.txt")).unwrap();
        assert!(FileUrlExists.exists(&present));
        assert!(!FileUrlExists.exists(&absent));
        assert!(!FileUrlExists.exists(&Url::parse("http://example.com/a.txt").unwrap()));
    }

    #[test]
    fn test_resource_exists_follows_registry() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let registry = Arc::new(UrlTranslationRegistry::new());
        let base = Url::from_directory_path(dir.path()).unwrap();
        registry.register(
            "files",
            Arc::new(BaseUrlTranslationStrategy::new(base, Arc::new(FileUrlExists))),
        );

        let exists = ResourceUrlExists::new(registry, Arc::new(FileUrlExists));
        assert!(exists.exists(&Url::parse("resource://files/a.txt").unwrap()));
        assert!(!exists.exists(&Url::parse("resource://files/b.txt").unwrap()));
        assert!(!exists.exists(&Url::parse("resource://unknown/a.txt").unwrap()));
    }

    #[test]
    fn test_composite_dispatches_on_scheme() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let composite = CompositeUrlExists::new().with_scheme("file", Arc::new(FileUrlExists));
        let file = Url::from_file_path(dir.path().join("a.txt")).unwrap();
        assert!(composite.exists(&file));
        assert!(!composite.exists(&Url::parse("jar:file:/lib.jar!/a.txt").unwrap()));
    }

    #[test]
    fn test_standard_checks_jar_entries_behind_resource_urls() {
        let dir = tempdir().unwrap();
        let archive = write_archive(&dir.path().join("lib.jar"), &[("pages/a.tpl", b"<a/>".as_slice())]);
        let entry = format!("jar:{}!/pages/a.tpl", archive);

        let registry = Arc::new(UrlTranslationRegistry::new());
        let mut table = CachedUrlTranslationStrategy::new(HashMap::new());
        table.insert("resource://lib/a.tpl", entry.clone());
        table.insert("resource://lib/b.tpl", format!("jar:{}!/pages/b.tpl", archive));
        registry.register("lib", Arc::new(table));

        let exists = CompositeUrlExists::standard(registry);
        assert!(exists.exists(&Url::parse(&entry).unwrap()));
        assert!(exists.exists(&Url::parse("resource://lib/a.tpl").unwrap()));
        assert!(!exists.exists(&Url::parse("resource://lib/b.tpl").unwrap()));
        assert!(!exists.exists(&Url::parse("http://example.com/a.tpl").unwrap()));
    }
}
