use crate::exists::{FileUrlExists, UrlExistsStrategy};
use crate::strategy::{CompositeUrlTranslationStrategy, UrlTranslationStrategy};
use std::path::Path;
use std::sync::Arc;
use url::Url;
use xchain_traits::ResourceError;

/// Re-roots the path, query and fragment of a URL onto a base URL.
///
/// The rewritten URL is only returned when the existence check accepts it,
/// and never when it would escape the base (`../` segments).
#[derive(Debug, Clone)]
pub struct BaseUrlTranslationStrategy {
    base: Url,
    exists: Arc<dyn UrlExistsStrategy>,
}

impl BaseUrlTranslationStrategy {
    pub fn new(mut base: Url, exists: Arc<dyn UrlExistsStrategy>) -> Self {
        // Joining only treats the base as a directory with a trailing slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base, exists }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn rewrite(&self, url: &Url) -> Option<Url> {
        let relative = url.path().trim_start_matches('/');
        let mut candidate = self.base.join(relative).ok()?;
        if !candidate.as_str().starts_with(self.base.as_str()) {
            log::warn!("Refusing to translate '{}' outside of '{}'", url, self.base);
            return None;
        }
        candidate.set_query(url.query());
        candidate.set_fragment(url.fragment());
        Some(candidate)
    }
}

impl UrlTranslationStrategy for BaseUrlTranslationStrategy {
    fn translate(&self, url: &Url) -> Option<Url> {
        self.rewrite(url)
            .filter(|candidate| self.exists.exists(candidate))
    }

    fn name(&self) -> &'static str {
        "BaseUrlTranslationStrategy"
    }
}

/// Looks a path up in each directory in turn, like a class path.
pub fn search_path<P: AsRef<Path>>(
    roots: &[P],
) -> Result<CompositeUrlTranslationStrategy, ResourceError> {
    let mut composite = CompositeUrlTranslationStrategy::default();
    for root in roots {
        let root = std::path::absolute(root.as_ref())?;
        let base = Url::from_directory_path(&root).map_err(|()| ResourceError::InvalidUrl {
            url: root.display().to_string(),
            message: "not an absolute directory path".to_string(),
        })?;
        composite.push(Arc::new(BaseUrlTranslationStrategy::new(
            base,
            Arc::new(FileUrlExists),
        )));
    }
    Ok(composite)
}
