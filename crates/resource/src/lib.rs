//! Resource resolution for XChain.
//!
//! Catalogs and templates are named by system-ids, which are often abstract
//! `resource://<strategy>/<path>` URLs. The authority names a translation
//! strategy in a [`UrlTranslationRegistry`]; the strategy maps the URL onto a
//! concrete one that can actually be read.
//!
//! ## Available Strategies
//!
//! - [`CompositeUrlTranslationStrategy`]: first strategy that resolves wins
//! - [`CachedUrlTranslationStrategy`]: fixed table of already-resolved URLs
//! - [`BaseUrlTranslationStrategy`]: re-roots a path onto a base URL if the
//!   result exists
//! - [`search_path`]: base-URL strategies over a list of directories

mod base_url;
mod connection;
mod exists;
mod jar;
mod loader;
mod registry;
mod strategy;

pub use base_url::{BaseUrlTranslationStrategy, search_path};
pub use connection::{RESOURCE_SCHEME, ResourceConnection, read_url, resolve};
pub use exists::{
    CompositeUrlExists, FileUrlExists, JarEntryExists, ResourceUrlExists, UrlExistsStrategy,
};
pub use jar::JAR_SCHEME;
pub use loader::ResourceLoader;
pub use registry::{
    CONTEXT_CLASS_LOADER, SERVLET_CONTEXT, SYSTEM_CLASS_LOADER, UrlTranslationRegistry,
};
pub use strategy::{
    CachedUrlTranslationStrategy, CompositeUrlTranslationStrategy, UrlTranslationStrategy,
};

pub use url::Url;
pub use xchain_traits::{ResourceError, ResourceProvider, SharedResourceData};
