//! Catalogs and compiled templates, loaded once per system-id.
//!
//! ## Key Abstractions
//!
//! - **`CachingLoadStrategy`**: bounded cache that builds each key at most once
//! - **`CatalogFactory`**: system-id to `Catalog` of named commands
//! - **`TemplatesFactory`**: system-id to compiled template artifact
//! - **`JsonCatalogBuilder`**: builds catalogs from a JSON description

mod cache;
mod catalog;
mod error;
mod json;
mod templates;

pub use cache::{CacheStats, CachingLoadStrategy};
pub use catalog::{Catalog, CatalogBuilder, CatalogFactory};
pub use error::CatalogError;
pub use json::JsonCatalogBuilder;
pub use templates::{CompiledTemplates, CopyTemplatesCompiler, TemplatesCompiler, TemplatesFactory};
