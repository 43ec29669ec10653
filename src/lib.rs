//! XChain: named command chains executed against a scoped context.
//!
//! Catalogs of commands are loaded by system-id through pluggable URL
//! translation strategies, cached, and run with [`Engine::execute`].
//! Template commands write their output to the context's content handler;
//! [`XmlWriter`] serialises it as XML.
//!
//! ```no_run
//! use xchain::{Context, EngineBuilder, XmlWriter};
//!
//! let engine = EngineBuilder::new().with_config_file("xchain.json")?.build()?;
//! let mut context = Context::new();
//! context.set_content_handler(Box::new(XmlWriter::new(std::io::stdout())));
//! engine.execute("resource://context-class-loader/catalog.json", "main", &mut context)?;
//! # Ok::<(), xchain::EngineError>(())
//! ```

pub mod engine;
pub mod error;
pub mod output;

pub use engine::builder::EngineBuilder;
pub use engine::config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use output::XmlWriter;

pub use xchain_catalog::{
    Catalog, CatalogBuilder, CatalogError, CompiledTemplates, CopyTemplatesCompiler,
    JsonCatalogBuilder, TemplatesCompiler,
};
pub use xchain_chain::{Command, CommandError, Filter, Outcome, SharedCommand, execute_command};
pub use xchain_context::{Context, Scope};
pub use xchain_resource::{UrlTranslationRegistry, UrlTranslationStrategy};
pub use xchain_types::{ContentHandler, QName, SaxError};
