use thiserror::Error;
use xchain_catalog::CatalogError;
use xchain_chain::CommandError;
use xchain_resource::ResourceError;
use xchain_types::SaxError;

/// Errors surfaced by the engine and the command line.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Command failed: {0}")]
    Command(#[from] CommandError),

    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Output error: {0}")]
    Output(#[from] SaxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
