use thiserror::Error;
use xchain_traits::ResourceError;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Failed to build '{system_id}': {message}")]
    Build { system_id: String, message: String },

    #[error("Catalog '{system_id}' has no command named '{name}'")]
    UnknownCommand { system_id: String, name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to persist '{path}': {message}")]
    Persist { path: String, message: String },
}

impl CatalogError {
    pub fn build(system_id: &str, message: impl Into<String>) -> Self {
        CatalogError::Build {
            system_id: system_id.to_string(),
            message: message.into(),
        }
    }
}
