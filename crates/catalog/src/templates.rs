use crate::cache::CachingLoadStrategy;
use crate::error::CatalogError;
use std::fmt::Debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tempfile::NamedTempFile;
use xchain_traits::ResourceProvider;

/// A compiled template artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTemplates {
    pub system_id: String,
    pub bytes: Vec<u8>,
    /// Where the artifact was persisted, if an output directory is configured.
    pub path: Option<PathBuf>,
}

/// Compiles template source into an artifact written to `out`.
pub trait TemplatesCompiler: Send + Sync + Debug {
    fn compile(&self, system_id: &str, source: &[u8], out: &mut dyn Write) -> Result<(), CatalogError>;
}

/// Emits the source unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyTemplatesCompiler;

impl TemplatesCompiler for CopyTemplatesCompiler {
    fn compile(&self, _system_id: &str, source: &[u8], out: &mut dyn Write) -> Result<(), CatalogError> {
        out.write_all(source)?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct TemplatesFactory {
    provider: Arc<dyn ResourceProvider>,
    compiler: Arc<dyn TemplatesCompiler>,
    cache: CachingLoadStrategy<CompiledTemplates>,
    output_dir: Option<PathBuf>,
}

impl TemplatesFactory {
    pub fn new(
        provider: Arc<dyn ResourceProvider>,
        compiler: Arc<dyn TemplatesCompiler>,
        capacity: usize,
    ) -> Self {
        Self {
            provider,
            compiler,
            cache: CachingLoadStrategy::new(capacity),
            output_dir: None,
        }
    }

    /// Persist compiled artifacts under `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn templates(&self, system_id: &str) -> Result<Arc<CompiledTemplates>, CatalogError> {
        self.cache
            .get_or_build(system_id, |id| -> Result<CompiledTemplates, CatalogError> {
                let source = self.provider.load(id)?;
                let compiled = match &self.output_dir {
                    Some(dir) => self.compile_to_dir(id, &source, dir)?,
                    None => {
                        let mut bytes = Vec::new();
                        self.compiler.compile(id, &source, &mut bytes)?;
                        CompiledTemplates {
                            system_id: id.to_string(),
                            bytes,
                            path: None,
                        }
                    }
                };
                log::info!("Compiled templates '{}' ({} bytes)", id, compiled.bytes.len());
                Ok(compiled)
            })
    }

    pub fn cache(&self) -> &CachingLoadStrategy<CompiledTemplates> {
        &self.cache
    }

    /// The temp file is deleted on drop, so any error before `persist` leaves
    /// nothing behind in `dir`.
    fn compile_to_dir(
        &self,
        system_id: &str,
        source: &[u8],
        dir: &Path,
    ) -> Result<CompiledTemplates, CatalogError> {
        std::fs::create_dir_all(dir)?;
        let mut temp = NamedTempFile::new_in(dir)?;
        self.compiler.compile(system_id, source, temp.as_file_mut())?;
        temp.as_file_mut().flush()?;

        let target = dir.join(artifact_name(system_id));
        temp.persist(&target).map_err(|e| CatalogError::Persist {
            path: target.display().to_string(),
            message: e.error.to_string(),
        })?;
        let bytes = std::fs::read(&target)?;
        Ok(CompiledTemplates {
            system_id: system_id.to_string(),
            bytes,
            path: Some(target),
        })
    }
}

/// A readable slug plus a digest of the full system-id, so ids that slug
/// alike still get their own file.
fn artifact_name(system_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(system_id.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    let stem = slug::slugify(system_id);
    if stem.is_empty() {
        format!("templates-{}.compiled", &digest[..16])
    } else {
        format!("{}-{}.compiled", stem, &digest[..16])
    }
}
