#![allow(dead_code)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use xchain::{Context, Engine, EngineBuilder, EngineConfig, EngineError, XmlWriter};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A `Write` whose bytes stay readable after the writer is moved into a context.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A context writing XML into the returned buffer.
pub fn xml_context() -> (Context, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let mut context = Context::new();
    context.set_content_handler(Box::new(XmlWriter::new(buffer.clone())));
    (context, buffer)
}

/// A temporary catalog directory.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `relative` under the fixture, creating parents.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            search_path: vec![self.path().to_path_buf()],
            ..EngineConfig::default()
        }
    }

    pub fn engine(&self) -> Result<Engine, EngineError> {
        EngineBuilder::new().with_config(self.config()).build()
    }
}

pub fn context_url(path: &str) -> String {
    format!("resource://context-class-loader/{}", path)
}
