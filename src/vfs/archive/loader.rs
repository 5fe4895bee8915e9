/*!
 * Resource Loaders
 * Fetch the bytes behind an archive entry's locator
 */

use ahash::RandomState;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use super::super::sandbox::{read_path, ResolveMode};
use super::super::types::{VfsError, VfsResult};

/// Source of bundled content
pub trait ResourceLoader: Send + Sync + Debug {
    /// Load the full content behind `locator`
    fn load(&self, locator: &str) -> VfsResult<Vec<u8>>;
}

/// Loads locators as files under a native directory
#[derive(Debug, Clone)]
pub struct DirectoryResourceLoader {
    root: PathBuf,
}

impl DirectoryResourceLoader {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for DirectoryResourceLoader {
    fn load(&self, locator: &str) -> VfsResult<Vec<u8>> {
        let native = read_path(&self.root, locator, ResolveMode::File)?
            .ok_or_else(|| VfsError::NotFound(format!("resource {}", locator)))?;
        fs::read(&native).map_err(|e| VfsError::from_io(e, format!("load resource {}", locator)))
    }
}

/// In-memory blobs keyed by locator
#[derive(Debug, Clone, Default)]
pub struct StaticResourceLoader {
    blobs: HashMap<String, Vec<u8>, RandomState>,
}

impl StaticResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(locator, data);
        self
    }

    pub fn insert(&mut self, locator: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.blobs.insert(locator.into(), data.into());
    }
}

impl ResourceLoader for StaticResourceLoader {
    fn load(&self, locator: &str) -> VfsResult<Vec<u8>> {
        self.blobs
            .get(locator)
            .cloned()
            .ok_or_else(|| VfsError::NotFound(format!("resource {}", locator)))
    }
}
