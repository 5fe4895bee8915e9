/*!
 * Archive Manifest
 * JSON index of the bundled read-only entries
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::super::types::{VfsError, VfsResult};

/// One bundled file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Path of the source asset the entry was produced from
    #[serde(alias = "FullPath", default)]
    pub full_path: String,
    /// Locator handed to the resource loader
    #[serde(alias = "ResourcesPath")]
    pub resources_path: String,
}

impl ManifestEntry {
    pub fn new(full_path: impl Into<String>, resources_path: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            resources_path: resources_path.into(),
        }
    }
}

/// Mapping of slash-separated logical path to entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> VfsResult<Self> {
        serde_json::from_str(json).map_err(|e| VfsError::Manifest(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> VfsResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| VfsError::from_io(e, format!("read manifest {}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, path: impl Into<String>, entry: ManifestEntry) {
        self.entries.insert(path.into(), entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
