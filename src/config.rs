/*!
 * Configuration
 * Disk layout and resolver settings, from defaults, environment or JSON
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::limits::*;
use crate::vfs::{VfsError, VfsResult};

/// Module resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Directories scanned for bare library names on reset
    pub library_dirs: Vec<String>,
    /// Extension appended to library specifiers that lack one
    pub extension: String,
    /// File stem tried when a specifier names a directory
    pub index_stem: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            library_dirs: DEFAULT_LIBRARY_DIRS.iter().map(|s| s.to_string()).collect(),
            extension: SCRIPT_EXTENSION.to_string(),
            index_stem: LIBRARY_INDEX_STEM.to_string(),
        }
    }
}

/// Disk layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    /// Native directory backing the storage disk
    pub storage_path: PathBuf,
    /// Name of the storage disk
    pub storage_disk: String,
    /// Mount the storage disk write-protected
    pub storage_read_only: bool,
    /// In-memory disks created at startup
    pub memory_disks: Vec<String>,
    /// Archive manifest (JSON); an empty archive is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
    /// Directory archive resource locators are resolved against;
    /// defaults to the manifest's directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources_path: Option<PathBuf>,
    pub resolver: ResolverConfig,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            storage_disk: DEFAULT_STORAGE_DISK.to_string(),
            storage_read_only: false,
            memory_disks: DEFAULT_MEMORY_DISKS.iter().map(|s| s.to_string()).collect(),
            manifest_path: None,
            resources_path: None,
            resolver: ResolverConfig::default(),
        }
    }
}

impl VfsConfig {
    /// Defaults overridden by `SCRIPT_VFS_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var(ENV_STORAGE_PATH) {
            config.storage_path = PathBuf::from(path);
        }
        if let Ok(name) = std::env::var(ENV_STORAGE_DISK) {
            if !name.is_empty() {
                config.storage_disk = name;
            }
        }
        if let Ok(flag) = std::env::var(ENV_READONLY) {
            config.storage_read_only = flag == "1" || flag.eq_ignore_ascii_case("true");
        }
        if let Ok(path) = std::env::var(ENV_MANIFEST) {
            config.manifest_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(ENV_RESOURCES) {
            config.resources_path = Some(PathBuf::from(path));
        }

        config
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> VfsResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| VfsError::from_io(e, format!("read config {}", path.display())))?;
        serde_json::from_str(&json).map_err(|e| VfsError::Io(format!("parse config: {}", e)))
    }

    /// Directory resource locators resolve against
    pub fn resources_dir(&self) -> Option<PathBuf> {
        self.resources_path.clone().or_else(|| {
            self.manifest_path
                .as_ref()
                .and_then(|manifest| manifest.parent())
                .map(Path::to_path_buf)
        })
    }
}
