/*!
 * Native Disk
 * Disk backed by a sandboxed host directory
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info};

use super::disk::Disk;
use super::sandbox::{read_path, write_path, ResolveMode};
use super::traits::DiskOps;
use super::types::*;

/// Host directory disk
///
/// Every call resolves through the sandbox walker rooted at `root` before
/// touching std::fs, so nothing outside of `root` is ever read or written.
#[derive(Debug, Clone)]
pub struct NativeDisk {
    root: PathBuf,
    read_only: bool,
}

impl NativeDisk {
    /// Create a writeable disk over an existing directory
    pub fn new<P: AsRef<Path>>(root: P) -> VfsResult<Self> {
        Self::with_options(root, false)
    }

    /// Create a write-protected disk over an existing directory
    pub fn read_only<P: AsRef<Path>>(root: P) -> VfsResult<Self> {
        Self::with_options(root, true)
    }

    fn with_options<P: AsRef<Path>>(root: P, read_only: bool) -> VfsResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(VfsError::NotFound(format!(
                "can't create disk on missing folder {}",
                root.display()
            )));
        }
        let root = root
            .canonicalize()
            .map_err(|e| VfsError::from_io(e, format!("canonicalize {}", root.display())))?;
        info!(root = %root.display(), read_only, "Native disk opened");
        Ok(Self { root, read_only })
    }

    /// Native directory this disk is rooted at
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn check_write(&self) -> VfsResult<()> {
        if self.read_only {
            return Err(VfsError::DiskNotWriteable(self.root.display().to_string()));
        }
        Ok(())
    }

    fn existing(&self, path: &str, mode: ResolveMode) -> VfsResult<PathBuf> {
        read_path(&self.root, path, mode)?.ok_or_else(|| VfsError::NotFound(path.to_string()))
    }

    fn convert_metadata(md: &fs::Metadata) -> FileInfo {
        let modified = md.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if md.is_dir() {
            FileInfo::directory(modified)
        } else {
            FileInfo::file(md.len(), modified)
        }
    }
}

impl DiskOps for NativeDisk {
    fn list_names(&self, dir: &str) -> VfsResult<Vec<String>> {
        let native = self.existing(dir, ResolveMode::Directory)?;
        let entries = fs::read_dir(&native)
            .map_err(|e| VfsError::from_io(e, format!("list {}", dir)))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VfsError::from_io(e, format!("list {}", dir)))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn info(&self, path: &str) -> VfsResult<FileInfo> {
        let native = self.existing(path, ResolveMode::Any)?;
        let md = fs::metadata(&native).map_err(|e| VfsError::from_io(e, format!("stat {}", path)))?;
        Ok(Self::convert_metadata(&md))
    }

    fn read_binary(&self, path: &str) -> VfsResult<Option<Vec<u8>>> {
        let Some(native) = read_path(&self.root, path, ResolveMode::File)? else {
            return Ok(None);
        };
        if native.is_dir() {
            return Ok(None);
        }
        fs::read(&native)
            .map(Some)
            .map_err(|e| VfsError::from_io(e, format!("read {}", path)))
    }

    fn is_writeable(&self) -> bool {
        !self.read_only
    }

    fn write_binary(&self, path: &str, data: &[u8]) -> VfsResult<()> {
        if self.read_only {
            debug!(path = %path, "Write ignored on read-only native disk");
            return Ok(());
        }
        let native = write_path(&self.root, path, false)?;
        fs::write(&native, data).map_err(|e| VfsError::from_io(e, format!("write {}", path)))?;
        debug!(path = %path, size = data.len(), "Native disk write");
        Ok(())
    }

    fn make_dir(&self, path: &str) -> VfsResult<()> {
        self.check_write()?;
        if read_path(&self.root, path, ResolveMode::Any)?.is_some() {
            return Err(VfsError::AlreadyExists(path.to_string()));
        }
        write_path(&self.root, path, true)?;
        debug!(path = %path, "Native disk mkdir");
        Ok(())
    }

    fn delete(&self, path: &str) -> VfsResult<()> {
        self.check_write()?;
        let native = self.existing(path, ResolveMode::Any)?;
        if native == self.root {
            return Err(VfsError::InvalidPath("cannot delete the disk root".into()));
        }

        let result = if native.is_dir() {
            fs::remove_dir(&native)
        } else {
            fs::remove_file(&native)
        };
        result.map_err(|e| VfsError::from_io(e, path.to_string()))?;
        debug!(path = %path, "Native disk delete");
        Ok(())
    }

    fn mount(&self, path: &str) -> VfsResult<Disk> {
        let root = if self.read_only {
            self.existing(path, ResolveMode::Directory)?
        } else {
            write_path(&self.root, path, true)?
        };
        Ok(Disk::Native(NativeDisk {
            root,
            read_only: self.read_only,
        }))
    }
}
