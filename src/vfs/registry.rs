/*!
 * Disk Registry
 * Routes `/diskname/rest` paths to named disks
 */

use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::archive::ArchiveDisk;
use super::disk::Disk;
use super::handle::OpenFile;
use super::paths;
use super::traits::DiskOps;
use super::types::*;
use crate::core::limits::SYSTEM_DISK_NAME;
use crate::monitoring::span_operation;

/// Info of one entry together with the absolute path it was asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub path: String,
    #[serde(flatten)]
    pub info: FileInfo,
}

/// Table of named disks
///
/// `sys` always routes to the archive the registry was built with; it is not
/// part of the user table and can be neither added nor replaced. Clones share
/// the same table.
pub struct DiskRegistry {
    disks: Arc<DashMap<String, Disk, RandomState>>,
    system: ArchiveDisk,
}

impl DiskRegistry {
    pub fn new(system: ArchiveDisk) -> Self {
        Self {
            disks: Arc::new(DashMap::with_hasher(RandomState::new())),
            system,
        }
    }

    /// Register `disk` under `name`, replacing any previous disk of that name
    pub fn add_disk(&self, name: &str, disk: impl Into<Disk>) -> VfsResult<()> {
        validate_disk_name(name)?;
        let disk = disk.into();
        info!(disk = %name, backend = disk.backend(), "Disk registered");
        self.disks.insert(name.to_string(), disk);
        Ok(())
    }

    /// Remove a user disk
    pub fn remove_disk(&self, name: &str) -> VfsResult<Disk> {
        self.disks
            .remove(name)
            .map(|(_, disk)| disk)
            .ok_or_else(|| VfsError::DiskNotFound(name.to_string()))
    }

    /// Disk registered under `name`
    pub fn disk(&self, name: &str) -> Option<Disk> {
        if name == SYSTEM_DISK_NAME {
            return Some(Disk::Archive(self.system.clone()));
        }
        self.disks.get(name).map(|entry| entry.value().clone())
    }

    /// Sorted names of all disks, `sys` included
    pub fn disk_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.disks.iter().map(|entry| entry.key().clone()).collect();
        names.push(SYSTEM_DISK_NAME.to_string());
        names.sort();
        names
    }

    /// Split an absolute path into its disk and the disk-relative remainder
    pub fn resolve(&self, path: &str) -> VfsResult<(Disk, String)> {
        let (name, rest) = split_disk(path)?;
        let disk = self
            .disk(name)
            .ok_or_else(|| VfsError::DiskNotFound(name.to_string()))?;
        Ok((disk, rest.to_string()))
    }

    fn resolve_absolute(&self, path: &str) -> VfsResult<(Disk, String, String)> {
        let absolute = paths::resolve_absolute(path)?;
        let (disk, rest) = self.resolve(&absolute)?;
        Ok((disk, rest, absolute))
    }

    fn writeable(&self, path: &str) -> VfsResult<(Disk, String)> {
        let (disk, rest, absolute) = self.resolve_absolute(path)?;
        if !disk.is_writeable() {
            let (name, _) = split_disk(&absolute)?;
            return Err(VfsError::DiskNotWriteable(name.to_string()));
        }
        Ok((disk, rest))
    }

    /// Entries of a directory; listing `/` yields the sorted `/name` of every disk
    pub fn children(&self, path: &str) -> VfsResult<Vec<String>> {
        let absolute = paths::resolve_absolute(path)?;
        if absolute == "/" {
            return Ok(self
                .disk_names()
                .into_iter()
                .map(|name| format!("/{}", name))
                .collect());
        }
        let (disk, rest) = self.resolve(&absolute)?;
        disk.list_names(&rest)
    }

    pub fn info(&self, path: &str) -> VfsResult<EntryInfo> {
        let (disk, rest, absolute) = self.resolve_absolute(path)?;
        let info = disk.info(&rest)?;
        Ok(EntryInfo {
            path: absolute,
            info,
        })
    }

    /// Whether `path` exists; unknown disks and malformed paths do not
    pub fn exists(&self, path: &str) -> Option<EntryKind> {
        let (disk, rest, _) = self.resolve_absolute(path).ok()?;
        disk.exists(&rest)
    }

    pub fn read_text(&self, path: &str) -> VfsResult<Option<String>> {
        let (disk, rest, _) = self.resolve_absolute(path)?;
        disk.read_text(&rest)
    }

    pub fn read_binary(&self, path: &str) -> VfsResult<Option<Vec<u8>>> {
        let (disk, rest, _) = self.resolve_absolute(path)?;
        disk.read_binary(&rest)
    }

    pub fn read_lines(&self, path: &str) -> VfsResult<Option<Vec<String>>> {
        let (disk, rest, _) = self.resolve_absolute(path)?;
        disk.read_lines(&rest)
    }

    pub fn write_text(&self, path: &str, text: &str) -> VfsResult<()> {
        let (disk, rest) = self.writeable(path)?;
        disk.write_text(&rest, text)
    }

    pub fn write_binary(&self, path: &str, data: &[u8]) -> VfsResult<()> {
        let (disk, rest) = self.writeable(path)?;
        disk.write_binary(&rest, data)
    }

    pub fn write_lines(&self, path: &str, lines: &[String]) -> VfsResult<()> {
        let (disk, rest) = self.writeable(path)?;
        disk.write_lines(&rest, lines)
    }

    pub fn make_dir(&self, path: &str) -> VfsResult<()> {
        let (disk, rest) = self.writeable(path)?;
        if disk.exists(&rest).is_some() {
            return Err(VfsError::AlreadyExists(path.to_string()));
        }
        disk.make_dir(&rest)
    }

    pub fn delete(&self, path: &str) -> VfsResult<()> {
        let (disk, rest) = self.writeable(path)?;
        disk.delete(&rest)?;
        info!(path = %path, "Deleted");
        Ok(())
    }

    /// Move a file; an existing destination file is never overwritten
    pub fn move_path(&self, from: &str, to: &str) -> VfsResult<()> {
        self.move_or_copy(from, to, true, false)
    }

    /// Copy a file; an existing destination file is never overwritten
    pub fn copy_path(&self, from: &str, to: &str) -> VfsResult<()> {
        self.move_or_copy(from, to, false, false)
    }

    /// Copy a file across disks, optionally removing the source
    ///
    /// A destination that is an existing directory receives the source's
    /// base name. The destination's parent directory must exist before the
    /// source is touched. Failure to delete the source is logged and ignored.
    /// Paths differing only in letter case are left untouched: whether that
    /// is a rename or a second file depends on the host and is not guessed.
    pub fn move_or_copy(
        &self,
        from: &str,
        to: &str,
        delete_source: bool,
        overwrite: bool,
    ) -> VfsResult<()> {
        let span = span_operation(if delete_source { "move" } else { "copy" });
        let result = self.transfer(from, to, delete_source, overwrite);
        span.finish(&result);
        result
    }

    fn transfer(&self, from: &str, to: &str, delete_source: bool, overwrite: bool) -> VfsResult<()> {
        let from = paths::resolve_absolute(from)?;
        let to = paths::resolve_absolute(to)?;
        if from == to {
            return Ok(());
        }

        let (source, source_rest) = self.resolve(&from)?;
        let (target, mut target_rest) = self.resolve(&to)?;
        if !target.is_writeable() {
            let (name, _) = split_disk(&to)?;
            return Err(VfsError::DiskNotWriteable(name.to_string()));
        }

        if from.to_lowercase() == to.to_lowercase() {
            debug!(from = %from, to = %to, "Case-only rename left as a no-op");
            return Ok(());
        }

        match target.exists(&target_rest) {
            Some(EntryKind::Directory) => {
                target_rest = paths::combine(&target_rest, paths::file_name(&source_rest));
            }
            Some(EntryKind::File) if !overwrite => {
                return Err(VfsError::AlreadyExists(to));
            }
            _ => {}
        }

        // Nothing is read or deleted unless the destination can be written
        let target_dir = paths::parent(&target_rest);
        if !target_dir.is_empty()
            && target_dir != "/"
            && target.exists(&target_dir) != Some(EntryKind::Directory)
        {
            return Err(VfsError::NotFound(paths::parent(&to)));
        }

        let data = match source.read_binary(&source_rest)? {
            Some(data) => data,
            None if source.exists(&source_rest) == Some(EntryKind::Directory) => {
                return Err(VfsError::IsADirectory(from));
            }
            None => return Err(VfsError::NotFound(from)),
        };

        if delete_source {
            if let Err(e) = source.delete(&source_rest) {
                warn!(path = %from, error = %e, "Source kept after move");
            }
        }

        target.write_binary(&target_rest, &data)?;
        info!(from = %from, to = %to, size = data.len(), moved = delete_source, "Transferred");
        Ok(())
    }

    /// Bind the directory at `from` as a new disk called `name`
    ///
    /// Any disk already registered under `name` is replaced.
    pub fn mount(&self, from: &str, name: &str) -> VfsResult<()> {
        validate_disk_name(name)?;
        let span = span_operation("mount");
        let result = self
            .resolve_absolute(from)
            .and_then(|(disk, rest, _)| disk.mount(&rest));
        span.finish(&result);

        let mounted = result?;
        if self.disks.contains_key(name) {
            debug!(disk = %name, "Replacing mounted disk");
        }
        info!(from = %from, disk = %name, backend = mounted.backend(), "Mounted");
        self.disks.insert(name.to_string(), mounted);
        Ok(())
    }

    /// Open a file handle
    pub fn open(&self, path: &str, mode: &str) -> VfsResult<OpenFile> {
        let mode: OpenMode = mode.parse()?;
        let (disk, rest, _) = self.resolve_absolute(path)?;
        OpenFile::open(disk, rest, mode)
    }
}

impl Clone for DiskRegistry {
    fn clone(&self) -> Self {
        Self {
            disks: Arc::clone(&self.disks),
            system: self.system.clone(),
        }
    }
}

impl std::fmt::Debug for DiskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskRegistry")
            .field("disks", &self.disk_names())
            .finish()
    }
}

/// `"/usr/a/b"` splits into `("usr", "a/b")`
fn split_disk(path: &str) -> VfsResult<(&str, &str)> {
    let Some(stripped) = path.strip_prefix('/') else {
        return Err(VfsError::UnsupportedRelativePath(path.to_string()));
    };
    let (name, rest) = stripped.split_once('/').unwrap_or((stripped, ""));
    if name.is_empty() {
        return Err(VfsError::DiskNotFound(String::new()));
    }
    Ok((name, rest))
}

fn validate_disk_name(name: &str) -> VfsResult<()> {
    if name.is_empty() {
        return Err(VfsError::ReservedDiskName("disk name can't be empty".into()));
    }
    if name.contains('/') {
        return Err(VfsError::ReservedDiskName(format!(
            "disk name can't contain forward slashes: {}",
            name
        )));
    }
    if name == "." || name == ".." {
        return Err(VfsError::ReservedDiskName(format!("disk name can't be {}", name)));
    }
    if name == SYSTEM_DISK_NAME {
        return Err(VfsError::ReservedDiskName(name.to_string()));
    }
    Ok(())
}
