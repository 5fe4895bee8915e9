/*!
 * In-Memory Disk
 * Volatile, fully writeable disk backed by a directory tree
 */

mod tree;

use std::sync::Arc;

use tracing::debug;

pub use tree::{DirectoryTree, MemoryFile, SharedTree};

use super::disk::Disk;
use super::paths;
use super::traits::DiskOps;
use super::types::*;

/// Memory-backed disk
///
/// Cloning and mounting share the underlying nodes: a disk mounted from
/// `/tmp/work` and `/tmp` see each other's writes immediately.
#[derive(Debug, Clone)]
pub struct MemoryDisk {
    root: SharedTree,
}

impl MemoryDisk {
    /// Create an empty disk
    pub fn new() -> Self {
        Self {
            root: DirectoryTree::shared(),
        }
    }

    /// Disk over an existing node
    pub fn from_tree(root: SharedTree) -> Self {
        Self { root }
    }

    /// Deep copy of another disk's whole content
    ///
    /// Used to take a writeable scratch copy of a native sandbox. Later
    /// changes on either side are independent.
    pub fn snapshot(source: &impl DiskOps) -> VfsResult<Self> {
        let mut tree = DirectoryTree::new();
        copy_directory(source, "", &mut tree)?;
        debug!("Snapshot copied into memory disk");
        Ok(Self::from_tree(Arc::new(parking_lot::RwLock::new(tree))))
    }

    /// Shared root node
    pub fn root(&self) -> &SharedTree {
        &self.root
    }

    /// Whether two disks are views of the same node
    pub fn same_root(&self, other: &MemoryDisk) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}

impl Default for MemoryDisk {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively copy `dir` of `source` into `into`
fn copy_directory(source: &impl DiskOps, dir: &str, into: &mut DirectoryTree) -> VfsResult<()> {
    into.set_info(source.info(dir)?);
    for name in source.list_names(dir)? {
        let path = paths::combine(dir, &name);
        let info = source.info(&path)?;
        if info.is_directory {
            let mut sub = DirectoryTree::new();
            copy_directory(source, &path, &mut sub)?;
            into.attach(&name, sub)?;
        } else {
            let data = source.read_binary(&path)?.unwrap_or_default();
            into.insert_file(&name, info, data);
        }
    }
    Ok(())
}

/// Collapse a disk-relative path into owned segments
fn split(path: &str) -> VfsResult<Vec<String>> {
    let collapsed = paths::collapse(path)?;
    Ok(paths::segments(&collapsed)
        .into_iter()
        .map(str::to_string)
        .collect())
}

fn as_refs(segments: &[String]) -> Vec<&str> {
    segments.iter().map(String::as_str).collect()
}

impl DiskOps for MemoryDisk {
    fn list_names(&self, dir: &str) -> VfsResult<Vec<String>> {
        let segments = split(dir)?;
        self.root.read().list(&as_refs(&segments))
    }

    fn info(&self, path: &str) -> VfsResult<FileInfo> {
        let segments = split(path)?;
        self.root.read().info(&as_refs(&segments))
    }

    fn read_binary(&self, path: &str) -> VfsResult<Option<Vec<u8>>> {
        let segments = split(path)?;
        Ok(self.root.read().read_bytes(&as_refs(&segments)))
    }

    fn is_writeable(&self) -> bool {
        true
    }

    fn write_binary(&self, path: &str, data: &[u8]) -> VfsResult<()> {
        let segments = split(path)?;
        self.root
            .write()
            .write_bytes(&as_refs(&segments), data.to_vec())?;
        debug!(path = %path, size = data.len(), "Memory disk write");
        Ok(())
    }

    fn make_dir(&self, path: &str) -> VfsResult<()> {
        let segments = split(path)?;
        self.root.write().make_dir(&as_refs(&segments))?;
        debug!(path = %path, "Memory disk mkdir");
        Ok(())
    }

    fn delete(&self, path: &str) -> VfsResult<()> {
        let segments = split(path)?;
        self.root.write().delete(&as_refs(&segments))?;
        debug!(path = %path, "Memory disk delete");
        Ok(())
    }

    fn mount(&self, path: &str) -> VfsResult<Disk> {
        let segments = split(path)?;
        let node = if segments.is_empty() {
            Arc::clone(&self.root)
        } else {
            self.root.read().dir_at(&as_refs(&segments))?
        };
        Ok(Disk::Memory(MemoryDisk::from_tree(node)))
    }
}
