/*!
 * Directory Tree
 * Recursive in-memory directory node
 */

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use super::super::types::{FileInfo, VfsError, VfsResult};

/// A directory node shared between a disk and any disks mounted from it
pub type SharedTree = Arc<RwLock<DirectoryTree>>;

/// File stored inside a [`DirectoryTree`]
#[derive(Debug, Clone)]
pub struct MemoryFile {
    pub info: FileInfo,
    pub data: Vec<u8>,
}

/// In-memory directory
///
/// Paths are consumed as segment slices, one segment per recursion level.
/// A name lives either in `files` or in `dirs`, never in both.
#[derive(Debug)]
pub struct DirectoryTree {
    info: FileInfo,
    files: BTreeMap<String, MemoryFile>,
    dirs: BTreeMap<String, SharedTree>,
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self {
            info: FileInfo::directory(SystemTime::now()),
            files: BTreeMap::new(),
            dirs: BTreeMap::new(),
        }
    }

    /// Wrap a fresh tree for sharing
    pub fn shared() -> SharedTree {
        Arc::new(RwLock::new(Self::new()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    /// Subdirectory node at `path`, relative to this node
    ///
    /// The empty path has no shareable handle here; callers hold the root's
    /// `Arc` themselves.
    pub fn dir_at(&self, path: &[&str]) -> VfsResult<SharedTree> {
        let (head, rest) = split_head(path)?;
        let Some(sub) = self.dirs.get(head) else {
            return Err(self.missing_dir(head));
        };
        if rest.is_empty() {
            Ok(Arc::clone(sub))
        } else {
            sub.read().dir_at(rest)
        }
    }

    pub fn info(&self, path: &[&str]) -> VfsResult<FileInfo> {
        match path {
            [] => Ok(self.info.clone()),
            [name] => {
                if let Some(file) = self.files.get(*name) {
                    Ok(file.info.clone())
                } else if let Some(sub) = self.dirs.get(*name) {
                    Ok(sub.read().info.clone())
                } else {
                    Err(VfsError::NotFound(name.to_string()))
                }
            }
            [head, rest @ ..] => self.descend(head)?.read().info(rest),
        }
    }

    /// File names followed by directory names
    pub fn list(&self, path: &[&str]) -> VfsResult<Vec<String>> {
        match path {
            [] => Ok(self
                .files
                .keys()
                .chain(self.dirs.keys())
                .cloned()
                .collect()),
            [head, rest @ ..] => self.descend(head)?.read().list(rest),
        }
    }

    pub fn read_bytes(&self, path: &[&str]) -> Option<Vec<u8>> {
        match path {
            [] => None,
            [name] => self.files.get(*name).map(|f| f.data.clone()),
            [head, rest @ ..] => self.dirs.get(*head)?.read().read_bytes(rest),
        }
    }

    pub fn read_text(&self, path: &[&str]) -> Option<String> {
        self.read_bytes(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Create or replace the file at `path`
    ///
    /// Intermediate directories are never created. A missing one is reported
    /// as [`VfsError::NotFound`] and leaves the tree untouched.
    pub fn write_bytes(&mut self, path: &[&str], bytes: Vec<u8>) -> VfsResult<()> {
        match path {
            [] => Err(VfsError::IsADirectory("/".into())),
            [name] => {
                if self.dirs.contains_key(*name) {
                    return Err(VfsError::IsADirectory(name.to_string()));
                }
                let info = FileInfo::file(bytes.len() as u64, SystemTime::now());
                self.files.insert(name.to_string(), MemoryFile { info, data: bytes });
                Ok(())
            }
            [head, rest @ ..] => self.descend(head)?.write().write_bytes(rest, bytes),
        }
    }

    pub fn make_dir(&mut self, path: &[&str]) -> VfsResult<()> {
        match path {
            [] => Err(VfsError::InvalidPath("empty directory path".into())),
            [name] => {
                if self.dirs.contains_key(*name) || self.files.contains_key(*name) {
                    return Err(VfsError::AlreadyExists(name.to_string()));
                }
                self.dirs.insert(name.to_string(), Self::shared());
                Ok(())
            }
            [head, rest @ ..] => self.descend(head)?.write().make_dir(rest),
        }
    }

    pub fn delete(&mut self, path: &[&str]) -> VfsResult<()> {
        match path {
            [] => Err(VfsError::InvalidPath("cannot delete the disk root".into())),
            [name] => {
                if self.files.remove(*name).is_some() {
                    return Ok(());
                }
                let empty = match self.dirs.get(*name) {
                    Some(sub) => sub.read().is_empty(),
                    None => return Err(VfsError::NotFound(name.to_string())),
                };
                if !empty {
                    return Err(VfsError::NotEmpty(name.to_string()));
                }
                self.dirs.remove(*name);
                Ok(())
            }
            [head, rest @ ..] => self.descend(head)?.write().delete(rest),
        }
    }

    /// Insert an already built subtree, replacing nothing
    pub(crate) fn attach(&mut self, name: &str, tree: DirectoryTree) -> VfsResult<()> {
        if self.dirs.contains_key(name) || self.files.contains_key(name) {
            return Err(VfsError::AlreadyExists(name.to_string()));
        }
        self.dirs.insert(name.to_string(), Arc::new(RwLock::new(tree)));
        Ok(())
    }

    pub(crate) fn set_info(&mut self, info: FileInfo) {
        self.info = info;
    }

    pub(crate) fn insert_file(&mut self, name: &str, info: FileInfo, data: Vec<u8>) {
        self.files.insert(name.to_string(), MemoryFile { info, data });
    }

    fn descend(&self, name: &str) -> VfsResult<&SharedTree> {
        self.dirs.get(name).ok_or_else(|| self.missing_dir(name))
    }

    fn missing_dir(&self, name: &str) -> VfsError {
        if self.files.contains_key(name) {
            VfsError::NotADirectory(name.to_string())
        } else {
            VfsError::NotFound(name.to_string())
        }
    }
}

impl Default for DirectoryTree {
    fn default() -> Self {
        Self::new()
    }
}

fn split_head<'a, 'b>(path: &'a [&'b str]) -> VfsResult<(&'b str, &'a [&'b str])> {
    match path {
        [head, rest @ ..] => Ok((*head, rest)),
        [] => Err(VfsError::InvalidPath("empty path".into())),
    }
}
