/*!
 * Archive Disk
 * Read-only disk over bundled resources, materialized lazily
 */

mod loader;
mod manifest;

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info};

pub use loader::{DirectoryResourceLoader, ResourceLoader, StaticResourceLoader};
pub use manifest::{Manifest, ManifestEntry};

use super::disk::Disk;
use super::paths;
use super::traits::DiskOps;
use super::types::*;
use crate::core::limits::SYSTEM_DISK_NAME;

/// Content fetched for an entry
#[derive(Debug, Clone)]
struct Materialized {
    data: Arc<[u8]>,
    info: FileInfo,
}

/// Bundled file whose content is fetched on first use
///
/// Size is unknown until the content has been loaded once; asking for the
/// info of an unread entry loads it. Failed loads are not cached.
struct CachedEntry {
    entry: ManifestEntry,
    state: Mutex<Option<Materialized>>,
}

impl CachedEntry {
    fn new(entry: ManifestEntry) -> Self {
        Self {
            entry,
            state: Mutex::new(None),
        }
    }

    fn materialize(&self, loader: &dyn ResourceLoader) -> VfsResult<Materialized> {
        let mut state = self.state.lock();
        if let Some(done) = state.as_ref() {
            return Ok(done.clone());
        }

        let data: Arc<[u8]> = loader.load(&self.entry.resources_path)?.into();
        let done = Materialized {
            info: FileInfo::file(data.len() as u64, SystemTime::now()),
            data,
        };
        debug!(
            resource = %self.entry.resources_path,
            size = done.data.len(),
            "Archive entry materialized"
        );
        *state = Some(done.clone());
        Ok(done)
    }
}

impl fmt::Debug for CachedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedEntry")
            .field("entry", &self.entry)
            .field("loaded", &self.state.lock().is_some())
            .finish()
    }
}

/// Frozen directory of the archive
#[derive(Debug)]
struct ArchiveDir {
    info: FileInfo,
    files: BTreeMap<String, Arc<CachedEntry>>,
    dirs: BTreeMap<String, Arc<ArchiveDir>>,
}

enum Node<'a> {
    Dir(&'a Arc<ArchiveDir>),
    File(&'a Arc<CachedEntry>),
}

/// Find the node at `path` below `dir`
fn lookup<'a>(dir: &'a Arc<ArchiveDir>, path: &[&str]) -> Option<Node<'a>> {
    match path {
        [] => Some(Node::Dir(dir)),
        [name] => {
            if let Some(file) = dir.files.get(*name) {
                Some(Node::File(file))
            } else {
                dir.dirs.get(*name).map(Node::Dir)
            }
        }
        [head, rest @ ..] => lookup(dir.dirs.get(*head)?, rest),
    }
}

/// Mutable tree used only while the manifest is being read
#[derive(Default)]
struct DirBuilder {
    files: BTreeMap<String, ManifestEntry>,
    dirs: BTreeMap<String, DirBuilder>,
}

impl DirBuilder {
    fn insert(&mut self, original: &str, path: &[&str], entry: ManifestEntry) -> VfsResult<()> {
        match path {
            [] => Err(VfsError::Manifest(format!("empty entry path '{}'", original))),
            [name] => {
                if self.files.contains_key(*name) || self.dirs.contains_key(*name) {
                    return Err(VfsError::Manifest(format!("duplicate path found: {}", original)));
                }
                self.files.insert(name.to_string(), entry);
                Ok(())
            }
            [head, rest @ ..] => {
                if self.files.contains_key(*head) {
                    return Err(VfsError::Manifest(format!(
                        "path {} runs through file {}",
                        original, head
                    )));
                }
                self.dirs
                    .entry(head.to_string())
                    .or_default()
                    .insert(original, rest, entry)
            }
        }
    }

    fn freeze(self, created: SystemTime) -> ArchiveDir {
        ArchiveDir {
            info: FileInfo::directory(created),
            files: self
                .files
                .into_iter()
                .map(|(name, entry)| (name, Arc::new(CachedEntry::new(entry))))
                .collect(),
            dirs: self
                .dirs
                .into_iter()
                .map(|(name, dir)| (name, Arc::new(dir.freeze(created))))
                .collect(),
        }
    }
}

/// Case-folded segments of an archive path
fn fold(path: &str) -> Vec<String> {
    paths::segments(&path.to_lowercase())
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn as_refs(segments: &[String]) -> Vec<&str> {
    segments.iter().map(String::as_str).collect()
}

/// Read-only bundled disk
///
/// The tree is built once from a [`Manifest`]; mounts and clones share it.
/// All names are lower-cased, so lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct ArchiveDisk {
    root: Arc<ArchiveDir>,
    loader: Arc<dyn ResourceLoader>,
}

impl ArchiveDisk {
    /// Build the archive tree from a manifest
    pub fn new(manifest: &Manifest, loader: Arc<dyn ResourceLoader>) -> VfsResult<Self> {
        let mut builder = DirBuilder::default();
        for (path, entry) in manifest.entries() {
            let segments = fold(path);
            builder.insert(path, &as_refs(&segments), entry.clone())?;
        }

        info!(entries = manifest.len(), "Archive disk built");
        Ok(Self {
            root: Arc::new(builder.freeze(SystemTime::now())),
            loader,
        })
    }

    /// Archive with no entries
    pub fn empty() -> Self {
        Self {
            root: Arc::new(DirBuilder::default().freeze(SystemTime::now())),
            loader: Arc::new(StaticResourceLoader::new()),
        }
    }

    fn not_writeable() -> VfsError {
        VfsError::DiskNotWriteable(SYSTEM_DISK_NAME.to_string())
    }

    fn with_node<T>(&self, path: &str, f: impl FnOnce(Option<Node<'_>>) -> T) -> T {
        let segments = fold(path);
        f(lookup(&self.root, &as_refs(&segments)))
    }
}

impl DiskOps for ArchiveDisk {
    fn list_names(&self, dir: &str) -> VfsResult<Vec<String>> {
        self.with_node(dir, |node| match node {
            Some(Node::Dir(d)) => Ok(d.files.keys().chain(d.dirs.keys()).cloned().collect()),
            Some(Node::File(_)) => Err(VfsError::NotADirectory(dir.to_string())),
            None => Err(VfsError::NotFound(dir.to_string())),
        })
    }

    fn info(&self, path: &str) -> VfsResult<FileInfo> {
        self.with_node(path, |node| match node {
            Some(Node::Dir(d)) => Ok(d.info.clone()),
            Some(Node::File(entry)) => Ok(entry.materialize(self.loader.as_ref())?.info),
            None => Err(VfsError::NotFound(path.to_string())),
        })
    }

    fn read_binary(&self, path: &str) -> VfsResult<Option<Vec<u8>>> {
        self.with_node(path, |node| match node {
            Some(Node::File(entry)) => {
                Ok(Some(entry.materialize(self.loader.as_ref())?.data.to_vec()))
            }
            _ => Ok(None),
        })
    }

    fn exists(&self, path: &str) -> Option<EntryKind> {
        // Existence never forces a load
        self.with_node(path, |node| match node {
            Some(Node::Dir(_)) => Some(EntryKind::Directory),
            Some(Node::File(_)) => Some(EntryKind::File),
            None => None,
        })
    }

    fn is_writeable(&self) -> bool {
        false
    }

    fn write_binary(&self, path: &str, _data: &[u8]) -> VfsResult<()> {
        debug!(path = %path, "Write ignored on archive disk");
        Ok(())
    }

    fn make_dir(&self, _path: &str) -> VfsResult<()> {
        Err(Self::not_writeable())
    }

    fn delete(&self, _path: &str) -> VfsResult<()> {
        Err(Self::not_writeable())
    }

    fn mount(&self, path: &str) -> VfsResult<Disk> {
        self.with_node(path, |node| match node {
            Some(Node::Dir(d)) => Ok(Disk::Archive(ArchiveDisk {
                root: Arc::clone(d),
                loader: Arc::clone(&self.loader),
            })),
            Some(Node::File(_)) => Err(VfsError::NotADirectory(path.to_string())),
            None => Err(VfsError::NotFound(path.to_string())),
        })
    }
}
