/*!
 * Disk
 * Closed set of disk variants behind the one contract
 */

use super::archive::ArchiveDisk;
use super::local::NativeDisk;
use super::memory::MemoryDisk;
use super::traits::DiskOps;
use super::types::*;

/// A named storage backend
///
/// Cheap to clone: every variant shares its backing state.
#[derive(Debug, Clone)]
pub enum Disk {
    Native(NativeDisk),
    Memory(MemoryDisk),
    Archive(ArchiveDisk),
}

impl Disk {
    /// Short backend label for logs and listings
    pub fn backend(&self) -> &'static str {
        match self {
            Disk::Native(_) => "native",
            Disk::Memory(_) => "memory",
            Disk::Archive(_) => "archive",
        }
    }

    #[inline]
    fn ops(&self) -> &dyn DiskOps {
        match self {
            Disk::Native(disk) => disk,
            Disk::Memory(disk) => disk,
            Disk::Archive(disk) => disk,
        }
    }
}

impl DiskOps for Disk {
    fn list_names(&self, dir: &str) -> VfsResult<Vec<String>> {
        self.ops().list_names(dir)
    }

    fn info(&self, path: &str) -> VfsResult<FileInfo> {
        self.ops().info(path)
    }

    fn read_binary(&self, path: &str) -> VfsResult<Option<Vec<u8>>> {
        self.ops().read_binary(path)
    }

    fn read_text(&self, path: &str) -> VfsResult<Option<String>> {
        self.ops().read_text(path)
    }

    fn exists(&self, path: &str) -> Option<EntryKind> {
        self.ops().exists(path)
    }

    fn is_writeable(&self) -> bool {
        self.ops().is_writeable()
    }

    fn write_binary(&self, path: &str, data: &[u8]) -> VfsResult<()> {
        self.ops().write_binary(path, data)
    }

    fn write_text(&self, path: &str, text: &str) -> VfsResult<()> {
        self.ops().write_text(path, text)
    }

    fn make_dir(&self, path: &str) -> VfsResult<()> {
        self.ops().make_dir(path)
    }

    fn delete(&self, path: &str) -> VfsResult<()> {
        self.ops().delete(path)
    }

    fn mount(&self, path: &str) -> VfsResult<Disk> {
        self.ops().mount(path)
    }
}

impl From<NativeDisk> for Disk {
    fn from(disk: NativeDisk) -> Self {
        Disk::Native(disk)
    }
}

impl From<MemoryDisk> for Disk {
    fn from(disk: MemoryDisk) -> Self {
        Disk::Memory(disk)
    }
}

impl From<ArchiveDisk> for Disk {
    fn from(disk: ArchiveDisk) -> Self {
        Disk::Archive(disk)
    }
}
