/*!
 * Virtual File System Module
 * Named disks over native, in-memory and bundled storage
 */

pub mod archive;
pub mod disk;
pub mod handle;
pub mod init;
pub mod local;
pub mod memory;
pub mod paths;
pub mod registry;
pub mod sandbox;
pub mod traits;
pub mod types;

// Re-exports
pub use archive::{ArchiveDisk, DirectoryResourceLoader, Manifest, ManifestEntry, ResourceLoader, StaticResourceLoader};
pub use disk::Disk;
pub use handle::OpenFile;
pub use init::init_registry;
pub use local::NativeDisk;
pub use memory::{DirectoryTree, MemoryDisk, SharedTree};
pub use registry::{DiskRegistry, EntryInfo};
pub use traits::DiskOps;
pub use types::{EntryKind, ErrorKind, FileInfo, OpenMode, VfsError, VfsResult};
