/*!
 * Script VFS Library
 * Multi-disk virtual filesystem and module resolver for sandboxed scripts
 */

pub mod config;
pub mod core;
pub mod modules;
pub mod monitoring;
pub mod vfs;

// Re-exports
pub use config::{ResolverConfig, VfsConfig};
pub use modules::{
    Binding, BindingSet, Completion, ExportTable, Exports, ImportError, ImportMode, ImportRequest,
    ImportResult, ImportStep, ModuleCompiler, ModuleOutcome, ModuleResolver, ModuleScope,
    PendingLoad,
};
pub use monitoring::{init_tracing, span_operation};
pub use vfs::{
    init_registry, ArchiveDisk, Disk, DiskOps, DiskRegistry, EntryInfo, EntryKind, FileInfo,
    MemoryDisk, NativeDisk, OpenFile, OpenMode, VfsError, VfsResult,
};
