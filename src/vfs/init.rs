/*!
 * VFS Initialization
 * Builds the disk registry from configuration
 */

use std::sync::Arc;
use tracing::{info, warn};

use super::archive::{ArchiveDisk, DirectoryResourceLoader, Manifest};
use super::local::NativeDisk;
use super::memory::MemoryDisk;
use super::registry::DiskRegistry;
use super::types::VfsResult;
use crate::config::VfsConfig;

/// Build a registry with the storage disk, the memory disks and the archive
pub fn init_registry(config: &VfsConfig) -> VfsResult<DiskRegistry> {
    info!("Initializing disk registry");

    let registry = DiskRegistry::new(load_archive(config)?);

    info!(
        storage_path = %config.storage_path.display(),
        disk = %config.storage_disk,
        read_only = config.storage_read_only,
        "Mounting native storage"
    );
    if let Err(e) = std::fs::create_dir_all(&config.storage_path) {
        warn!(error = %e, "Could not create storage directory");
    }
    let storage = if config.storage_read_only {
        NativeDisk::read_only(&config.storage_path)?
    } else {
        NativeDisk::new(&config.storage_path)?
    };
    registry.add_disk(&config.storage_disk, storage)?;

    for name in &config.memory_disks {
        info!(disk = %name, "Mounting in-memory disk");
        registry.add_disk(name, MemoryDisk::new())?;
    }

    info!(disks = ?registry.disk_names(), "Disk registry ready");
    Ok(registry)
}

/// Archive from the configured manifest, or an empty one
fn load_archive(config: &VfsConfig) -> VfsResult<ArchiveDisk> {
    let Some(manifest_path) = &config.manifest_path else {
        info!("No archive manifest configured, sys disk is empty");
        return Ok(ArchiveDisk::empty());
    };

    let manifest = Manifest::from_file(manifest_path)?;
    let resources = config
        .resources_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    info!(
        manifest = %manifest_path.display(),
        resources = %resources.display(),
        entries = manifest.len(),
        "Loading archive"
    );
    ArchiveDisk::new(&manifest, Arc::new(DirectoryResourceLoader::new(resources)))
}
