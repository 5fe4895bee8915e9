/*!
 * Disk Registry Tests
 * Path routing, intrinsics, mounting and cross-disk transfers
 */

use pretty_assertions::assert_eq;
use script_vfs::vfs::{ArchiveDisk, DiskRegistry, EntryKind, MemoryDisk, NativeDisk, VfsError};
use tempfile::TempDir;

fn memory_registry() -> DiskRegistry {
    let registry = DiskRegistry::new(ArchiveDisk::empty());
    registry.add_disk("home", MemoryDisk::new()).unwrap();
    registry.add_disk("tmp", MemoryDisk::new()).unwrap();
    registry
}

#[test]
fn test_root_lists_disks() {
    let registry = memory_registry();
    assert_eq!(registry.children("/").unwrap(), vec!["/home", "/sys", "/tmp"]);
}

#[test]
fn test_relative_paths_rejected() {
    let registry = memory_registry();
    assert!(matches!(
        registry.read_text("home/a.txt"),
        Err(VfsError::UnsupportedRelativePath(_))
    ));
    assert!(matches!(
        registry.read_text("/home/../.."),
        Err(VfsError::InvalidPath(_))
    ));
    assert!(matches!(
        registry.read_text("/nope/a.txt"),
        Err(VfsError::DiskNotFound(name)) if name == "nope"
    ));
}

#[test]
fn test_binary_round_trip() {
    let registry = memory_registry();
    let data: Vec<u8> = (0..=255).collect();
    registry.write_binary("/home/blob.bin", &data).unwrap();
    assert_eq!(registry.read_binary("/home/./blob.bin").unwrap(), Some(data));

    let info = registry.info("/home/blob.bin").unwrap();
    assert_eq!(info.path, "/home/blob.bin");
    assert_eq!(info.info.size, 256);
    assert!(!info.info.is_directory);
}

#[test]
fn test_lines() {
    let registry = memory_registry();
    registry
        .write_lines("/home/list.txt", &["a".to_string(), "b".to_string()])
        .unwrap();
    assert_eq!(registry.read_text("/home/list.txt").unwrap().as_deref(), Some("a\nb"));

    registry.write_text("/home/crlf.txt", "x\r\ny\rz").unwrap();
    assert_eq!(
        registry.read_lines("/home/crlf.txt").unwrap(),
        Some(vec!["x".to_string(), "y".to_string(), "z".to_string()])
    );
}

#[test]
fn test_delete_non_empty_directory() {
    let registry = memory_registry();
    registry.make_dir("/home/proj").unwrap();
    registry.write_text("/home/proj/a.txt", "a").unwrap();

    assert!(matches!(registry.delete("/home/proj"), Err(VfsError::NotEmpty(_))));
    assert_eq!(registry.exists("/home/proj/a.txt"), Some(EntryKind::File));

    registry.delete("/home/proj/a.txt").unwrap();
    registry.delete("/home/proj").unwrap();
    assert_eq!(registry.exists("/home/proj"), None);
    assert!(matches!(registry.delete("/home/proj"), Err(VfsError::NotFound(_))));
}

#[test]
fn test_make_dir_existing() {
    let registry = memory_registry();
    registry.make_dir("/home/d").unwrap();
    assert!(matches!(registry.make_dir("/home/d"), Err(VfsError::AlreadyExists(_))));
}

#[test]
fn test_mount_memory_is_live_alias() {
    let registry = memory_registry();
    registry.make_dir("/home/proj").unwrap();
    registry.mount("/home/proj", "proj2").unwrap();

    registry.write_text("/proj2/x", "through the mount").unwrap();
    assert_eq!(
        registry.read_text("/home/proj/x").unwrap().as_deref(),
        Some("through the mount")
    );

    registry.write_text("/home/proj/y", "back").unwrap();
    assert_eq!(registry.children("/proj2").unwrap(), vec!["x", "y"]);
}

#[test]
fn test_mount_rejects_bad_names() {
    let registry = memory_registry();
    registry.make_dir("/home/proj").unwrap();
    for name in ["a/b", ".", "..", "sys", ""] {
        assert!(
            matches!(registry.mount("/home/proj", name), Err(VfsError::ReservedDiskName(_))),
            "{name:?} accepted"
        );
    }
}

#[test]
fn test_mount_replaces_existing_disk() {
    let registry = memory_registry();
    registry.make_dir("/home/a").unwrap();
    registry.write_text("/home/a/file", "a").unwrap();
    registry.mount("/home/a", "tmp").unwrap();
    assert_eq!(registry.read_text("/tmp/file").unwrap().as_deref(), Some("a"));
}

#[test]
fn test_mount_native_sub_directory() {
    let temp = TempDir::new().unwrap();
    let registry = DiskRegistry::new(ArchiveDisk::empty());
    registry.add_disk("usr", NativeDisk::new(temp.path()).unwrap()).unwrap();

    registry.mount("/usr/projects/demo", "demo").unwrap();
    registry.write_text("/demo/main.ms", "print 1").unwrap();

    let native = temp.path().join("projects").join("demo").join("main.ms");
    assert_eq!(std::fs::read_to_string(native).unwrap(), "print 1");
}

#[test]
fn test_copy_across_disks() {
    let registry = memory_registry();
    registry.write_text("/home/a.txt", "payload").unwrap();
    registry.make_dir("/tmp/backup").unwrap();

    registry.copy_path("/home/a.txt", "/tmp/backup").unwrap();
    assert_eq!(
        registry.read_text("/tmp/backup/a.txt").unwrap().as_deref(),
        Some("payload")
    );
    assert_eq!(registry.exists("/home/a.txt"), Some(EntryKind::File));

    // Existing destination file is kept unless overwriting
    assert!(matches!(
        registry.copy_path("/home/a.txt", "/tmp/backup/a.txt"),
        Err(VfsError::AlreadyExists(_))
    ));
    registry.write_text("/home/a.txt", "newer").unwrap();
    registry
        .move_or_copy("/home/a.txt", "/tmp/backup/a.txt", false, true)
        .unwrap();
    assert_eq!(
        registry.read_text("/tmp/backup/a.txt").unwrap().as_deref(),
        Some("newer")
    );
}

#[test]
fn test_move_removes_source() {
    let registry = memory_registry();
    registry.write_text("/home/a.txt", "payload").unwrap();
    registry.move_path("/home/a.txt", "/tmp/b.txt").unwrap();

    assert_eq!(registry.exists("/home/a.txt"), None);
    assert_eq!(registry.read_text("/tmp/b.txt").unwrap().as_deref(), Some("payload"));
}

#[test]
fn test_move_to_missing_parent_keeps_source() {
    let registry = memory_registry();
    registry.write_text("/tmp/a.txt", "precious").unwrap();

    assert!(matches!(
        registry.move_path("/tmp/a.txt", "/tmp/nodir/b.txt"),
        Err(VfsError::NotFound(path)) if path == "/tmp/nodir"
    ));
    assert!(matches!(
        registry.move_path("/tmp/a.txt", "/home/x/y/b.txt"),
        Err(VfsError::NotFound(_))
    ));
    assert_eq!(registry.read_text("/tmp/a.txt").unwrap().as_deref(), Some("precious"));

    // Moving into the directory that already holds the file keeps it
    registry.move_path("/tmp/a.txt", "/tmp").unwrap();
    assert_eq!(registry.read_text("/tmp/a.txt").unwrap().as_deref(), Some("precious"));
}

#[test]
fn test_move_edge_cases() {
    let registry = memory_registry();
    registry.write_text("/home/a.txt", "payload").unwrap();

    // Identical and case-only paths are no-ops
    registry.move_path("/home/a.txt", "/home/./a.txt").unwrap();
    registry.move_path("/home/a.txt", "/home/A.TXT").unwrap();
    assert_eq!(registry.read_text("/home/a.txt").unwrap().as_deref(), Some("payload"));
    assert_eq!(registry.exists("/home/A.TXT"), None);

    assert!(matches!(
        registry.move_path("/home/missing", "/tmp/x"),
        Err(VfsError::NotFound(_))
    ));
    assert!(matches!(
        registry.move_path("/home/a.txt", "/nope/x"),
        Err(VfsError::DiskNotFound(_))
    ));
    assert!(matches!(
        registry.copy_path("/home/a.txt", "/sys/a.txt"),
        Err(VfsError::DiskNotWriteable(_))
    ));
}

#[test]
fn test_read_only_disks_refuse_writes() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("keep.txt"), "keep").unwrap();

    let registry = DiskRegistry::new(ArchiveDisk::empty());
    registry
        .add_disk("ro", NativeDisk::read_only(temp.path()).unwrap())
        .unwrap();

    assert_eq!(registry.read_text("/ro/keep.txt").unwrap().as_deref(), Some("keep"));
    assert!(matches!(
        registry.write_text("/ro/keep.txt", "changed"),
        Err(VfsError::DiskNotWriteable(name)) if name == "ro"
    ));
    assert!(matches!(registry.delete("/ro/keep.txt"), Err(VfsError::DiskNotWriteable(_))));
    assert!(matches!(registry.make_dir("/sys/lib"), Err(VfsError::DiskNotWriteable(_))));
    assert_eq!(
        std::fs::read_to_string(temp.path().join("keep.txt")).unwrap(),
        "keep"
    );
}
