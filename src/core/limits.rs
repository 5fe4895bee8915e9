/*!
 * System Limits and Constants
 *
 * Centralized location for reserved names, defaults and fixed formats.
 * Organized by domain for maintainability and discoverability.
 */

// =============================================================================
// DISK REGISTRY
// =============================================================================

/// Name of the bundled read-only archive disk
/// Never stored in the user table and cannot be replaced by `mount`
pub const SYSTEM_DISK_NAME: &str = "sys";

/// Default name of the disk backed by native storage
pub const DEFAULT_STORAGE_DISK: &str = "usr";

/// Default native storage root when nothing is configured
pub const DEFAULT_STORAGE_PATH: &str = "/tmp/script-vfs-storage";

/// In-memory disks created at startup
pub const DEFAULT_MEMORY_DISKS: &[&str] = &["tmp"];

// =============================================================================
// FILE INFO
// =============================================================================

/// Timestamp layout reported to scripts (`FileInfo.date`)
/// Mirrors the SQL `DATETIME` layout: `2024-01-31 23:59:00`
pub const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

// =============================================================================
// MODULE RESOLVER
// =============================================================================

/// Directories scanned for bare library names on reset
pub const DEFAULT_LIBRARY_DIRS: &[&str] = &["/sys/lib"];

/// Extension appended to library specifiers that lack one
pub const SCRIPT_EXTENSION: &str = "ms";

/// File stem tried when a library specifier names a directory
pub const LIBRARY_INDEX_STEM: &str = "index";

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Native storage root override
pub const ENV_STORAGE_PATH: &str = "SCRIPT_VFS_STORAGE";

/// Native storage disk name override
pub const ENV_STORAGE_DISK: &str = "SCRIPT_VFS_STORAGE_DISK";

/// Mount the native storage disk read-only (`1` / `true`)
pub const ENV_READONLY: &str = "SCRIPT_VFS_READONLY";

/// Path of the archive manifest JSON
pub const ENV_MANIFEST: &str = "SCRIPT_VFS_MANIFEST";

/// Directory archive resource locators are resolved against
pub const ENV_RESOURCES: &str = "SCRIPT_VFS_RESOURCES";

/// Emit JSON logs (`1` / `true`)
pub const ENV_TRACE_JSON: &str = "SCRIPT_VFS_TRACE_JSON";
