/*!
 * Sandboxed Native Resolution
 * Maps virtual paths onto a host directory without ever leaving it
 */

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::paths;
use super::types::{VfsError, VfsResult};

/// What kind of entry a resolution expects to land on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Any,
    File,
    Directory,
}

/// Resolve `relative` under `base` for reading
///
/// `Ok(None)` means the entry does not exist. Hard failures (escaping the
/// sandbox, uncollapsible input) are errors.
pub fn read_path(base: &Path, relative: &str, mode: ResolveMode) -> VfsResult<Option<PathBuf>> {
    let relative = paths::collapse(relative)?;
    match resolve_under_sandbox(base, &relative, mode, false)? {
        Some(resolved) => ensure_descendant(base, resolved).map(Some),
        None => Ok(None),
    }
}

/// Resolve `relative` under `base` for writing
///
/// Missing entries are created on the way: the final segment becomes an empty
/// file when `directory` is false, every missing segment becomes a directory
/// when it is true.
pub fn write_path(base: &Path, relative: &str, directory: bool) -> VfsResult<PathBuf> {
    let relative = paths::collapse(relative)?;
    let mode = if directory {
        ResolveMode::Directory
    } else {
        ResolveMode::File
    };
    match resolve_under_sandbox(base, &relative, mode, true)? {
        Some(resolved) => ensure_descendant(base, resolved),
        None => Err(VfsError::NotFound(relative)),
    }
}

/// Walk `path` segment by segment against the real entries of `base`
///
/// Names are matched case-insensitively, preferring an exact match when the
/// host is case-sensitive and holds both spellings.
pub fn resolve_under_sandbox(
    base: &Path,
    path: &str,
    mode: ResolveMode,
    write: bool,
) -> VfsResult<Option<PathBuf>> {
    let parts = paths::segments(path);
    if parts.is_empty() {
        if mode == ResolveMode::File {
            return Err(VfsError::IsADirectory(format!(
                "tried to read root folder as a file: {}",
                base.display()
            )));
        }
        return Ok(Some(base.to_path_buf()));
    }

    // Writes create entries as they walk, so every step must stay inside
    let canonical_base = if write {
        Some(canonical(base)?)
    } else {
        None
    };

    let mut current = base.to_path_buf();
    let last = parts.len() - 1;

    for (i, part) in parts.iter().enumerate() {
        if matches!(*part, "." | "..") || part.trim().is_empty() {
            return Err(VfsError::InvalidPath(format!("path is not collapsed: {}", path)));
        }

        match find_entry(&current, part)? {
            Some(found) => {
                let is_dir = found.is_dir();
                if !is_dir && (mode == ResolveMode::Directory || i != last) {
                    if write {
                        return Err(VfsError::NotADirectory(format!(
                            "can't resolve path {} on {}",
                            path,
                            current.display()
                        )));
                    }
                    return Ok(None);
                }
                if let Some(root) = &canonical_base {
                    if !canonical(&found)?.starts_with(root) {
                        return Err(VfsError::SandboxEscape(found.display().to_string()));
                    }
                }
                current = found;
            }
            None if !write => return Ok(None),
            None => {
                let target = current.join(part);
                if i == last && mode == ResolveMode::File {
                    fs::OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(false)
                        .open(&target)
                        .map_err(|e| VfsError::from_io(e, format!("create {}", target.display())))?;
                    debug!(path = %target.display(), "Created file in sandbox");
                } else if mode == ResolveMode::Directory {
                    fs::create_dir(&target)
                        .map_err(|e| VfsError::from_io(e, format!("mkdir {}", target.display())))?;
                    debug!(path = %target.display(), "Created directory in sandbox");
                } else {
                    return Err(VfsError::NotFound(format!(
                        "missing directory {} while writing {}",
                        part, path
                    )));
                }
                current = target;
            }
        }
    }

    Ok(Some(current))
}

/// Look up `name` among the entries of `dir`, ignoring case
fn find_entry(dir: &Path, name: &str) -> VfsResult<Option<PathBuf>> {
    let exact = dir.join(name);
    if exact.exists() {
        return Ok(Some(exact));
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(VfsError::from_io(e, format!("list {}", dir.display()))),
    };

    let wanted = name.to_lowercase();
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().to_lowercase() == wanted {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

fn canonical(path: &Path) -> VfsResult<PathBuf> {
    path.canonicalize()
        .map_err(|e| VfsError::from_io(e, format!("canonicalize {}", path.display())))
}

/// Reject anything that canonicalizes outside of `base`
fn ensure_descendant(base: &Path, resolved: PathBuf) -> VfsResult<PathBuf> {
    let canonical_base = canonical(base)?;
    let resolved_canonical = canonical(&resolved)?;

    if resolved_canonical.starts_with(&canonical_base) {
        Ok(resolved_canonical)
    } else {
        Err(VfsError::SandboxEscape(resolved.display().to_string()))
    }
}
