/*!
 * Virtual Paths
 * Forward-slash path algebra shared by every disk and the registry
 */

use super::types::{VfsError, VfsResult};

/// Path separator used by every virtual path
pub const SEPARATOR: char = '/';

/// Split a path into its non-empty segments
///
/// `"/usr//a/"` yields `["usr", "a"]`. No `.`/`..` handling happens here.
#[inline]
pub fn segments(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Collapse `.` and `..` segments
///
/// Absolute inputs keep their leading slash (`"/a/.."` collapses to `"/"`),
/// relative inputs stay relative. A `..` with nothing left to pop is an
/// [`VfsError::InvalidPath`]. Pure: no I/O.
pub fn collapse(path: &str) -> VfsResult<String> {
    let mut parts: Vec<&str> = Vec::with_capacity(8);

    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(VfsError::InvalidPath(path.to_string()));
                }
            }
            name => parts.push(name),
        }
    }

    let joined = parts.join("/");
    if is_absolute(path) {
        Ok(format!("/{}", joined))
    } else {
        Ok(joined)
    }
}

/// Require an absolute path, then collapse it
pub fn resolve_absolute(path: &str) -> VfsResult<String> {
    if !is_absolute(path) {
        return Err(VfsError::UnsupportedRelativePath(path.to_string()));
    }
    collapse(path)
}

/// Resolve `path` against the directory `curdir`, then collapse
pub fn resolve_relative(curdir: &str, path: &str) -> VfsResult<String> {
    collapse(&combine(curdir, path))
}

/// Join two paths with a forward slash
///
/// An absolute `sub` replaces `base` entirely; empty operands are skipped.
pub fn combine(base: &str, sub: &str) -> String {
    if sub.is_empty() {
        return base.to_string();
    }
    if base.is_empty() || is_absolute(sub) {
        return sub.to_string();
    }
    if base.ends_with(SEPARATOR) {
        format!("{}{}", base, sub)
    } else {
        format!("{}/{}", base, sub)
    }
}

/// Last segment of a path, or `""` for the root
pub fn file_name(path: &str) -> &str {
    path.trim_end_matches(SEPARATOR)
        .rsplit(SEPARATOR)
        .next()
        .unwrap_or("")
}

/// Parent directory of a path
///
/// Top-level entries such as `/usr` have `/` as their parent; the root is its
/// own parent. Relative single-segment paths have an empty parent.
pub fn parent(path: &str) -> String {
    let trimmed = path.trim_end_matches(SEPARATOR);
    match trimmed.rfind(SEPARATOR) {
        Some(0) => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
        None if is_absolute(path) => "/".to_string(),
        None => String::new(),
    }
}

#[inline]
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(SEPARATOR)
}
