/*!
 * VFS Entry Kind
 * Distinguishes files from directories in existence checks and listings
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an existing disk entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    #[inline]
    #[must_use]
    pub const fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    #[inline]
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self, EntryKind::File)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}
