/*!
 * VFS Open Modes
 * The seven script-visible modes and their capability matrix
 */

use super::errors::VfsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File open mode
///
/// | mode  | readable | writeable | truncates      | requires-exists |
/// |-------|----------|-----------|----------------|-----------------|
/// | `r`   | yes      | no        | no             | yes             |
/// | `r+`  | yes      | yes       | no             | yes             |
/// | `w`   | no       | yes       | yes            | no              |
/// | `w+`  | yes      | yes       | yes            | no              |
/// | `rw+` | yes      | yes       | no             | no              |
/// | `a`   | no       | yes       | no (preloads)  | no              |
/// | `a+`  | yes      | yes       | no (preloads)  | no              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenMode {
    #[serde(rename = "r")]
    Read,
    #[serde(rename = "r+")]
    ReadWriteExisting,
    #[serde(rename = "w")]
    WriteTruncate,
    #[serde(rename = "w+")]
    ReadWriteTruncate,
    #[serde(rename = "rw+")]
    ReadWriteCreate,
    #[serde(rename = "a")]
    Append,
    #[serde(rename = "a+")]
    AppendRead,
}

impl OpenMode {
    #[inline]
    #[must_use]
    pub const fn readable(self) -> bool {
        !matches!(self, OpenMode::WriteTruncate | OpenMode::Append)
    }

    #[inline]
    #[must_use]
    pub const fn writeable(self) -> bool {
        !matches!(self, OpenMode::Read)
    }

    /// Existing content is discarded
    #[inline]
    #[must_use]
    pub const fn truncates(self) -> bool {
        matches!(self, OpenMode::WriteTruncate | OpenMode::ReadWriteTruncate)
    }

    /// Opening fails when the file is absent
    #[inline]
    #[must_use]
    pub const fn requires_existing(self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::ReadWriteExisting)
    }

    /// Cursor starts after the preloaded content
    #[inline]
    #[must_use]
    pub const fn appends(self) -> bool {
        matches!(self, OpenMode::Append | OpenMode::AppendRead)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OpenMode::Read => "r",
            OpenMode::ReadWriteExisting => "r+",
            OpenMode::WriteTruncate => "w",
            OpenMode::ReadWriteTruncate => "w+",
            OpenMode::ReadWriteCreate => "rw+",
            OpenMode::Append => "a",
            OpenMode::AppendRead => "a+",
        }
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::ReadWriteCreate
    }
}

impl FromStr for OpenMode {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = s.to_ascii_lowercase();
        if mode.contains('b') {
            return Err(VfsError::InvalidMode("binary mode not supported".into()));
        }
        match mode.as_str() {
            "r" => Ok(OpenMode::Read),
            "r+" => Ok(OpenMode::ReadWriteExisting),
            "w" => Ok(OpenMode::WriteTruncate),
            "w+" => Ok(OpenMode::ReadWriteTruncate),
            "rw+" => Ok(OpenMode::ReadWriteCreate),
            "a" => Ok(OpenMode::Append),
            "a+" => Ok(OpenMode::AppendRead),
            _ => Err(VfsError::InvalidMode(format!("unknown mode '{}'", s))),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
