/*!
 * VFS File Info
 * Metadata reported for files and directories
 */

use super::file_type::EntryKind;
use crate::core::serde::{fixed_date, format_fixed_date};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::time::SystemTime;

/// File metadata as seen by scripts
///
/// Directories always carry a timestamp; files always carry their byte size.
/// The timestamp serializes as `date` in the fixed `YYYY-MM-DD HH:MM:SS` layout.
/// `size` is left out for directories only.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub is_directory: bool,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "date", with = "fixed_date")]
    pub modified_at: SystemTime,
    #[serde(default)]
    pub comment: String,
}

impl FileInfo {
    /// Info for a file of `size` bytes
    #[must_use]
    pub fn file(size: u64, modified_at: SystemTime) -> Self {
        Self {
            is_directory: false,
            size,
            modified_at,
            comment: String::new(),
        }
    }

    /// Info for a directory
    #[must_use]
    pub fn directory(modified_at: SystemTime) -> Self {
        Self {
            is_directory: true,
            size: 0,
            modified_at,
            comment: String::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        if self.is_directory {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// Timestamp in the fixed reporting format
    #[must_use]
    pub fn date(&self) -> String {
        format_fixed_date(self.modified_at)
    }
}

impl Serialize for FileInfo {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let fields = if self.is_directory { 3 } else { 4 };
        let mut state = serializer.serialize_struct("FileInfo", fields)?;
        state.serialize_field("isDirectory", &self.is_directory)?;
        if self.is_directory {
            state.skip_field("size")?;
        } else {
            state.serialize_field("size", &self.size)?;
        }
        state.serialize_field("date", &format_fixed_date(self.modified_at))?;
        state.serialize_field("comment", &self.comment)?;
        state.end()
    }
}
