/*!
 * VFS Traits
 * The capability contract every disk variant implements
 */

use super::disk::Disk;
use super::types::*;

/// Disk contract
///
/// Paths are relative to the disk root; a leading slash is accepted and
/// ignored. Reads of absent entries return `Ok(None)` rather than an error.
/// Writes on a read-only disk are accepted and dropped, while `make_dir` and
/// `delete` report [`VfsError::DiskNotWriteable`].
pub trait DiskOps: Send + Sync {
    /// Names of the entries directly inside `dir`
    fn list_names(&self, dir: &str) -> VfsResult<Vec<String>>;

    /// Metadata of a file or directory
    fn info(&self, path: &str) -> VfsResult<FileInfo>;

    /// Full file contents, `None` if the file is absent or a directory
    fn read_binary(&self, path: &str) -> VfsResult<Option<Vec<u8>>>;

    /// File contents decoded as UTF-8 (lossy)
    fn read_text(&self, path: &str) -> VfsResult<Option<String>> {
        Ok(self
            .read_binary(path)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Whether `path` exists, and as what
    fn exists(&self, path: &str) -> Option<EntryKind> {
        self.info(path).ok().map(|info| info.kind())
    }

    fn is_writeable(&self) -> bool;

    /// Create or replace a file
    fn write_binary(&self, path: &str, data: &[u8]) -> VfsResult<()>;

    fn write_text(&self, path: &str, text: &str) -> VfsResult<()> {
        self.write_binary(path, text.as_bytes())
    }

    /// Create a directory; its parent must exist on memory disks
    fn make_dir(&self, path: &str) -> VfsResult<()>;

    /// Delete a file or an empty directory
    fn delete(&self, path: &str) -> VfsResult<()>;

    /// New disk rooted at `path` of this one
    fn mount(&self, path: &str) -> VfsResult<Disk>;

    /// File contents split on `\r\n`, `\n` or `\r`
    fn read_lines(&self, path: &str) -> VfsResult<Option<Vec<String>>> {
        Ok(self.read_text(path)?.map(|text| split_lines(&text)))
    }

    /// Write `lines` joined with `\n`
    fn write_lines(&self, path: &str, lines: &[String]) -> VfsResult<()> {
        self.write_text(path, &lines.join("\n"))
    }
}

/// Split text on any of the three line terminators
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            }
            '\n' => lines.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    lines.push(current);
    lines
}
