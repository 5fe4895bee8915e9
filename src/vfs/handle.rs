/*!
 * Open File Handles
 * Buffered view of one file, flushed to its disk on close
 */

use tracing::{debug, warn};

use super::disk::Disk;
use super::traits::DiskOps;
use super::types::*;

/// An open file
///
/// The whole file lives in memory while the handle is open. Nothing reaches
/// the owning disk until [`OpenFile::close`]; dropping a dirty handle without
/// closing it discards the changes.
#[derive(Debug)]
pub struct OpenFile {
    disk: Disk,
    path: String,
    mode: OpenMode,
    buffer: Option<Vec<u8>>,
    cursor: usize,
    dirty: bool,
}

impl OpenFile {
    /// Open `path` on `disk`
    ///
    /// `r` and `r+` require the file to exist. Truncating modes start empty
    /// and dirty, so closing them always creates the file.
    pub fn open(disk: Disk, path: impl Into<String>, mode: OpenMode) -> VfsResult<Self> {
        let path = path.into();

        let buffer = if mode.truncates() {
            Vec::new()
        } else {
            match disk.read_binary(&path)? {
                Some(data) => data,
                None if mode.requires_existing() => return Err(VfsError::NotFound(path)),
                None => Vec::new(),
            }
        };

        let cursor = if mode.appends() { buffer.len() } else { 0 };
        debug!(path = %path, mode = %mode, size = buffer.len(), "File opened");

        Ok(Self {
            disk,
            path,
            mode,
            buffer: Some(buffer),
            cursor,
            dirty: mode.truncates(),
        })
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    #[inline]
    pub fn readable(&self) -> bool {
        self.mode.readable()
    }

    #[inline]
    pub fn writeable(&self) -> bool {
        self.mode.writeable()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.buffer.is_some()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True once the cursor has passed the last byte, or the handle is closed
    pub fn is_at_end(&self) -> bool {
        self.buffer
            .as_ref()
            .map_or(true, |buffer| self.cursor >= buffer.len())
    }

    pub fn position(&self) -> VfsResult<u64> {
        self.buffer()?;
        Ok(self.cursor as u64)
    }

    /// Move the cursor, clamped to the buffer length
    pub fn set_position(&mut self, position: u64) -> VfsResult<()> {
        let len = self.buffer()?.len();
        self.cursor = usize::try_from(position).unwrap_or(usize::MAX).min(len);
        Ok(())
    }

    /// Write UTF-8 text at the cursor
    ///
    /// Bytes under the cursor are overwritten and the buffer grows as needed;
    /// for truncating and append modes this is a plain append.
    pub fn write(&mut self, text: &str) -> VfsResult<()> {
        self.buffer()?;
        if text.is_empty() {
            return Ok(());
        }
        if !self.writeable() {
            return Err(VfsError::NotWriteable);
        }
        if !self.disk.is_writeable() {
            return Err(VfsError::DiskNotWriteable(self.disk.backend().to_string()));
        }

        let cursor = self.cursor;
        let buffer = self.buffer_mut()?;
        let bytes = text.as_bytes();
        let overlap = buffer.len().saturating_sub(cursor).min(bytes.len());
        buffer[cursor..cursor + overlap].copy_from_slice(&bytes[..overlap]);
        buffer.extend_from_slice(&bytes[overlap..]);

        self.cursor = cursor + bytes.len();
        self.dirty = true;
        Ok(())
    }

    pub fn write_line(&mut self, text: &str) -> VfsResult<()> {
        self.write(&format!("{}\n", text))
    }

    /// Everything from the cursor to the end
    pub fn read_to_end(&mut self) -> VfsResult<String> {
        self.check_readable()?;
        let buffer = self.buffer.as_deref().unwrap_or_default();
        let text = String::from_utf8_lossy(&buffer[self.cursor.min(buffer.len())..]).into_owned();
        self.cursor = buffer.len();
        Ok(text)
    }

    /// Next line without its terminator, `None` at the end of the buffer
    ///
    /// `\n`, `\r` and `\r\n` all terminate a line.
    pub fn read_line(&mut self) -> VfsResult<Option<String>> {
        self.check_readable()?;
        let buffer = self.buffer.as_deref().unwrap_or_default();
        let start = self.cursor;
        if start >= buffer.len() {
            return Ok(None);
        }

        let end = buffer[start..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
            .map_or(buffer.len(), |offset| start + offset);
        let line = String::from_utf8_lossy(&buffer[start..end]).into_owned();

        let mut next = end;
        if next < buffer.len() {
            next += if buffer[next] == b'\r' && buffer.get(next + 1) == Some(&b'\n') {
                2
            } else {
                1
            };
        }
        self.cursor = next;
        Ok(Some(line))
    }

    /// Next `count` characters (code points), `None` at the end of the buffer
    pub fn read_chars(&mut self, count: usize) -> VfsResult<Option<String>> {
        self.check_readable()?;
        let buffer = self.buffer.as_deref().unwrap_or_default();
        let start = self.cursor;
        if start >= buffer.len() {
            return Ok(None);
        }

        let mut end = start;
        let mut taken = 0;
        while end < buffer.len() && taken < count {
            end += 1;
            taken += 1;
            while end < buffer.len() && is_continuation(buffer[end]) {
                end += 1;
            }
        }

        let text = String::from_utf8_lossy(&buffer[start..end]).into_owned();
        self.cursor = end;
        Ok(Some(text))
    }

    /// Flush to the owning disk if anything changed, then invalidate
    pub fn close(&mut self) -> VfsResult<()> {
        let buffer = self.buffer()?;
        if self.writeable() && self.dirty {
            self.disk.write_binary(&self.path, buffer)?;
            debug!(path = %self.path, size = buffer.len(), "File flushed on close");
        }
        self.buffer = None;
        self.dirty = false;
        Ok(())
    }

    fn buffer(&self) -> VfsResult<&Vec<u8>> {
        self.buffer.as_ref().ok_or(VfsError::HandleClosed)
    }

    fn buffer_mut(&mut self) -> VfsResult<&mut Vec<u8>> {
        self.buffer.as_mut().ok_or(VfsError::HandleClosed)
    }

    fn check_readable(&self) -> VfsResult<()> {
        self.buffer()?;
        if !self.readable() {
            return Err(VfsError::NotReadable);
        }
        Ok(())
    }
}

/// UTF-8 continuation bytes look like `0b10xx_xxxx`
#[inline]
fn is_continuation(byte: u8) -> bool {
    (byte & 0xC0) == 0x80
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        if self.buffer.is_some() && self.dirty && self.writeable() {
            warn!(path = %self.path, "Open file dropped with unsaved changes");
        }
    }
}
