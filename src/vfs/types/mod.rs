/*!
 * VFS Types
 * Shared types for disk operations
 */

mod errors;
mod file_info;
mod file_type;
mod open_mode;

pub use errors::{ErrorKind, VfsError, VfsResult};
pub use file_info::FileInfo;
pub use file_type::EntryKind;
pub use open_mode::OpenMode;
