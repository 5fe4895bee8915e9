/*!
 * Import Errors
 * Failures raised while resolving, loading and binding script modules
 */

use miette::Diagnostic;
use thiserror::Error;

use crate::vfs::{ErrorKind, VfsError};

/// Module operation result
#[must_use = "import operations can fail and must be handled"]
pub type ImportResult<T> = Result<T, ImportError>;

/// Import errors
///
/// Each one aborts the current load only; it reaches the script as a
/// catchable failure carrying the `Display` message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ImportError {
    #[error("Library {0} is not found")]
    #[diagnostic(
        code(import::not_found),
        help("Use an absolute path, a ./relative path, or a registered library name.")
    )]
    NotFound(String),

    #[error("Circular reference detected while importing \"{0}\"")]
    #[diagnostic(code(import::circular), help("use a lazy import to break the cycle"))]
    CircularImport(String),

    #[error("Can't import missing member {member} from {path}")]
    #[diagnostic(
        code(import::missing_member),
        help("The module does not export this name. Check its export calls.")
    )]
    MissingMember { path: String, member: String },

    #[error("Can't import into conflicting member {0}")]
    #[diagnostic(
        code(import::duplicate_binding),
        help("Pick a different alias for one of the imports.")
    )]
    DuplicateBinding(String),

    #[error("Member with name {0} is already exported")]
    #[diagnostic(
        code(import::duplicate_export),
        help("Pass force to replace an existing export.")
    )]
    DuplicateExport(String),

    #[error("Library {0} is already defined")]
    #[diagnostic(code(import::duplicate_library))]
    DuplicateLibrary(String),

    #[error("No alias or imported members are defined")]
    #[diagnostic(
        code(import::missing_binding_name),
        help("Import specific members or give the module an alias.")
    )]
    MissingBindingName,

    #[error("File '{path}' {}", freshness_message(.required))]
    #[diagnostic(code(import::freshness))]
    FreshnessMismatch { path: String, required: bool },

    #[error("Resumed load {ticket} is not the innermost pending load")]
    #[diagnostic(
        code(import::unexpected_resume),
        help("Nested loads must be resumed in the reverse order they were started.")
    )]
    UnexpectedResume { ticket: u64 },

    #[error("Failed to compile {path}: {message}")]
    #[diagnostic(code(import::compile))]
    Compile { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(code(import::vfs))]
    Vfs(#[from] VfsError),
}

impl ImportError {
    /// Filesystem class of the underlying error, if it came from a disk
    #[must_use]
    pub fn vfs_kind(&self) -> Option<ErrorKind> {
        match self {
            ImportError::Vfs(e) => Some(e.kind()),
            _ => None,
        }
    }
}

fn freshness_message(required: &bool) -> &'static str {
    if *required {
        "can only be fresh-imported"
    } else {
        "can't be fresh-imported"
    }
}
