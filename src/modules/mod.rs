/*!
 * Modules
 * Script library resolution and loading on top of the disk registry
 */

pub mod binding;
pub mod errors;
mod library;
pub mod resolver;
pub mod scope;

pub use binding::{
    Binding, BindingSet, BindingTarget, ImportMode, ImportRequest, ImportSource, LazyMember,
    MemberSpec,
};
pub use errors::{ImportError, ImportResult};
pub use resolver::{
    Completion, ImportStep, ModuleCompiler, ModuleOutcome, ModuleResolver, PendingLoad, Step,
    Ticket,
};
pub use scope::{ExportTable, Exports, ModuleScope};
