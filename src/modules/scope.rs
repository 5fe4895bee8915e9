/*!
 * Module Scope
 * Export tables and the per-load context a module runs with
 */

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::{ImportError, ImportResult};
use crate::vfs::paths;

/// Shared handle to a module's exports
///
/// Cloning aliases the same table; two handles are the same module value
/// exactly when [`Arc::ptr_eq`] holds.
pub type Exports<V> = Arc<ExportTable<V>>;

/// Named values a module makes available to importers
#[derive(Debug)]
pub struct ExportTable<V> {
    members: RwLock<BTreeMap<String, V>>,
}

impl<V: Clone> ExportTable<V> {
    pub fn new() -> Self {
        Self {
            members: RwLock::new(BTreeMap::new()),
        }
    }

    /// Wrap a set of bindings as a shared table
    pub fn shared(members: BTreeMap<String, V>) -> Exports<V> {
        Arc::new(Self {
            members: RwLock::new(members),
        })
    }

    pub fn get(&self, name: &str) -> Option<V> {
        self.members.read().get(name).cloned()
    }

    /// Insert or replace a member
    pub fn set(&self, name: impl Into<String>, value: V) {
        self.members.write().insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.members.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    /// Independent copy of the current members
    pub fn snapshot(&self) -> Exports<V> {
        Self::shared(self.members.read().clone())
    }
}

/// Context handed to the runtime together with a compiled module
///
/// Holds what a module can ask about itself (`dirname`, `filename`, whether it
/// is being fresh-imported) and collects its explicit exports.
#[derive(Debug)]
pub struct ModuleScope<V> {
    filename: String,
    dirname: String,
    fresh: bool,
    exports: Option<Exports<V>>,
}

impl<V: Clone> ModuleScope<V> {
    pub fn new(filename: impl Into<String>, fresh: bool) -> Self {
        let filename = filename.into();
        let dirname = paths::parent(&filename);
        Self {
            filename,
            dirname,
            fresh,
            exports: None,
        }
    }

    /// Directory containing the module; relative imports resolve against it
    #[inline]
    pub fn dirname(&self) -> &str {
        &self.dirname
    }

    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[inline]
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Explicit exports, `None` until the module exports something
    pub fn exports(&self) -> Option<&Exports<V>> {
        self.exports.as_ref()
    }

    /// Export `value` under `name`
    ///
    /// Exporting a name twice fails with [`ImportError::DuplicateExport`]
    /// unless `force` is set.
    pub fn export(&mut self, name: &str, value: V, force: bool) -> ImportResult<()> {
        let table = self.exports.get_or_insert_with(|| Arc::new(ExportTable::new()));
        if !force && table.contains(name) {
            return Err(ImportError::DuplicateExport(name.to_string()));
        }
        table.set(name, value);
        Ok(())
    }

    /// Fail unless the module's fresh-import status equals `required`
    pub fn ensure_fresh(&self, required: bool) -> ImportResult<()> {
        if self.fresh == required {
            return Ok(());
        }
        Err(ImportError::FreshnessMismatch {
            path: self.filename.clone(),
            required,
        })
    }

    /// Export value of the finished module
    ///
    /// Explicit exports win; a module that exported nothing exposes its
    /// top-level bindings instead.
    pub(crate) fn into_exports(self, bindings: BTreeMap<String, V>) -> Exports<V> {
        match self.exports {
            Some(exports) => exports,
            None => ExportTable::shared(bindings),
        }
    }
}
