/*!
 * Library Index
 * Bare library names and verified library files
 */

use ahash::RandomState;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::errors::{ImportError, ImportResult};
use crate::config::ResolverConfig;
use crate::vfs::{paths, DiskRegistry, EntryKind};

/// Name table plus the set of paths already confirmed to be files
#[derive(Debug, Default)]
pub(crate) struct LibraryIndex {
    names: HashMap<String, String, RandomState>,
    verified: HashSet<String, RandomState>,
}

impl LibraryIndex {
    pub fn clear(&mut self) {
        self.names.clear();
        self.verified.clear();
    }

    /// Register every file found directly under the configured library
    /// directories, keyed by its lower-cased stem
    ///
    /// A missing directory is logged and skipped. The first file to claim a
    /// name keeps it.
    pub fn populate(&mut self, registry: &DiskRegistry, config: &ResolverConfig) {
        for dir in &config.library_dirs {
            let children = match registry.children(dir) {
                Ok(children) => children,
                Err(e) => {
                    warn!(dir = %dir, error = %e, "Library directory unavailable");
                    continue;
                }
            };

            for child in children {
                let path = paths::combine(dir, &child);
                if registry.exists(&path) != Some(EntryKind::File) {
                    continue;
                }
                let name = strip_extension(paths::file_name(&path), &config.extension).to_lowercase();
                if let Some(existing) = self.names.get(&name) {
                    debug!(library = %name, kept = %existing, skipped = %path, "Library name already taken");
                    continue;
                }
                self.names.insert(name, path);
            }
        }
        debug!(count = self.names.len(), "Library table populated");
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn define(&mut self, name: &str, path: String) -> ImportResult<()> {
        let name = name.to_lowercase();
        if self.names.contains_key(&name) {
            return Err(ImportError::DuplicateLibrary(name));
        }
        debug!(library = %name, path = %path, "Library defined");
        self.names.insert(name, path);
        Ok(())
    }

    /// Sorted `(name, path)` pairs
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .names
            .iter()
            .map(|(name, path)| (name.clone(), path.clone()))
            .collect();
        entries.sort();
        entries
    }

    /// Library file behind `path`: `<path>.ms` first, then `<path>/index.ms`
    ///
    /// When neither exists the error for the first candidate is returned.
    pub fn resolve_file(
        &mut self,
        registry: &DiskRegistry,
        config: &ResolverConfig,
        path: &str,
    ) -> ImportResult<String> {
        match self.verify(registry, config, path) {
            Ok(file) => Ok(file),
            Err(first) => {
                let index = paths::combine(path, &config.index_stem);
                self.verify(registry, config, &index).map_err(|_| first)
            }
        }
    }

    fn verify(
        &mut self,
        registry: &DiskRegistry,
        config: &ResolverConfig,
        path: &str,
    ) -> ImportResult<String> {
        let mut file = paths::resolve_absolute(path)?;
        let suffix = format!(".{}", config.extension);
        if !file.ends_with(&suffix) {
            file.push_str(&suffix);
        }

        if self.verified.contains(&file) {
            return Ok(file);
        }
        match registry.exists(&file) {
            Some(EntryKind::File) => {
                self.verified.insert(file.clone());
                Ok(file)
            }
            _ => Err(ImportError::NotFound(file)),
        }
    }
}

/// `name` without a trailing `.<extension>`
pub(crate) fn strip_extension<'a>(name: &'a str, extension: &str) -> &'a str {
    name.strip_suffix(extension)
        .and_then(|stem| stem.strip_suffix('.'))
        .unwrap_or(name)
}
