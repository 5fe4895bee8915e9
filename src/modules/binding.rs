/*!
 * Import Bindings
 * Import requests and the name bindings they produce
 */

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::errors::{ImportError, ImportResult};
use super::scope::Exports;

/// Where an import reads from
#[derive(Debug, Clone)]
pub enum ImportSource<V> {
    /// Library specifier: absolute path, `./relative` path or bare name
    Library(String),
    /// An export table the script already holds
    Map(Exports<V>),
}

/// How a library is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Reuse the cached exports, loading once per path
    #[default]
    Cached,
    /// Run the module again, bypassing and never filling the cache
    Fresh,
    /// Bind deferred accessors; the load happens on first read
    Lazy,
}

/// One requested member, optionally renamed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSpec {
    pub name: String,
    pub alias: String,
}

impl MemberSpec {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

/// A single `import` call
///
/// With no members the whole module is bound under `alias`, or under the
/// library's default name. With members, each one is bound under its alias
/// and the whole module is additionally bound when `alias` is set.
///
/// The default name of a bare library name is the name as written
/// (`import Strings` binds `Strings`). A path binds under its file stem
/// without the extension: `/usr/lib/json.ms`, `./json` and `../lib/json` all
/// bind `json`. Specifiers without a stem, such as `./`, need an alias.
#[derive(Debug, Clone)]
pub struct ImportRequest<V> {
    pub source: ImportSource<V>,
    pub members: Vec<MemberSpec>,
    pub alias: Option<String>,
    pub mode: ImportMode,
}

impl<V> ImportRequest<V> {
    pub fn library(specifier: impl Into<String>) -> Self {
        Self {
            source: ImportSource::Library(specifier.into()),
            members: Vec::new(),
            alias: None,
            mode: ImportMode::Cached,
        }
    }

    pub fn map(exports: Exports<V>) -> Self {
        Self {
            source: ImportSource::Map(exports),
            members: Vec::new(),
            alias: None,
            mode: ImportMode::Cached,
        }
    }

    pub fn member(mut self, member: MemberSpec) -> Self {
        self.members.push(member);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }

    /// An alias used twice is a [`ImportError::DuplicateBinding`]
    pub(crate) fn check_aliases(&self) -> ImportResult<()> {
        let mut seen = std::collections::HashSet::with_capacity(self.members.len());
        for member in &self.members {
            if !seen.insert(member.alias.as_str()) {
                return Err(ImportError::DuplicateBinding(member.alias.clone()));
            }
        }
        Ok(())
    }
}

/// Deferred access to a member of a library that has not loaded yet
///
/// `member == None` stands for the whole module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LazyMember {
    pub path: String,
    pub member: Option<String>,
}

/// Value bound into the importer's scope
#[derive(Debug, Clone)]
pub enum Binding<V> {
    Value(V),
    Module(Exports<V>),
    Lazy(LazyMember),
}

impl<V> Binding<V> {
    pub fn as_module(&self) -> Option<&Exports<V>> {
        match self {
            Binding::Module(exports) => Some(exports),
            _ => None,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Binding::Lazy(_))
    }
}

/// Anything an import can bind names into (usually the caller's locals)
pub trait BindingTarget<V> {
    fn contains(&self, name: &str) -> bool;
    fn bind(&mut self, name: String, binding: Binding<V>);
}

impl<V> BindingTarget<V> for BTreeMap<String, Binding<V>> {
    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn bind(&mut self, name: String, binding: Binding<V>) {
        self.insert(name, binding);
    }
}

impl<V, S: BuildHasher> BindingTarget<V> for HashMap<String, Binding<V>, S> {
    fn contains(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn bind(&mut self, name: String, binding: Binding<V>) {
        self.insert(name, binding);
    }
}

/// Ordered name bindings produced by one import
#[derive(Debug, Clone)]
pub struct BindingSet<V> {
    entries: Vec<(String, Binding<V>)>,
}

impl<V> Default for BindingSet<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> BindingSet<V> {
    pub(crate) fn push(&mut self, name: impl Into<String>, binding: Binding<V>) -> ImportResult<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ImportError::DuplicateBinding(name));
        }
        self.entries.push((name, binding));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Binding<V>> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, binding)| binding)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind every entry into `target`
    ///
    /// Fails with [`ImportError::DuplicateBinding`] before binding anything if
    /// one of the names is already taken.
    pub fn bind_into<T: BindingTarget<V> + ?Sized>(self, target: &mut T) -> ImportResult<()> {
        if let Some(name) = self.names().find(|name| target.contains(name)) {
            return Err(ImportError::DuplicateBinding(name.to_string()));
        }
        for (name, binding) in self.entries {
            target.bind(name, binding);
        }
        Ok(())
    }
}

impl<V> IntoIterator for BindingSet<V> {
    type Item = (String, Binding<V>);
    type IntoIter = std::vec::IntoIter<(String, Binding<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
