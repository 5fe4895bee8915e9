/*!
 * Module Resolver
 * Library lookup, caching and the two-phase load protocol
 */

use ahash::RandomState;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info, warn};

use super::binding::{
    Binding, BindingSet, ImportMode, ImportRequest, ImportSource, LazyMember, MemberSpec,
};
use super::errors::{ImportError, ImportResult};
use super::library::{strip_extension, LibraryIndex};
use super::scope::{Exports, ModuleScope};
use crate::config::ResolverConfig;
use crate::vfs::{paths, DiskRegistry};

/// Turns module source into something the runtime can execute
pub trait ModuleCompiler {
    /// Compiled, reusable form of one module
    type Unit: Clone;
    /// Runtime value stored in export tables
    type Value: Clone;

    fn compile(&mut self, source: &str, origin: &str) -> Result<Self::Unit, String>;
}

/// Identifies one suspended load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Finished import
#[derive(Debug, Clone)]
pub enum Completion<V> {
    /// Names to bind into the importer's scope
    Bound(BindingSet<V>),
    /// Value a lazy accessor stands for
    Member(Binding<V>),
}

impl<V> Completion<V> {
    pub fn into_bindings(self) -> Option<BindingSet<V>> {
        match self {
            Completion::Bound(bindings) => Some(bindings),
            Completion::Member(_) => None,
        }
    }

    pub fn into_member(self) -> Option<Binding<V>> {
        match self {
            Completion::Member(binding) => Some(binding),
            Completion::Bound(_) => None,
        }
    }
}

/// A module the runtime has to execute before the import can finish
///
/// The runtime runs `unit` as a nested call with `scope` available to it,
/// then hands both back through [`ModuleResolver::resume`] with the same
/// ticket.
#[derive(Debug)]
pub struct PendingLoad<U, V> {
    pub ticket: Ticket,
    pub path: String,
    pub unit: U,
    pub scope: ModuleScope<V>,
}

/// Result of an import step
#[derive(Debug)]
pub enum ImportStep<U, V> {
    Ready(Completion<V>),
    Pending(PendingLoad<U, V>),
}

/// What the nested call produced
#[derive(Debug)]
pub struct ModuleOutcome<V> {
    pub scope: ModuleScope<V>,
    /// Top-level bindings, used as exports when the module exported nothing
    pub bindings: BTreeMap<String, V>,
}

impl<V> ModuleOutcome<V> {
    pub fn new(scope: ModuleScope<V>) -> Self {
        Self {
            scope,
            bindings: BTreeMap::new(),
        }
    }
}

/// Step type for a given compiler
pub type Step<C> = ImportStep<<C as ModuleCompiler>::Unit, <C as ModuleCompiler>::Value>;

/// Work left once a suspended load comes back
#[derive(Debug)]
enum Continuation {
    Bind {
        members: Vec<MemberSpec>,
        alias: Option<String>,
        default_name: Option<String>,
    },
    Member(Option<String>),
}

#[derive(Debug)]
struct PendingFrame {
    ticket: Ticket,
    path: String,
    fresh: bool,
    continuation: Continuation,
}

/// Resolves, loads and caches script modules
///
/// All state lives here: the export cache, the compiled unit cache, the
/// library table and the stack of loads in flight. The runtime drives loads
/// in two phases: [`import`](Self::import) either completes immediately or
/// returns a [`PendingLoad`], and the runtime later calls
/// [`resume`](Self::resume) with what the module produced. Loads nest, and
/// must be resumed innermost first.
pub struct ModuleResolver<C: ModuleCompiler> {
    registry: DiskRegistry,
    config: ResolverConfig,
    compiler: C,
    libraries: LibraryIndex,
    units: HashMap<String, C::Unit, RandomState>,
    exports: HashMap<String, Exports<C::Value>, RandomState>,
    frames: Vec<PendingFrame>,
    next_ticket: u64,
}

impl<C: ModuleCompiler> ModuleResolver<C> {
    pub fn new(registry: DiskRegistry, config: ResolverConfig, compiler: C) -> Self {
        let mut resolver = Self {
            registry,
            config,
            compiler,
            libraries: LibraryIndex::default(),
            units: HashMap::default(),
            exports: HashMap::default(),
            frames: Vec::new(),
            next_ticket: 1,
        };
        resolver.libraries.populate(&resolver.registry, &resolver.config);
        resolver
    }

    #[inline]
    pub fn registry(&self) -> &DiskRegistry {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    #[inline]
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// No load is suspended
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.frames.is_empty()
    }

    /// Paths currently mid-load, outermost first
    pub fn in_flight(&self) -> Vec<&str> {
        self.frames.iter().map(|frame| frame.path.as_str()).collect()
    }

    /// Cached exports of a canonical library path
    pub fn cached(&self, path: &str) -> Option<Exports<C::Value>> {
        self.exports.get(path).cloned()
    }

    /// Registered library names and their paths, sorted by name
    pub fn libraries(&self) -> Vec<(String, String)> {
        self.libraries.entries()
    }

    /// Canonical path of a library specifier
    ///
    /// `/abs` and `./rel` (or `../rel`, against `caller_dir`) go through
    /// [`resolve_library_file`](Self::resolve_library_file); anything else is
    /// a case-insensitive library name.
    pub fn find_library(&mut self, specifier: &str, caller_dir: &str) -> ImportResult<String> {
        if paths::is_absolute(specifier) {
            return self.resolve_library_file(specifier);
        }
        if specifier.starts_with("./") || specifier.starts_with("../") {
            return self.resolve_library_file(&paths::combine(caller_dir, specifier));
        }
        self.libraries
            .get(specifier)
            .map(str::to_string)
            .ok_or_else(|| ImportError::NotFound(specifier.to_string()))
    }

    /// Verified library file for an absolute path (`<path>.ms`, then `<path>/index.ms`)
    pub fn resolve_library_file(&mut self, path: &str) -> ImportResult<String> {
        self.libraries.resolve_file(&self.registry, &self.config, path)
    }

    /// Register `name` for the library `specifier` resolves to
    pub fn define_library(&mut self, name: &str, specifier: &str, caller_dir: &str) -> ImportResult<()> {
        let path = self.find_library(specifier, caller_dir)?;
        self.libraries.define(name, path)
    }

    /// Start an import from a module living in `caller_dir`
    pub fn import(
        &mut self,
        request: ImportRequest<C::Value>,
        caller_dir: &str,
    ) -> ImportResult<Step<C>> {
        request.check_aliases()?;
        let ImportRequest {
            source,
            members,
            alias,
            mode,
        } = request;

        let specifier = match source {
            ImportSource::Map(exports) => {
                let exports = if mode == ImportMode::Fresh {
                    exports.snapshot()
                } else {
                    exports
                };
                let bindings = bind(&members, alias.as_deref(), None, |member| {
                    member_of(&exports, "map", member)
                })?;
                return Ok(ImportStep::Ready(Completion::Bound(bindings)));
            }
            ImportSource::Library(specifier) => specifier,
        };

        let path = self.find_library(&specifier, caller_dir)?;
        let default_name = self.default_name(&specifier);

        if mode != ImportMode::Fresh {
            if let Some(exports) = self.exports.get(&path) {
                debug!(path = %path, "Import served from cache");
                let bindings = bind(&members, alias.as_deref(), default_name.as_deref(), |member| {
                    member_of(exports, &path, member)
                })?;
                return Ok(ImportStep::Ready(Completion::Bound(bindings)));
            }
            if mode == ImportMode::Lazy {
                debug!(path = %path, "Lazy import deferred");
                let bindings = bind(&members, alias.as_deref(), default_name.as_deref(), |member| {
                    Ok(Binding::Lazy(LazyMember {
                        path: path.clone(),
                        member: member.map(str::to_string),
                    }))
                })?;
                return Ok(ImportStep::Ready(Completion::Bound(bindings)));
            }
        }

        self.begin_load(
            path,
            mode == ImportMode::Fresh,
            Continuation::Bind {
                members,
                alias,
                default_name,
            },
        )
    }

    /// Read a deferred accessor, loading its library on first use
    pub fn read_lazy(&mut self, lazy: &LazyMember) -> ImportResult<Step<C>> {
        if let Some(exports) = self.exports.get(&lazy.path) {
            let binding = member_of(exports, &lazy.path, lazy.member.as_deref())?;
            return Ok(ImportStep::Ready(Completion::Member(binding)));
        }
        self.begin_load(
            lazy.path.clone(),
            false,
            Continuation::Member(lazy.member.clone()),
        )
    }

    /// Finish the innermost suspended load with what its module produced
    pub fn resume(
        &mut self,
        ticket: Ticket,
        outcome: ModuleOutcome<C::Value>,
    ) -> ImportResult<Completion<C::Value>> {
        let frame = self.pop_frame(ticket)?;
        let exports = outcome.scope.into_exports(outcome.bindings);
        if !frame.fresh {
            self.exports.insert(frame.path.clone(), exports.clone());
        }
        info!(
            path = %frame.path,
            ticket = %ticket,
            fresh = frame.fresh,
            exports = exports.len(),
            "Module loaded"
        );

        match frame.continuation {
            Continuation::Bind {
                members,
                alias,
                default_name,
            } => bind(&members, alias.as_deref(), default_name.as_deref(), |member| {
                member_of(&exports, &frame.path, member)
            })
            .map(Completion::Bound),
            Continuation::Member(member) => {
                member_of(&exports, &frame.path, member.as_deref()).map(Completion::Member)
            }
        }
    }

    /// Drop the innermost suspended load after its module failed
    pub fn fail(&mut self, ticket: Ticket) -> ImportResult<()> {
        let frame = self.pop_frame(ticket)?;
        warn!(path = %frame.path, ticket = %ticket, "Module load failed");
        Ok(())
    }

    /// Discard every suspended load
    ///
    /// Called when the runtime aborts a script mid-import. The paths that were
    /// in flight become importable again.
    pub fn abort_pending(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        warn!(
            pending = self.frames.len(),
            paths = ?self.in_flight(),
            "Aborting pending module loads"
        );
        self.frames.clear();
    }

    /// Clear every cache and re-scan the library directories
    pub fn reset(&mut self) {
        self.abort_pending();
        self.units.clear();
        self.exports.clear();
        self.libraries.clear();
        self.libraries.populate(&self.registry, &self.config);
        info!(libraries = self.libraries.entries().len(), "Module resolver reset");
    }

    fn begin_load(
        &mut self,
        path: String,
        fresh: bool,
        continuation: Continuation,
    ) -> ImportResult<Step<C>> {
        if self.frames.iter().any(|frame| frame.path == path) {
            warn!(path = %path, in_flight = ?self.in_flight(), "Circular import");
            return Err(ImportError::CircularImport(path));
        }

        let unit = self.compile(&path)?;
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;

        self.frames.push(PendingFrame {
            ticket,
            path: path.clone(),
            fresh,
            continuation,
        });
        debug!(
            path = %path,
            ticket = %ticket,
            fresh,
            depth = self.frames.len(),
            "Module load started"
        );

        Ok(ImportStep::Pending(PendingLoad {
            ticket,
            scope: ModuleScope::new(path.clone(), fresh),
            path,
            unit,
        }))
    }

    fn compile(&mut self, path: &str) -> ImportResult<C::Unit> {
        if let Some(unit) = self.units.get(path) {
            return Ok(unit.clone());
        }

        let source = self
            .registry
            .read_text(path)?
            .ok_or_else(|| ImportError::NotFound(path.to_string()))?;
        let unit = self
            .compiler
            .compile(&source, path)
            .map_err(|message| ImportError::Compile {
                path: path.to_string(),
                message,
            })?;

        debug!(path = %path, bytes = source.len(), "Module compiled");
        self.units.insert(path.to_string(), unit.clone());
        Ok(unit)
    }

    fn pop_frame(&mut self, ticket: Ticket) -> ImportResult<PendingFrame> {
        let unexpected = ImportError::UnexpectedResume { ticket: ticket.get() };
        if self.frames.last().map(|frame| frame.ticket) != Some(ticket) {
            return Err(unexpected);
        }
        self.frames.pop().ok_or(unexpected)
    }

    /// Name a whole-module import binds to without an alias
    ///
    /// Bare names bind as written; paths bind under their file stem.
    fn default_name(&self, specifier: &str) -> Option<String> {
        let name = if specifier.contains(paths::SEPARATOR) {
            strip_extension(paths::file_name(specifier), &self.config.extension)
        } else {
            specifier
        };
        (!name.is_empty() && name != "." && name != "..").then(|| name.to_string())
    }
}

impl<C: ModuleCompiler> fmt::Debug for ModuleResolver<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ModuleResolver")
            .field("libraries", &self.libraries.entries().len())
            .field("cached", &self.exports.len())
            .field("compiled", &self.units.len())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Bindings for one import
///
/// With no members the whole module is bound under `alias` or
/// `default_name`; otherwise every member is bound under its alias, plus the
/// whole module under `alias` if one was given.
fn bind<V, F>(
    members: &[MemberSpec],
    alias: Option<&str>,
    default_name: Option<&str>,
    source: F,
) -> ImportResult<BindingSet<V>>
where
    F: Fn(Option<&str>) -> ImportResult<Binding<V>>,
{
    let mut bindings = BindingSet::default();
    if members.is_empty() {
        let name = alias.or(default_name).ok_or(ImportError::MissingBindingName)?;
        bindings.push(name, source(None)?)?;
        return Ok(bindings);
    }

    for member in members {
        bindings.push(member.alias.as_str(), source(Some(&member.name))?)?;
    }
    if let Some(alias) = alias {
        bindings.push(alias, source(None)?)?;
    }
    Ok(bindings)
}

fn member_of<V: Clone>(
    exports: &Exports<V>,
    path: &str,
    member: Option<&str>,
) -> ImportResult<Binding<V>> {
    let Some(name) = member else {
        return Ok(Binding::Module(exports.clone()));
    };
    exports
        .get(name)
        .map(Binding::Value)
        .ok_or_else(|| ImportError::MissingMember {
            path: path.to_string(),
            member: name.to_string(),
        })
}
