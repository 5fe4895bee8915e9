/*!
 * Script Harness
 * Line-oriented mini runtime that drives the resolver like a host step loop
 */

use script_vfs::modules::{
    Binding, BindingTarget, Completion, Exports, ImportError, ImportMode, ImportRequest,
    ImportSource, ImportStep, LazyMember, MemberSpec, ModuleCompiler, ModuleOutcome,
    ModuleResolver, ModuleScope, PendingLoad, Ticket,
};
use script_vfs::vfs::{
    paths, ArchiveDisk, DiskRegistry, Manifest, ManifestEntry, MemoryDisk, StaticResourceLoader,
};
use script_vfs::ResolverConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Runtime value
#[derive(Debug, Clone)]
pub enum Val {
    Num(i64),
    Module(Exports<Val>),
    Lazy(LazyMember),
}

impl From<Binding<Val>> for Val {
    fn from(binding: Binding<Val>) -> Self {
        match binding {
            Binding::Value(value) => value,
            Binding::Module(exports) => Val::Module(exports),
            Binding::Lazy(lazy) => Val::Lazy(lazy),
        }
    }
}

/// Top-level variables of one running script or module
#[derive(Debug, Default, Clone)]
pub struct Locals(pub BTreeMap<String, Val>);

impl Locals {
    pub fn get(&self, name: &str) -> Option<&Val> {
        self.0.get(name)
    }

    pub fn module(&self, name: &str) -> Option<&Exports<Val>> {
        match self.0.get(name) {
            Some(Val::Module(exports)) => Some(exports),
            _ => None,
        }
    }

    pub fn num(&self, name: &str) -> Option<i64> {
        match self.0.get(name) {
            Some(Val::Num(n)) => Some(*n),
            _ => None,
        }
    }
}

impl BindingTarget<Val> for Locals {
    fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    fn bind(&mut self, name: String, binding: Binding<Val>) {
        self.0.insert(name, binding.into());
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let(String, i64),
    Import {
        specifier: String,
        members: Vec<MemberSpec>,
        alias: Option<String>,
        mode: ImportMode,
    },
    Export {
        name: String,
        force: bool,
    },
    EnsureFresh(bool),
    Read(String),
    Define {
        name: String,
        specifier: String,
    },
    Spin,
    Fail(String),
}

pub type Program = Arc<Vec<Stmt>>;

/// Parses modules into statements and counts how often it ran
#[derive(Debug, Default)]
pub struct LineCompiler {
    pub compiled: usize,
}

impl ModuleCompiler for LineCompiler {
    type Unit = Program;
    type Value = Val;

    fn compile(&mut self, source: &str, origin: &str) -> Result<Program, String> {
        let program = parse(source).map_err(|e| format!("{}: {}", origin, e))?;
        self.compiled += 1;
        Ok(Arc::new(program))
    }
}

/// Statement grammar, one per line:
///
/// ```text
/// let x = 1
/// import <spec> [members a b:alias] [as name] [lazy|fresh]
/// export x [force]
/// ensure_fresh true|false
/// read x
/// define name <spec>
/// spin
/// fail message...
/// ```
pub fn parse(source: &str) -> Result<Vec<Stmt>, String> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Result<Stmt, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["let", name, "=", value] => value
            .parse()
            .map(|n| Stmt::Let(name.to_string(), n))
            .map_err(|_| format!("bad number {}", value)),
        ["import", specifier, rest @ ..] => parse_import(specifier, rest),
        ["export", name] => Ok(Stmt::Export {
            name: name.to_string(),
            force: false,
        }),
        ["export", name, "force"] => Ok(Stmt::Export {
            name: name.to_string(),
            force: true,
        }),
        ["ensure_fresh", flag] => flag
            .parse()
            .map(Stmt::EnsureFresh)
            .map_err(|_| format!("bad flag {}", flag)),
        ["read", name] => Ok(Stmt::Read(name.to_string())),
        ["define", name, specifier] => Ok(Stmt::Define {
            name: name.to_string(),
            specifier: specifier.to_string(),
        }),
        ["spin"] => Ok(Stmt::Spin),
        ["fail", message @ ..] => Ok(Stmt::Fail(message.join(" "))),
        _ => Err(format!("unexpected statement: {}", line)),
    }
}

fn parse_import(specifier: &str, rest: &[&str]) -> Result<Stmt, String> {
    let mut members = Vec::new();
    let mut alias = None;
    let mut mode = ImportMode::Cached;
    let mut in_members = false;

    let mut tokens = rest.iter();
    while let Some(&token) = tokens.next() {
        match token {
            "lazy" => {
                mode = ImportMode::Lazy;
                in_members = false;
            }
            "fresh" => {
                mode = ImportMode::Fresh;
                in_members = false;
            }
            "members" => in_members = true,
            "as" => {
                alias = Some(tokens.next().ok_or("missing alias")?.to_string());
                in_members = false;
            }
            member if in_members => members.push(match member.split_once(':') {
                Some((name, alias)) => MemberSpec::aliased(name, alias),
                None => MemberSpec::new(member),
            }),
            other => return Err(format!("unexpected token {}", other)),
        }
    }

    Ok(Stmt::Import {
        specifier: specifier.to_string(),
        members,
        alias,
        mode,
    })
}

#[derive(Debug)]
pub enum ScriptError {
    Import(ImportError),
    StepBudget,
    Runtime(String),
}

impl From<ImportError> for ScriptError {
    fn from(e: ImportError) -> Self {
        ScriptError::Import(e)
    }
}

impl ScriptError {
    pub fn import(self) -> Option<ImportError> {
        match self {
            ScriptError::Import(e) => Some(e),
            _ => None,
        }
    }
}

/// What a frame does with the result of the load it started
#[derive(Debug)]
enum Waiting {
    Bind,
    Read(String),
}

struct Frame {
    program: Program,
    pc: usize,
    locals: Locals,
    dir: String,
    module: Option<(Ticket, ModuleScope<Val>)>,
    waiting: Option<Waiting>,
}

impl Frame {
    fn script(program: Program, dir: &str) -> Self {
        Self {
            program,
            pc: 0,
            locals: Locals::default(),
            dir: dir.to_string(),
            module: None,
            waiting: None,
        }
    }

    fn module(load: PendingLoad<Program, Val>) -> Self {
        Self {
            program: load.unit,
            pc: 0,
            locals: Locals::default(),
            dir: load.scope.dirname().to_string(),
            module: Some((load.ticket, load.scope)),
            waiting: None,
        }
    }
}

/// Single cooperative execution context with a step budget
pub struct Runtime {
    pub resolver: ModuleResolver<LineCompiler>,
    pub step_budget: usize,
    pub output: Vec<String>,
}

impl Runtime {
    pub fn new(registry: DiskRegistry) -> Self {
        let config = ResolverConfig {
            library_dirs: vec!["/sys/lib".into(), "/usr/lib".into()],
            ..ResolverConfig::default()
        };
        Self {
            resolver: ModuleResolver::new(registry, config, LineCompiler::default()),
            step_budget: 1_000,
            output: Vec::new(),
        }
    }

    /// Run a top-level script whose relative imports resolve against `dir`
    pub fn run(&mut self, source: &str, dir: &str) -> Result<Locals, ScriptError> {
        let program = Arc::new(parse(source).map_err(ScriptError::Runtime)?);
        let mut frames = vec![Frame::script(program, dir)];

        let result = self.drive(&mut frames);
        match &result {
            Ok(_) => {}
            Err(ScriptError::StepBudget) => self.resolver.abort_pending(),
            Err(_) => {
                while let Some(frame) = frames.pop() {
                    if let Some((ticket, _)) = frame.module {
                        let _ = self.resolver.fail(ticket);
                    }
                }
            }
        }
        result
    }

    fn drive(&mut self, frames: &mut Vec<Frame>) -> Result<Locals, ScriptError> {
        let mut steps = 0;
        loop {
            steps += 1;
            if steps > self.step_budget {
                return Err(ScriptError::StepBudget);
            }

            let Some(frame) = frames.last_mut() else {
                return Err(ScriptError::Runtime("no frame to run".into()));
            };

            if frame.pc >= frame.program.len() {
                let Some(done) = frames.pop() else {
                    return Err(ScriptError::Runtime("no frame to finish".into()));
                };
                let (ticket, scope) = match done.module {
                    Some(module) => module,
                    None => return Ok(done.locals),
                };
                let completion = self.resolver.resume(
                    ticket,
                    ModuleOutcome {
                        scope,
                        bindings: done.locals.0,
                    },
                )?;
                let parent = frames
                    .last_mut()
                    .ok_or_else(|| ScriptError::Runtime("module finished without importer".into()))?;
                self.deliver(parent, completion)?;
                continue;
            }

            let stmt = frame.program[frame.pc].clone();
            if let Some(load) = self.step(frame, stmt)? {
                frames.push(Frame::module(load));
            }
        }
    }

    fn step(
        &mut self,
        frame: &mut Frame,
        stmt: Stmt,
    ) -> Result<Option<PendingLoad<Program, Val>>, ScriptError> {
        if !matches!(stmt, Stmt::Spin) {
            frame.pc += 1;
        }

        match stmt {
            Stmt::Let(name, n) => {
                frame.locals.0.insert(name, Val::Num(n));
            }
            Stmt::Import {
                specifier,
                members,
                alias,
                mode,
            } => {
                let request = ImportRequest {
                    source: ImportSource::Library(specifier),
                    members,
                    alias,
                    mode,
                };
                frame.waiting = Some(Waiting::Bind);
                match self.resolver.import(request, &frame.dir)? {
                    ImportStep::Ready(completion) => self.deliver(frame, completion)?,
                    ImportStep::Pending(load) => return Ok(Some(load)),
                }
            }
            Stmt::Export { name, force } => {
                let value = frame
                    .locals
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| ScriptError::Runtime(format!("undefined {}", name)))?;
                let (_, scope) = frame
                    .module
                    .as_mut()
                    .ok_or_else(|| ScriptError::Runtime("export outside a module".into()))?;
                scope.export(&name, value, force)?;
            }
            Stmt::EnsureFresh(required) => {
                let (_, scope) = frame
                    .module
                    .as_ref()
                    .ok_or_else(|| ScriptError::Runtime("ensure_fresh outside a module".into()))?;
                scope.ensure_fresh(required)?;
            }
            Stmt::Read(name) => {
                let value = frame
                    .locals
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| ScriptError::Runtime(format!("undefined {}", name)))?;
                let lazy = match value {
                    Val::Lazy(lazy) => lazy,
                    other => {
                        self.record(&name, &other);
                        return Ok(None);
                    }
                };
                frame.waiting = Some(Waiting::Read(name));
                match self.resolver.read_lazy(&lazy)? {
                    ImportStep::Ready(completion) => self.deliver(frame, completion)?,
                    ImportStep::Pending(load) => return Ok(Some(load)),
                }
            }
            Stmt::Define { name, specifier } => {
                self.resolver.define_library(&name, &specifier, &frame.dir)?;
            }
            Stmt::Spin => {}
            Stmt::Fail(message) => return Err(ScriptError::Runtime(message)),
        }
        Ok(None)
    }

    fn deliver(&mut self, frame: &mut Frame, completion: Completion<Val>) -> Result<(), ScriptError> {
        match frame.waiting.take() {
            Some(Waiting::Bind) => completion
                .into_bindings()
                .ok_or_else(|| ScriptError::Runtime("expected bindings".into()))?
                .bind_into(&mut frame.locals)?,
            Some(Waiting::Read(name)) => {
                let value: Val = completion
                    .into_member()
                    .ok_or_else(|| ScriptError::Runtime("expected a member".into()))?
                    .into();
                self.record(&name, &value);
                frame.locals.0.insert(name, value);
            }
            None => return Err(ScriptError::Runtime("nothing was waiting".into())),
        }
        Ok(())
    }

    fn record(&mut self, name: &str, value: &Val) {
        let rendered = match value {
            Val::Num(n) => n.to_string(),
            Val::Module(exports) => format!("module({})", exports.names().join(",")),
            Val::Lazy(lazy) => format!("lazy({})", lazy.path),
        };
        self.output.push(format!("{}={}", name, rendered));
    }
}

/// Registry with a `sys` archive holding `/sys/lib/math.ms` and a `usr`
/// memory disk holding `files`
pub fn registry_with(files: &[(&str, &str)]) -> DiskRegistry {
    let mut manifest = Manifest::new();
    manifest.insert("lib/math.ms", ManifestEntry::new("sysdisk/lib/math.ms", "math"));
    let loader = StaticResourceLoader::new().with("math", "let pi = 3\nexport pi\n");
    let archive = ArchiveDisk::new(&manifest, Arc::new(loader)).unwrap();

    let registry = DiskRegistry::new(archive);
    registry.add_disk("usr", MemoryDisk::new()).unwrap();
    for (path, source) in files {
        let parent = paths::parent(path);
        let mut dir = String::new();
        for segment in paths::segments(&parent).into_iter().skip(1) {
            dir = format!("{}/{}", if dir.is_empty() { "/usr" } else { dir.as_str() }, segment);
            if registry.exists(&dir).is_none() {
                registry.make_dir(&dir).unwrap();
            }
        }
        registry.write_text(path, source).unwrap();
    }
    registry
}
