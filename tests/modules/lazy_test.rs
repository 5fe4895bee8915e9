/*!
 * Lazy Import Tests
 * Circular imports and deferred loading
 */

use crate::harness::{registry_with, Runtime, ScriptError};
use pretty_assertions::assert_eq;
use script_vfs::modules::ImportError;

fn runtime() -> Runtime {
    Runtime::new(registry_with(&[
        // a and b import each other eagerly
        ("/usr/cycle/a.ms", "import ./b\nlet x = 1\n"),
        ("/usr/cycle/b.ms", "import ./a\nlet y = 2\n"),
        // a imports b lazily, b imports a eagerly
        (
            "/usr/lazy/a.ms",
            "import ./b lazy members y\nlet x = 1\nexport x\nexport y\n",
        ),
        ("/usr/lazy/b.ms", "import ./a members x\nlet y = 2\nexport y\n"),
        // c reads its lazy member before finishing
        ("/usr/eager/c.ms", "import ./d lazy members v\nread v\n"),
        ("/usr/eager/d.ms", "import ./c\nlet v = 3\n"),
    ]))
}

#[test]
fn test_circular_import_is_rejected() {
    let mut rt = runtime();
    let err = rt.run("import /usr/cycle/a", "/").unwrap_err();

    assert!(matches!(
        err,
        ScriptError::Import(ImportError::CircularImport(ref path)) if path == "/usr/cycle/a.ms"
    ));
    assert!(rt.resolver.is_idle());
    assert!(rt.resolver.cached("/usr/cycle/a.ms").is_none());
    assert!(rt.resolver.cached("/usr/cycle/b.ms").is_none());
}

#[test]
fn test_lazy_import_defers_load() {
    let mut rt = runtime();
    let locals = rt.run("import /usr/lazy/a members x y\nread x", "/").unwrap();

    assert_eq!(locals.num("x"), Some(1));
    assert!(rt.resolver.cached("/usr/lazy/a.ms").is_some());
    assert!(rt.resolver.cached("/usr/lazy/b.ms").is_none());
    assert_eq!(rt.resolver.compiler().compiled, 1);
    assert_eq!(rt.output, vec!["x=1"]);
}

#[test]
fn test_lazy_import_breaks_cycle() {
    let mut rt = runtime();
    let locals = rt
        .run("import /usr/lazy/a members x y\nread x\nread y\nread y", "/")
        .unwrap();

    assert_eq!(locals.num("y"), Some(2));
    assert_eq!(rt.output, vec!["x=1", "y=2", "y=2"]);
    assert!(rt.resolver.cached("/usr/lazy/b.ms").is_some());
    assert_eq!(rt.resolver.compiler().compiled, 2);
    assert!(rt.resolver.is_idle());
}

#[test]
fn test_lazy_import_after_load_is_immediate() {
    let mut rt = runtime();
    rt.run("import /usr/lazy/b as b", "/").unwrap();

    // Loading b loaded a as well; its lazy member now reads from the cache.
    let locals = rt.run("import /usr/lazy/a members y\nread y", "/").unwrap();
    assert_eq!(locals.num("y"), Some(2));
}

#[test]
fn test_reading_lazy_member_mid_cycle() {
    let mut rt = runtime();
    let err = rt.run("import /usr/eager/c", "/").unwrap_err();

    assert!(matches!(
        err,
        ScriptError::Import(ImportError::CircularImport(ref path)) if path == "/usr/eager/c.ms"
    ));
    assert!(rt.resolver.is_idle());
}
