/*!
 * Resolver Lifecycle Tests
 * Failures, aborted scripts, resets and registry-backed libraries
 */

use crate::harness::{registry_with, Runtime, ScriptError};
use pretty_assertions::assert_eq;
use script_vfs::modules::ImportError;
use script_vfs::{init_registry, VfsConfig};
use tempfile::TempDir;

fn runtime() -> Runtime {
    Runtime::new(registry_with(&[
        ("/usr/counter.ms", "let count = 0\nexport count\n"),
        ("/usr/spin.ms", "spin\n"),
        ("/usr/outer.ms", "import ./spin\n"),
        ("/usr/bad.ms", "let a = 1\nfail boom\n"),
        ("/usr/broken.ms", "frobnicate\n"),
    ]))
}

#[test]
fn test_compile_error_leaves_nothing_in_flight() {
    let mut rt = runtime();
    match rt.run("import /usr/broken", "/").unwrap_err() {
        ScriptError::Import(ImportError::Compile { path, message }) => {
            assert_eq!(path, "/usr/broken.ms");
            assert!(message.contains("unexpected statement"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(rt.resolver.is_idle());
}

#[test]
fn test_failed_module_can_be_retried() {
    let mut rt = runtime();
    for _ in 0..2 {
        let err = rt.run("import /usr/bad", "/").unwrap_err();
        assert!(matches!(err, ScriptError::Runtime(ref msg) if msg == "boom"));
        assert!(rt.resolver.is_idle());
        assert!(rt.resolver.cached("/usr/bad.ms").is_none());
    }
    // The compiled unit survives the failure.
    assert_eq!(rt.resolver.compiler().compiled, 1);
}

#[test]
fn test_abort_clears_pending_loads() {
    let mut rt = runtime();
    rt.step_budget = 50;

    assert!(matches!(
        rt.run("import /usr/outer", "/"),
        Err(ScriptError::StepBudget)
    ));
    assert!(rt.resolver.is_idle());
    assert!(rt.resolver.in_flight().is_empty());

    // Aborted paths are importable again rather than reported as circular.
    assert!(matches!(
        rt.run("import /usr/spin", "/"),
        Err(ScriptError::StepBudget)
    ));

    let locals = rt.run("import /usr/counter members count", "/").unwrap();
    assert_eq!(locals.num("count"), Some(0));
}

#[test]
fn test_reset_reloads_sources_and_libraries() {
    let mut rt = runtime();
    rt.run("define counter /usr/counter\nimport counter", "/").unwrap();

    rt.resolver
        .registry()
        .write_text("/usr/counter.ms", "let count = 9\nexport count\n")
        .unwrap();
    let locals = rt.run("import /usr/counter members count", "/").unwrap();
    assert_eq!(locals.num("count"), Some(0));

    rt.resolver.reset();
    assert!(rt.resolver.cached("/usr/counter.ms").is_none());
    assert_eq!(
        rt.run("import counter", "/").unwrap_err().import(),
        Some(ImportError::NotFound("counter".into()))
    );

    let locals = rt.run("import /usr/counter members count", "/").unwrap();
    assert_eq!(locals.num("count"), Some(9));
    assert_eq!(rt.resolver.compiler().compiled, 2);
}

#[test]
fn test_libraries_from_configured_registry() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("manifest.json"),
        r#"{"lib/greet.ms": {"fullPath": "sysdisk/lib/greet.ms", "resourcesPath": "greet.src"}}"#,
    )
    .unwrap();
    std::fs::write(temp.path().join("greet.src"), "let hello = 1\nexport hello\n").unwrap();

    let config = VfsConfig {
        storage_path: temp.path().join("storage"),
        manifest_path: Some(temp.path().join("manifest.json")),
        ..VfsConfig::default()
    };
    let registry = init_registry(&config).unwrap();
    registry.write_text("/usr/tool.ms", "import greet members hello\n").unwrap();

    let mut rt = Runtime::new(registry);
    let locals = rt.run("import ./tool as tool\nimport GREET members hello\nread hello", "/usr").unwrap();

    assert!(locals.module("tool").unwrap().contains("hello"));
    assert_eq!(rt.output, vec!["hello=1"]);
    assert!(temp.path().join("storage").join("tool.ms").exists());
}
