use std::path::PathBuf;
use std::sync::Arc;

use stcss::compiler::{BuildOutput, Compiler, CompilerConfig};
use stcss::namespace::{CollisionRegistry, NoCollisionStrategy, PlainStrategy};
use stcss::resolver::fs::MemoryFileSystem;
use stcss::resolver::script::{NativeModule, ScriptRegistry};
use stcss::StcssError;

fn compiler_with(files: &[(&str, &str)], scripts: ScriptRegistry) -> Compiler {
    let fs = MemoryFileSystem::with_files(files.iter().map(|(path, text)| (*path, *text)));
    Compiler::new(
        CompilerConfig::default()
            .with_root_dir("/src")
            .with_fs(Arc::new(fs))
            .with_scripts(scripts),
    )
}

fn build(files: &[(&str, &str)]) -> BuildOutput {
    compiler_with(files, ScriptRegistry::new())
        .build("entry.st.css")
        .unwrap()
}

fn codes(output: &BuildOutput) -> Vec<&'static str> {
    let mut codes = output.meta.diagnostics.codes();
    if let Some(transform) = &output.meta.transform_diagnostics {
        codes.extend(transform.codes());
    }
    codes
}

const BUTTON: &str = "\
.root { -st-states: on; }
.icon {}
:vars { accent: gold; }
@keyframes spin {}
";

// ============================================================================
// Imports
// ============================================================================

#[test]
fn test_imported_class_and_var() {
    let output = build(&[
        ("/src/button.st.css", BUTTON),
        (
            "/src/entry.st.css",
            "@st-import [icon, accent] from \"./button.st.css\";\n.icon { color: value(accent); }",
        ),
    ]);
    assert!(output.css.contains(".button__icon {"), "{}", output.css);
    assert!(output.css.contains("color: gold;"));
    assert_eq!(output.exports.classes["icon"], "button__icon");
    assert!(codes(&output).is_empty(), "{:?}", codes(&output));
}

#[test]
fn test_legacy_pseudo_import() {
    let output = build(&[
        ("/src/button.st.css", BUTTON),
        (
            "/src/entry.st.css",
            ":import { -st-from: \"./button.st.css\"; -st-named: accent; }\n.x { color: value(accent); }",
        ),
    ]);
    assert!(!output.css.contains(":import"));
    assert!(output.css.contains("color: gold;"));
}

#[test]
fn test_typed_keyframes_import() {
    let output = build(&[
        ("/src/button.st.css", BUTTON),
        (
            "/src/entry.st.css",
            "@st-import [keyframes(spin)] from \"./button.st.css\";\n.x { animation-name: spin; }",
        ),
    ]);
    assert!(output.css.contains("animation-name: button__spin;"));
}

#[test]
fn test_global_custom_property_across_files() {
    let output = build(&[
        ("/src/theme.st.css", "@property st-global(--brand);\n.x { --local: 1; }"),
        (
            "/src/entry.st.css",
            "@st-import [--brand, --local] from \"./theme.st.css\";\n.y { color: var(--brand); width: var(--local); }",
        ),
    ]);
    assert!(output.css.contains("color: var(--brand);"));
    assert!(output.css.contains("width: var(--theme-local);"));
}

#[test]
fn test_importing_explicit_custom_property_keeps_import() {
    let output = build(&[
        ("/src/theme.st.css", ".x { --brand: 1; }"),
        (
            "/src/entry.st.css",
            "@st-import [--brand] from \"./theme.st.css\";\n@property st-global(--brand);\n.y { color: var(--brand); }",
        ),
    ]);
    let redeclared = codes(&output)
        .into_iter()
        .filter(|code| *code == "REDECLARE_SYMBOL")
        .count();
    assert_eq!(redeclared, 1);
    assert!(output.css.contains("color: var(--theme-brand);"), "{}", output.css);
    assert!(!output.css.contains("@property"));
}

#[test]
fn test_broken_import_reports_the_reason() {
    let output = build(&[
        ("/src/b.st.css", ".x { color: red; "),
        ("/src/entry.st.css", "@st-import [x] from \"./b.st.css\";\n.y {}"),
    ]);
    let transform = output.meta.transform_diagnostics.as_ref().unwrap();
    let report = transform
        .iter()
        .find(|d| d.code == "UNKNOWN_IMPORTED_FILE")
        .unwrap();
    assert!(report.message.contains("CSS syntax error"), "{}", report.message);
}

#[test]
fn test_unknown_imports() {
    let output = build(&[
        ("/src/button.st.css", BUTTON),
        (
            "/src/entry.st.css",
            "@st-import [nope] from \"./button.st.css\";\n@st-import [x] from \"./missing.st.css\";",
        ),
    ]);
    let codes = codes(&output);
    assert!(codes.contains(&"UNKNOWN_IMPORTED_SYMBOL"));
    assert!(codes.contains(&"UNKNOWN_IMPORTED_FILE"));
}

// ============================================================================
// Components: extends, states, pseudo-elements
// ============================================================================

#[test]
fn test_extends_inherits_states_and_parts() {
    let output = build(&[
        ("/src/button.st.css", BUTTON),
        (
            "/src/entry.st.css",
            "@st-import Button from \"./button.st.css\";\n\
             .btn { -st-extends: Button; }\n\
             .btn:on {}\n\
             .btn::icon { color: red; }\n\
             Button {}",
        ),
    ]);
    assert!(output.css.contains(".entry__btn.button--on {}"), "{}", output.css);
    assert!(output.css.contains(".entry__btn .button__icon {"));
    assert!(output.css.contains(".button__root {}"));
    assert!(!output.css.contains("-st-extends"));
    assert!(codes(&output).is_empty(), "{:?}", codes(&output));
}

#[test]
fn test_unknown_pseudo_element() {
    let output = build(&[("/src/entry.st.css", ".btn::nope {}")]);
    assert!(codes(&output).contains(&"UNKNOWN_PSEUDO_ELEMENT"));
}

#[test]
fn test_circular_extends() {
    let output = build(&[("/src/entry.st.css", ".a { -st-extends: b; }\n.b { -st-extends: a; }")]);
    assert!(codes(&output).contains(&"CIRCULAR_EXTENDS"));
}

// ============================================================================
// Formatters
// ============================================================================

fn format_scripts() -> ScriptRegistry {
    let mut scripts = ScriptRegistry::new();
    scripts.register(
        "/src/format.js",
        NativeModule::new()
            .formatter("double", |args| {
                let n: f64 = args
                    .first()
                    .and_then(|arg| arg.parse().ok())
                    .ok_or("expected a number")?;
                Ok((n * 2.0).to_string())
            })
            .formatter("fail", |_| Err("boom".to_string()))
            .formatter("explode", |_| panic!("kaboom")),
    );
    scripts
}

#[test]
fn test_formatter() {
    let compiler = compiler_with(
        &[(
            "/src/entry.st.css",
            "@st-import [double] from \"./format.js\";\n:vars { size: 4; }\n.x { width: double(value(size)); }",
        )],
        format_scripts(),
    );
    let output = compiler.build("entry.st.css").unwrap();
    assert!(output.css.contains("width: 8;"), "{}", output.css);
}

#[test]
fn test_formatter_errors_and_panics_become_diagnostics() {
    let compiler = compiler_with(
        &[(
            "/src/entry.st.css",
            "@st-import [fail, explode] from \"./format.js\";\n.x { a: fail(1); b: explode(1); }",
        )],
        format_scripts(),
    );
    let output = compiler.build("entry.st.css").unwrap();
    let failures = codes(&output)
        .into_iter()
        .filter(|code| *code == "FORMATTER_FAILED")
        .count();
    assert_eq!(failures, 2);
    assert!(output.css.contains("a: fail(1);"));
    assert!(output.css.contains("b: explode(1);"));
}

// ============================================================================
// Namespaces and caching
// ============================================================================

#[test]
fn test_namespace_collision() {
    let fs = MemoryFileSystem::with_files([
        ("/src/a/button.st.css", ".x {}"),
        ("/src/b/button.st.css", ".y {}"),
    ]);
    let registry = Arc::new(CollisionRegistry::new());
    let compiler = Compiler::new(
        CompilerConfig::default()
            .with_fs(Arc::new(fs))
            .with_namespace(Arc::new(NoCollisionStrategy::new(PlainStrategy, registry.clone()))),
    );
    assert!(compiler.process("/src/a/button.st.css").is_ok());
    assert!(compiler.process("/src/a/button.st.css").is_ok());
    let err = compiler.process("/src/b/button.st.css").unwrap_err();
    assert!(matches!(err, StcssError::NamespaceCollision { .. }), "{err}");
    assert_eq!(registry.owner("button"), Some(PathBuf::from("/src/a/button.st.css")));
}

#[test]
fn test_namespace_collision_through_import() {
    let fs = MemoryFileSystem::with_files([
        ("/src/a/button.st.css", "@st-import [y] from \"../b/button.st.css\";\n.x {}"),
        ("/src/b/button.st.css", ".y {}"),
    ]);
    let registry = Arc::new(CollisionRegistry::new());
    let compiler = Compiler::new(
        CompilerConfig::default()
            .with_fs(Arc::new(fs))
            .with_namespace(Arc::new(NoCollisionStrategy::new(PlainStrategy, registry))),
    );
    let err = compiler.build("/src/a/button.st.css").unwrap_err();
    assert!(
        matches!(&err, StcssError::NamespaceCollision { path, .. } if path == &PathBuf::from("/src/b/button.st.css")),
        "{err}"
    );
}

#[test]
fn test_invalidation_evicts_dependents() {
    let fs = Arc::new(MemoryFileSystem::with_files([
        ("/src/theme.st.css", ":vars { c: red; }"),
        (
            "/src/entry.st.css",
            "@st-import [c] from \"./theme.st.css\";\n.x { color: value(c); }",
        ),
    ]));
    let compiler = Compiler::new(
        CompilerConfig::default()
            .with_root_dir("/src")
            .with_fs(fs.clone()),
    );
    let first = compiler.build("entry.st.css").unwrap();
    assert!(first.css.contains("color: red;"));

    fs.write("/src/theme.st.css", ":vars { c: blue; }");
    let evicted = compiler.invalidate("theme.st.css");
    assert_eq!(
        evicted,
        vec![PathBuf::from("/src/theme.st.css"), PathBuf::from("/src/entry.st.css")]
    );

    let second = compiler.build("entry.st.css").unwrap();
    assert!(second.css.contains("color: blue;"));
}

#[test]
fn test_dependency_visitor() {
    let compiler = compiler_with(
        &[
            ("/src/a.st.css", "@st-import [x] from \"./b.st.css\";"),
            ("/src/b.st.css", "@st-import [y] from \"./a.st.css\";\n.x {}"),
            ("/src/entry.st.css", "@st-import [x] from \"./a.st.css\";"),
        ],
        ScriptRegistry::new(),
    );
    let meta = compiler.process("entry.st.css").unwrap();
    let mut visited = Vec::new();
    compiler
        .resolver()
        .visit_dependencies(&meta, |dependency, depth| visited.push((dependency.path.clone(), depth)));
    assert_eq!(
        visited,
        vec![
            (PathBuf::from("/src/a.st.css"), 1),
            (PathBuf::from("/src/b.st.css"), 2),
        ]
    );
}
