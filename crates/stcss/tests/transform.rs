use std::sync::Arc;

use insta::assert_snapshot;
use stcss::compiler::{BuildOutput, Compiler, CompilerConfig};
use stcss::resolver::fs::MemoryFileSystem;

fn compiler(files: &[(&str, &str)]) -> Compiler {
    let fs = MemoryFileSystem::with_files(files.iter().map(|(path, text)| (*path, *text)));
    Compiler::new(
        CompilerConfig::default()
            .with_root_dir("/src")
            .with_fs(Arc::new(fs)),
    )
}

fn build(source: &str) -> BuildOutput {
    compiler(&[("/src/entry.st.css", source)])
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

// ============================================================================
// Classes
// ============================================================================

#[test]
fn test_classes_are_namespaced() {
    let output = build(".btn { color: red; }\n.btn:hover .icon {}");
    assert_snapshot!(output.css, @r"
    .entry__btn {
        color: red;
    }
    .entry__btn:hover .entry__icon {}
    ");
    assert_eq!(output.exports.classes["root"], "entry__root");
    assert_eq!(output.exports.classes["btn"], "entry__btn");
    assert_eq!(output.exports.classes["icon"], "entry__icon");
    assert!(codes(&output).is_empty(), "{:?}", codes(&output));
}

#[test]
fn test_declared_namespace() {
    let output = build("@st-namespace \"comp\";\n.btn {}");
    assert_eq!(output.css.trim(), ".comp__btn {}");
}

#[test]
fn test_global_escape() {
    let output = build(":global(.theme) .btn {}");
    assert_eq!(output.css.trim(), ".theme .entry__btn {}");
    assert!(!output.exports.classes.contains_key("theme"));
}

#[test]
fn test_nested_rules_keep_relative_selectors() {
    let output = build(".btn { color: red; &:hover { color: blue; } }");
    assert!(output.css.contains(".entry__btn {"));
    assert!(output.css.contains("    &:hover {"));
}

#[test]
fn test_transform_is_idempotent() {
    let compiler = compiler(&[(
        "/src/entry.st.css",
        ":vars { c: red; }\n.a { -st-states: on; color: value(c); }\n.a:on { --x: 1; }",
    )]);
    let meta = compiler.process("entry.st.css").unwrap();
    let first = compiler.transform(&meta);
    let second = compiler.transform(&meta);
    assert_eq!(
        first.meta.output_ast.map(|ast| ast.to_string()),
        second.meta.output_ast.map(|ast| ast.to_string())
    );
    assert_eq!(first.exports, second.exports);
}

// ============================================================================
// Vars
// ============================================================================

#[test]
fn test_value_substitution() {
    let output = build(
        ":vars { accent: red; size: 2px; }\n.btn { color: value(accent); border: value(size) solid value(accent); }",
    );
    assert_snapshot!(output.css, @r"
    .entry__btn {
        color: red;
        border: 2px solid red;
    }
    ");
    assert_eq!(output.exports.st_vars["accent"], "red");
    assert_eq!(output.exports.st_vars["size"], "2px");
}

#[test]
fn test_cyclic_vars_resolve_to_literal() {
    let output = build(":vars { a: value(b); b: value(a); }\n.x { color: value(a); }");
    assert!(output.css.contains("color: value(a);"), "{}", output.css);
    assert!(codes(&output).is_empty(), "{:?}", codes(&output));
}

#[test]
fn test_redeclared_var_last_wins() {
    let output = build(":vars { a: 1; }\n:vars { a: 2; }\n.x { z-index: value(a); }");
    assert_eq!(codes(&output), vec!["REDECLARE_SYMBOL"]);
    assert!(output.css.contains("z-index: 2;"));
}

#[test]
fn test_unknown_var() {
    let output = build(".x { color: value(missing); }");
    assert!(codes(&output).contains(&"UNKNOWN_VAR"));
    assert!(output.css.contains("color: value(missing);"));
}

#[test]
fn test_custom_value_paths() {
    let output = build(
        ":vars { theme: st-map(primary red, secondary blue); }\n.x { color: value(theme, secondary); background: value(theme); }",
    );
    assert!(output.css.contains("color: blue;"), "{}", output.css);
    assert!(output.css.contains("background: value(theme);"));
    assert!(codes(&output).contains(&"CANNOT_USE_AS_VALUE"));
}

#[test]
fn test_array_value_index() {
    let output = build(
        ":vars { sizes: st-array(1px, 2px); }\n.x { margin: value(sizes, 1); padding: value(sizes, 5); }",
    );
    assert!(output.css.contains("margin: 2px;"), "{}", output.css);
    assert!(output.css.contains("padding: value(sizes, 5);"));
    assert!(codes(&output).contains(&"UNKNOWN_VAR_PATH"));
}

#[test]
fn test_value_without_name() {
    let output = build(".x { color: value(); }");
    assert!(codes(&output).contains(&"UNKNOWN_VAR"), "{:?}", codes(&output));
    assert!(output.css.contains("color: value();"));
}

// ============================================================================
// States
// ============================================================================

#[test]
fn test_state_classes() {
    let output = build(".item { -st-states: on, col(string); }\n.item:on {}\n.item:col(3) {}");
    assert_snapshot!(output.css, @r"
    .entry__item {}
    .entry__item.entry--on {}
    .entry__item.entry---col-1-3 {}
    ");
}

#[test]
fn test_enum_state_validation() {
    let output = build(".item { -st-states: size(enum(s, m)); }\n.item:size(xl) {}");
    assert!(codes(&output).contains(&"STATE_VALIDATION_FAILED"));
    assert!(output.css.contains(".entry__item.entry---size-2-xl"));
}

#[test]
fn test_unknown_pseudo_class_is_kept() {
    let output = build(".item:nope {}");
    assert!(codes(&output).contains(&"UNKNOWN_PSEUDO_CLASS"));
    assert_eq!(output.css.trim(), ".entry__item:nope {}");
}

// ============================================================================
// Scopes
// ============================================================================

#[test]
fn test_scope_expansion_order() {
    let output = build("@st-scope .a, .b { .part {} }");
    assert_snapshot!(output.css, @r"
    .entry__a .entry__part {}
    .entry__b .entry__part {}
    ");
}

#[test]
fn test_forbidden_definitions_in_scope() {
    let output = build("@st-scope .a { :vars { x: 1; } .b {} }");
    assert!(codes(&output).contains(&"FORBIDDEN_DEF_IN_SCOPE"));
    assert_eq!(output.css.trim(), ".entry__a .entry__b {}");
}

// ============================================================================
// Custom properties, keyframes and layers
// ============================================================================

#[test]
fn test_custom_properties() {
    let output = build(
        ".x { --size: 1px; width: var(--size); }\n@property st-global(--g);\n.y { margin: var(--g); }",
    );
    assert!(output.css.contains("--entry-size: 1px;"));
    assert!(output.css.contains("width: var(--entry-size);"));
    assert!(output.css.contains("margin: var(--g);"));
    assert_eq!(output.exports.vars["--size"], "--entry-size");
    assert_eq!(output.exports.vars["--g"], "--g");
}

#[test]
fn test_bodiless_property_is_not_emitted() {
    let output = build(
        "@property st-global(--g);\n@property --size { inherits: false; }\n.a { color: var(--g); }",
    );
    assert!(!output.css.contains("@property --g"), "{}", output.css);
    assert!(output.css.contains("@property --entry-size {"));
    assert!(output.css.contains("color: var(--g);"));
}

#[test]
fn test_global_property_redeclared_keeps_first() {
    let output = build("@property st-global(--g);\n@property --g { inherits: true; }\n.a { color: var(--g); }");
    let redeclared = codes(&output)
        .into_iter()
        .filter(|code| *code == "REDECLARE_SYMBOL")
        .count();
    assert_eq!(redeclared, 1);
    assert!(output.css.contains("@property --g {"), "{}", output.css);
    assert!(output.css.contains("color: var(--g);"));
}

#[test]
fn test_keyframes() {
    let output = build("@keyframes fade { from { opacity: 0; } }\n.x { animation: fade 1s; }");
    assert!(output.css.contains("@keyframes entry__fade {"));
    assert!(output.css.contains("    from {"));
    assert!(output.css.contains("animation: entry__fade 1s;"));
    assert_eq!(output.exports.keyframes["fade"], "entry__fade");
}

#[test]
fn test_layers() {
    let output = build("@layer base, theme;\n@layer st-global(reset) { .x {} }");
    assert!(output.css.contains("@layer entry__base, entry__theme;"));
    assert!(output.css.contains("@layer reset {"));
    assert_eq!(output.exports.layers["theme"], "entry__theme");
}
