use std::sync::Arc;

use insta::assert_snapshot;
use stcss::compiler::{BuildOutput, Compiler, CompilerConfig};
use stcss::resolver::fs::MemoryFileSystem;
use stcss::resolver::script::{MixinTree, NativeModule, ScriptRegistry};

fn scripts() -> ScriptRegistry {
    let mut scripts = ScriptRegistry::new();
    scripts.register(
        "/src/mixins.js",
        NativeModule::new()
            .mixin("mix", |_| {
                Ok(MixinTree::new()
                    .decl("color", "red")
                    .block(".x", MixinTree::new().decl("color", "green"))
                    .block("&:hover", MixinTree::new().decl("color", "gold")))
            })
            .mixin("grid", |args| {
                let columns = args.first().map(String::as_str).unwrap_or("1");
                Ok(MixinTree::new()
                    .decl("display", "grid")
                    .decl("grid-template-columns", format!("repeat({columns}, 1fr)")))
            })
            .mixin("slide", |_| {
                Ok(MixinTree::new().decl("animation", "slide 1s").block(
                    "@keyframes slide",
                    MixinTree::new().block("to", MixinTree::new().decl("left", "0")),
                ))
            })
            .mixin("deep", |_| {
                Ok(MixinTree::new().block(
                    ".x",
                    MixinTree::new()
                        .decl("color", "green")
                        .block("&:hover", MixinTree::new().decl("color", "gold")),
                ))
            })
            .mixin("broken", |_| Err("no luck".to_string()))
            .mixin("panics", |_| panic!("kaboom")),
    );
    scripts
}

fn build(source: &str) -> BuildOutput {
    let fs = MemoryFileSystem::with_files([("/src/entry.st.css", source)]);
    Compiler::new(
        CompilerConfig::default()
            .with_root_dir("/src")
            .with_fs(Arc::new(fs))
            .with_scripts(scripts()),
    )
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
// Script mixins
// ============================================================================

#[test]
fn test_script_mixin_output_order() {
    let output = build("@st-import [mix] from \"./mixins.js\";\n.container { -st-mixin: mix; }");
    assert_snapshot!(output.css, @r"
    .entry__container {
        color: red;
    }
    .entry__container .entry__x {
        color: green;
    }
    .entry__container:hover {
        color: gold;
    }
    ");
}

#[test]
fn test_script_mixin_deep_blocks_become_siblings() {
    let output = build("@st-import [deep] from \"./mixins.js\";\n.a { color: red; -st-mixin: deep; }");
    assert_snapshot!(output.css, @r"
    .entry__a {
        color: red;
    }
    .entry__a .entry__x {
        color: green;
    }
    .entry__a .entry__x:hover {
        color: gold;
    }
    ");
}

#[test]
fn test_script_mixin_arguments_are_evaluated() {
    let output = build(
        "@st-import [grid] from \"./mixins.js\";\n:vars { cols: 3; }\n.g { margin: 0; -st-mixin: grid(value(cols)); padding: 0; }",
    );
    assert_snapshot!(output.css, @r"
    .entry__g {
        margin: 0;
        display: grid;
        grid-template-columns: repeat(3, 1fr);
        padding: 0;
    }
    ");
}

#[test]
fn test_script_mixin_keyframes_are_hoisted() {
    let output = build("@st-import [slide] from \"./mixins.js\";\n.a { -st-mixin: slide; }");
    let rule = output.css.find(".entry__a {").unwrap();
    let keyframes = output.css.find("@keyframes entry__slide {").unwrap();
    assert!(keyframes > rule, "{}", output.css);
    assert!(output.css.contains("    to {"));
}

#[test]
fn test_stylesheet_keyframes_win_over_mixin_keyframes() {
    let output = build(
        "@st-import [slide] from \"./mixins.js\";\n@keyframes slide { from { left: 1px; } }\n.a { -st-mixin: slide; }",
    );
    assert_eq!(output.css.matches("@keyframes").count(), 1, "{}", output.css);
    assert!(output.css.contains("@keyframes entry__slide {"));
    assert!(output.css.contains("left: 1px;"));
    assert!(!output.css.contains("left: 0;"));
}

#[test]
fn test_script_mixin_failures() {
    let output = build(
        "@st-import [broken, panics] from \"./mixins.js\";\n.a { -st-mixin: broken; }\n.b { -st-mixin: panics; color: red; }",
    );
    let failures = codes(&output)
        .into_iter()
        .filter(|code| *code == "FAILED_SCRIPT_MIXIN")
        .count();
    assert_eq!(failures, 2);
    assert!(output.css.contains("color: red;"));
}

// ============================================================================
// CSS mixins
// ============================================================================

#[test]
fn test_css_mixin() {
    let output = build(".mix { color: red; }\n.mix:hover { color: blue; }\n.btn { -st-mixin: mix; }");
    assert_snapshot!(output.css, @r"
    .entry__mix {
        color: red;
    }
    .entry__mix:hover {
        color: blue;
    }
    .entry__btn {
        color: red;
    }
    .entry__btn:hover {
        color: blue;
    }
    ");
}

#[test]
fn test_css_mixin_overrides() {
    let output = build(":vars { c: red; }\n.mix { color: value(c); }\n.btn { -st-mixin: mix(c blue); }");
    assert!(output.css.contains(".entry__mix {\n    color: red;\n}"), "{}", output.css);
    assert!(output.css.contains(".entry__btn {\n    color: blue;\n}"));
}

#[test]
fn test_partial_mixin_keeps_overridden_declarations() {
    let output = build(
        ":vars { c: red; }\n.mix { color: value(c); width: 1px; }\n.btn { -st-partial-mixin: mix(c blue); }",
    );
    assert!(output.css.contains(".entry__btn {\n    color: blue;\n}"), "{}", output.css);
}

#[test]
fn test_circular_mixin() {
    let output = build(".a { -st-mixin: b; }\n.b { -st-mixin: a; }");
    assert!(codes(&output).contains(&"CIRCULAR_MIXIN"));
}

#[test]
fn test_unknown_mixin() {
    let output = build(".a { -st-mixin: nope; color: red; }");
    assert!(codes(&output).contains(&"UNKNOWN_MIXIN"));
    assert!(output.css.contains("color: red;"));
    assert!(!output.css.contains("-st-mixin"));
}
