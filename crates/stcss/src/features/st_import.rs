//! `@st-import` and legacy `:import` blocks.
//!
//! Imports are hoisted: every root-level import is registered before the
//! rest of the stylesheet is analyzed, so usages earlier in the file still
//! see imported names.

use csstree::selector::parse_ident;
use csstree::{AtRule, Node, NodeKind, Rule, Stylesheet};
use indexmap::IndexMap;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, opt},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use super::{Action, AnalyzeContext, FeatureHooks, NodeInterest, TransformContext, unquote};
use crate::diagnostics::NodeRef;
use crate::meta::{ImportStatement, ImportSyntax};
use crate::resolver::{ResolveError, ResolvedModule};
use crate::symbols::{
    CssVarSymbol, ImportSymbol, ImportedName, ScopedNameSymbol, Symbol, SymbolNamespace,
    redeclare_symbol,
};

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "st-import",
    interest: NodeInterest::AT_RULE.union(NodeInterest::RULE),
    analyze_init,
    analyze_at_rule,
    analyze_rule,
    transform_init,
    transform_at_rule,
    transform_rule,
    ..FeatureHooks::NOOP
};

pub const IMPORT_AT_RULE: &str = "st-import";
pub const IMPORT_RULE: &str = ":import";

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn invalid_st_import_format(detail: &str) -> DiagnosticType {
        DiagnosticType::error(
            "INVALID_ST_IMPORT_FORMAT",
            format!("invalid @st-import format: {detail}"),
        )
    }

    pub fn st_import_empty_from() -> DiagnosticType {
        DiagnosticType::error("ST_IMPORT_EMPTY_FROM", "@st-import must specify a valid \"from\"")
    }

    pub fn no_st_import_in_nested_scope() -> DiagnosticType {
        DiagnosticType::error(
            "NO_ST_IMPORT_IN_NESTED_SCOPE",
            "cannot use \"@st-import\" inside of nested scope",
        )
    }

    pub fn no_pseudo_import_in_nested_scope() -> DiagnosticType {
        DiagnosticType::error(
            "NO_PSEUDO_IMPORT_IN_NESTED_SCOPE",
            "cannot use \":import\" inside of nested scope",
        )
    }

    pub fn no_import_from() -> DiagnosticType {
        DiagnosticType::error("NO_ST_IMPORT_FROM", "\":import\" is missing a \"-st-from\" declaration")
    }

    pub fn multiple_from_in_import() -> DiagnosticType {
        DiagnosticType::warning(
            "MULTIPLE_FROM_IN_IMPORT",
            "cannot define multiple \"-st-from\" declarations in a single import",
        )
    }

    pub fn illegal_prop_in_import(prop: &str) -> DiagnosticType {
        DiagnosticType::warning(
            "ILLEGAL_PROP_IN_IMPORT",
            format!("\"{prop}\" css attribute cannot be used inside \":import\" block"),
        )
    }

    pub fn default_import_is_lower_case() -> DiagnosticType {
        DiagnosticType::warning(
            "DEFAULT_IMPORT_IS_LOWER_CASE",
            "Default import of a Stylable stylesheet must start with an upper-case letter",
        )
    }

    pub fn invalid_typed_import(name: &str) -> DiagnosticType {
        DiagnosticType::error(
            "INVALID_TYPED_IMPORT",
            format!("unknown typed import \"{name}\"; expected keyframes() or layer()"),
        )
    }

    pub fn unknown_imported_file(request: &str, reason: &str) -> DiagnosticType {
        DiagnosticType::error(
            "UNKNOWN_IMPORTED_FILE",
            format!("cannot resolve imported file: \"{request}\": {reason}"),
        )
    }

    pub fn unknown_imported_symbol(name: &str, request: &str) -> DiagnosticType {
        DiagnosticType::error(
            "UNKNOWN_IMPORTED_SYMBOL",
            format!("cannot resolve imported symbol \"{name}\" from stylesheet \"{request}\""),
        )
    }
}

// ============================================================================
// Parsing
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
enum NamedEntry<'a> {
    /// `remote` or `remote as local`.
    Named { remote: &'a str, local: &'a str },
    /// `keyframes(...)` / `layer(...)`.
    Typed { kind: &'a str, inner: &'a str },
}

/// Parsed named imports: plain and typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamedImports {
    pub named: IndexMap<String, String>,
    pub typed: IndexMap<SymbolNamespace, IndexMap<String, String>>,
}

fn as_clause(input: &str) -> IResult<&str, &str> {
    preceded(tuple((multispace1, tag("as"), multispace1)), parse_ident)(input)
}

fn named_entry(input: &str) -> IResult<&str, NamedEntry<'_>> {
    alt((
        map(
            tuple((parse_ident, char('('), take_until(")"), char(')'))),
            |(kind, _, inner, _)| NamedEntry::Typed { kind, inner },
        ),
        map(pair(parse_ident, opt(as_clause)), |(remote, local)| {
            NamedEntry::Named {
                remote,
                local: local.unwrap_or(remote),
            }
        }),
    ))(input)
}

fn named_list(input: &str) -> IResult<&str, Vec<NamedEntry<'_>>> {
    delimited(
        multispace0,
        separated_list0(tuple((multispace0, char(','), multispace0)), named_entry),
        tuple((multispace0, opt(char(',')), multispace0)),
    )(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_until("\""), char('"')),
        delimited(char('\''), take_until("'"), char('\'')),
    ))(input)
}

/// `Default`, `[named]`, `Default, [named]`.
fn import_clause(input: &str) -> IResult<&str, (Option<&str>, Option<&str>)> {
    let (input, default) = opt(parse_ident)(input)?;
    let (input, _) = tuple((multispace0, opt(char(',')), multispace0))(input)?;
    let (input, named) = opt(delimited(char('['), take_until("]"), char(']')))(input)?;
    Ok((input, (default, named)))
}

struct RawImport<'a> {
    default: Option<&'a str>,
    named: Option<&'a str>,
    request: &'a str,
}

fn st_import_params(input: &str) -> IResult<&str, RawImport<'_>> {
    let (input, _) = multispace0(input)?;
    let (input, clause) = opt(terminated(
        import_clause,
        tuple((multispace0, tag("from"), multispace0)),
    ))(input)?;
    let (input, request) = quoted(input)?;
    let (input, _) = multispace0(input)?;
    let (default, named) = clause.unwrap_or((None, None));
    Ok((
        input,
        RawImport {
            default,
            named,
            request,
        },
    ))
}

/// Parses a named import list such as `a, b as c, keyframes(k), layer(l)`.
pub fn parse_named_imports(source: &str) -> Result<NamedImports, String> {
    let entries = match named_list(source) {
        Ok((rest, entries)) if rest.is_empty() => entries,
        Ok((rest, _)) => return Err(format!("unexpected \"{}\"", rest.trim())),
        Err(e) => return Err(e.to_string()),
    };
    let mut imports = NamedImports::default();
    for entry in entries {
        match entry {
            NamedEntry::Named { remote, local } => {
                imports.named.insert(local.to_string(), remote.to_string());
            }
            NamedEntry::Typed { kind, inner } => {
                let namespace = match kind {
                    "keyframes" => SymbolNamespace::Keyframes,
                    "layer" => SymbolNamespace::Layer,
                    other => return Err(format!("typed:{other}")),
                };
                let nested = parse_named_imports(inner)?;
                if !nested.typed.is_empty() {
                    return Err(format!("nested typed import inside {kind}()"));
                }
                imports.typed.entry(namespace).or_default().extend(nested.named);
            }
        }
    }
    Ok(imports)
}

fn report_named_error(ctx: &mut AnalyzeContext<'_>, node: NodeRef, error: &str) {
    match error.strip_prefix("typed:") {
        Some(kind) => ctx.report_word(diagnostics::invalid_typed_import(kind), node, kind),
        None => ctx.report(diagnostics::invalid_st_import_format(error), node),
    }
}

// ============================================================================
// Analysis
// ============================================================================

fn analyze_init(ctx: &mut AnalyzeContext<'_>, ast: &Stylesheet) {
    for node in &ast.nodes {
        let import = match node {
            Node::AtRule(at_rule) if at_rule.name == IMPORT_AT_RULE => parse_at_rule_import(ctx, at_rule),
            Node::Rule(rule) if rule.selector.trim() == IMPORT_RULE => parse_pseudo_import(ctx, rule),
            _ => None,
        };
        if let Some(import) = import {
            register_import(ctx, import);
        }
    }
}

fn parse_at_rule_import(ctx: &mut AnalyzeContext<'_>, at_rule: &AtRule) -> Option<ImportStatement> {
    let node = NodeRef::from(at_rule);
    let raw = match st_import_params(&at_rule.params) {
        Ok(("", raw)) => raw,
        Ok((rest, _)) => {
            ctx.report(
                diagnostics::invalid_st_import_format(&format!("unexpected \"{rest}\"")),
                node,
            );
            return None;
        }
        Err(_) => {
            ctx.report(
                diagnostics::invalid_st_import_format("expected [default][, [named]] from \"request\""),
                node,
            );
            return None;
        }
    };
    if raw.request.trim().is_empty() {
        ctx.report(diagnostics::st_import_empty_from(), node);
        return None;
    }
    let mut import = ImportStatement::new(raw.request, ctx.meta.context(), ImportSyntax::AtRule);
    import.span = at_rule.span;
    import.default_export = raw.default.map(str::to_string);
    if let Some(named) = raw.named {
        match parse_named_imports(named) {
            Ok(parsed) => {
                import.named = parsed.named;
                import.typed = parsed.typed;
            }
            Err(error) => report_named_error(ctx, node, &error),
        }
    }
    Some(import)
}

fn parse_pseudo_import(ctx: &mut AnalyzeContext<'_>, rule: &Rule) -> Option<ImportStatement> {
    let mut request: Option<String> = None;
    let mut default = None;
    let mut named = NamedImports::default();
    for decl in rule.declarations() {
        match decl.prop.as_str() {
            "-st-from" => {
                if request.is_some() {
                    ctx.report(diagnostics::multiple_from_in_import(), decl);
                }
                request = Some(unquote(&decl.value).unwrap_or(decl.value.trim()).to_string());
            }
            "-st-default" => default = Some(decl.value.trim().to_string()),
            "-st-named" => match parse_named_imports(&decl.value) {
                Ok(parsed) => named = parsed,
                Err(error) => report_named_error(ctx, NodeRef::from(decl), &error),
            },
            other => ctx.report_word(diagnostics::illegal_prop_in_import(other), decl, other),
        }
    }
    let request = match request {
        Some(request) if !request.trim().is_empty() => request,
        _ => {
            ctx.report(diagnostics::no_import_from(), rule);
            return None;
        }
    };
    let mut import = ImportStatement::new(request, ctx.meta.context(), ImportSyntax::PseudoRule);
    import.span = rule.span;
    import.default_export = default;
    import.named = named.named;
    import.typed = named.typed;
    Some(import)
}

fn register_import(ctx: &mut AnalyzeContext<'_>, import: ImportStatement) {
    let import_index = ctx.meta.imports.len();
    let node = NodeRef::new(
        match import.syntax {
            ImportSyntax::AtRule => NodeKind::AtRule,
            ImportSyntax::PseudoRule => NodeKind::Rule,
        },
        import.span,
    );
    let span = import.span;
    let alias = |name: &str, imported: ImportedName, namespace: SymbolNamespace| ImportSymbol {
        name: name.to_string(),
        import_index,
        imported,
        namespace,
        span,
    };

    if let Some(default) = &import.default_export {
        if import.request.ends_with(".st.css") && default.starts_with(|c: char| c.is_lowercase()) {
            ctx.report_word(diagnostics::default_import_is_lower_case(), node, default);
        }
        let symbol = Symbol::Import(alias(default, ImportedName::Default, SymbolNamespace::Main));
        ctx.add_symbol(symbol, node, false);
    }
    for (local, remote) in &import.named {
        let imported = alias(local, ImportedName::Named(remote.clone()), SymbolNamespace::Main);
        let symbol = if local.starts_with("--") {
            let explicit = matches!(
                ctx.meta.symbols.get_main(local),
                Some(Symbol::CssVar(existing)) if existing.explicit
            );
            if explicit {
                ctx.report_word(redeclare_symbol(local), node, local);
                continue;
            }
            Symbol::CssVar(CssVarSymbol {
                name: local.clone(),
                global: false,
                alias: Some(imported),
                explicit: true,
                span,
            })
        } else {
            Symbol::Import(imported)
        };
        ctx.add_symbol(symbol, node, false);
    }
    for (namespace, entries) in &import.typed {
        for (local, remote) in entries {
            let scoped = ScopedNameSymbol {
                name: local.clone(),
                global: false,
                alias: Some(alias(local, ImportedName::Named(remote.clone()), *namespace)),
                span,
            };
            let symbol = match namespace {
                SymbolNamespace::Layer => Symbol::Layer(scoped),
                _ => Symbol::Keyframes(scoped),
            };
            ctx.add_symbol(symbol, node, false);
        }
    }
    ctx.meta.imports.push(import);
}

fn analyze_at_rule(ctx: &mut AnalyzeContext<'_>, at_rule: &AtRule, parents: &[&Node]) {
    if at_rule.name == IMPORT_AT_RULE
        && !parents.is_empty()
        && !super::inside_at_rule(parents, super::st_scope::SCOPE_AT_RULE)
    {
        ctx.report(diagnostics::no_st_import_in_nested_scope(), at_rule);
    }
}

fn analyze_rule(
    ctx: &mut AnalyzeContext<'_>,
    rule: &Rule,
    _selectors: Option<&csstree::selector::SelectorList>,
    parents: &[&Node],
) {
    if rule.selector.trim() == IMPORT_RULE
        && !parents.is_empty()
        && !super::inside_at_rule(parents, super::st_scope::SCOPE_AT_RULE)
    {
        ctx.report(diagnostics::no_pseudo_import_in_nested_scope(), rule);
    }
}

// ============================================================================
// Transformation
// ============================================================================

/// Reports imports whose file or symbols cannot be resolved.
fn transform_init(ctx: &mut TransformContext<'_>) {
    let meta = ctx.meta.clone();
    for import in &meta.imports {
        let node = NodeRef::new(
            match import.syntax {
                ImportSyntax::AtRule => NodeKind::AtRule,
                ImportSyntax::PseudoRule => NodeKind::Rule,
            },
            import.span,
        );
        let module = match ctx.resolver.resolve_import(import) {
            Ok(module) => module,
            Err(err) => {
                let reason = match &err {
                    ResolveError::UnknownFile { reason, .. } => reason.clone(),
                    err => err.to_string(),
                };
                ctx.report_word(
                    diagnostics::unknown_imported_file(&import.request, &reason),
                    node,
                    &import.request,
                );
                continue;
            }
        };
        let missing: Vec<&String> = match &module {
            ResolvedModule::Stylesheet(target) => import
                .named
                .values()
                .filter(|remote| target.symbols.get_main(remote).is_none())
                .chain(import.typed.iter().flat_map(|(namespace, entries)| {
                    entries
                        .values()
                        .filter(move |remote| target.symbols.get(*namespace, remote).is_none())
                }))
                .collect(),
            ResolvedModule::Script { module, .. } => import
                .named
                .values()
                .filter(|remote| module.export(remote).is_none())
                .collect(),
        };
        for remote in missing {
            ctx.report_word(
                diagnostics::unknown_imported_symbol(remote, &import.request),
                node,
                remote,
            );
        }
    }
}

fn transform_at_rule(_ctx: &mut TransformContext<'_>, at_rule: &mut AtRule) -> Action {
    if at_rule.name == IMPORT_AT_RULE {
        Action::Remove
    } else {
        Action::Keep
    }
}

fn transform_rule(_ctx: &mut TransformContext<'_>, rule: &Rule) -> Action {
    if rule.selector.trim() == IMPORT_RULE {
        Action::Remove
    } else {
        Action::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_imports() {
        let parsed = parse_named_imports("a, b as c, keyframes(fade, slide as s), layer(base), --x").unwrap();
        assert_eq!(parsed.named.get("a").map(String::as_str), Some("a"));
        assert_eq!(parsed.named.get("c").map(String::as_str), Some("b"));
        assert_eq!(parsed.named.get("--x").map(String::as_str), Some("--x"));
        let keyframes = &parsed.typed[&SymbolNamespace::Keyframes];
        assert_eq!(keyframes.get("s").map(String::as_str), Some("slide"));
        assert!(parsed.typed[&SymbolNamespace::Layer].contains_key("base"));
    }

    #[test]
    fn test_unknown_typed_import() {
        assert_eq!(parse_named_imports("font(x)"), Err("typed:font".to_string()));
    }

    #[test]
    fn test_st_import_params() {
        let (rest, raw) = st_import_params("Button, [a, b as c] from \"./button.st.css\"").unwrap();
        assert_eq!(rest, "");
        assert_eq!(raw.default, Some("Button"));
        assert_eq!(raw.named, Some("a, b as c"));
        assert_eq!(raw.request, "./button.st.css");

        let (_, raw) = st_import_params("[x] from './x.st.css'").unwrap();
        assert_eq!(raw.default, None);
        assert_eq!(raw.named, Some("x"));

        let (_, raw) = st_import_params("\"./side-effect.css\"").unwrap();
        assert_eq!(raw.default, None);
        assert_eq!(raw.request, "./side-effect.css");

        assert!(st_import_params("Button \"./x.css\"").is_err());
    }
}
