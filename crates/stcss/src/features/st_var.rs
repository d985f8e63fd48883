//! Build-time variables: `:vars { name: value; }` and `value(name, ...path)`.

use csstree::selector::SelectorList;
use csstree::{Declaration, Node, NodeKind, Rule};

use super::{
    Action, AnalyzeContext, FeatureHooks, NodeInterest, TransformContext, inside_at_rule,
};
use crate::diagnostics::NodeRef;
use crate::evaluator::ValueEvaluator;
use crate::meta::Exports;
use crate::symbols::{Symbol, SymbolNamespace, VarSymbol};

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "st-var",
    interest: NodeInterest::RULE.union(NodeInterest::DECLARATION),
    analyze_rule,
    transform_rule,
    transform_declaration,
    transform_exports,
    ..FeatureHooks::NOOP
};

pub const VARS_RULE: &str = ":vars";

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn no_vars_def_in_nested_scope() -> DiagnosticType {
        DiagnosticType::error(
            "NO_VARS_DEF_IN_NESTED_SCOPE",
            "cannot define \":vars\" inside of a nested scope",
        )
    }

    pub fn unknown_var(name: &str) -> DiagnosticType {
        DiagnosticType::error("UNKNOWN_VAR", format!("unknown var \"{name}\""))
    }

    pub fn missing_var_name() -> DiagnosticType {
        DiagnosticType::error("UNKNOWN_VAR", "value() is missing a var name")
    }

    pub fn unknown_var_path(name: &str, path: &str) -> DiagnosticType {
        DiagnosticType::error(
            "UNKNOWN_VAR_PATH",
            format!("cannot resolve path \"{path}\" of var \"{name}\""),
        )
    }

    pub fn cannot_use_as_value(type_name: &str, name: &str) -> DiagnosticType {
        DiagnosticType::error(
            "CANNOT_USE_AS_VALUE",
            format!("{type_name} \"{name}\" cannot be used as a value"),
        )
    }

    pub fn formatter_failed(name: &str, message: &str) -> DiagnosticType {
        DiagnosticType::error(
            "FORMATTER_FAILED",
            format!("failed to execute formatter \"{name}\" with error: \"{message}\""),
        )
    }
}

pub fn is_vars_rule(rule: &Rule) -> bool {
    rule.selector.trim() == VARS_RULE
}

fn analyze_rule(
    ctx: &mut AnalyzeContext<'_>,
    rule: &Rule,
    _selectors: Option<&SelectorList>,
    parents: &[&Node],
) {
    if !is_vars_rule(rule) {
        return;
    }
    if !parents.is_empty() {
        if !inside_at_rule(parents, super::st_scope::SCOPE_AT_RULE) {
            ctx.report(diagnostics::no_vars_def_in_nested_scope(), rule);
        }
        return;
    }
    for decl in rule.declarations() {
        ctx.add_symbol(
            Symbol::Var(VarSymbol {
                name: decl.prop.clone(),
                text: decl.value.trim().to_string(),
                span: decl.span,
            }),
            decl,
            false,
        );
    }
}

fn transform_rule(_ctx: &mut TransformContext<'_>, rule: &Rule) -> Action {
    if is_vars_rule(rule) {
        Action::Remove
    } else {
        Action::Keep
    }
}

fn transform_declaration(ctx: &mut TransformContext<'_>, decl: &mut Declaration) -> Action {
    if decl.value.contains('(') {
        let evaluator = ValueEvaluator::new(ctx.resolver, ctx.meta, ctx.overrides);
        decl.value = evaluator.evaluate_declaration(&decl.value, ctx.diagnostics, NodeRef::from(&*decl));
    }
    Action::Keep
}

fn transform_exports(ctx: &mut TransformContext<'_>, exports: &mut Exports) {
    let meta = ctx.meta;
    let evaluator = ValueEvaluator::new(ctx.resolver, meta, None);
    for symbol in meta.symbols.iter(SymbolNamespace::Main) {
        let Symbol::Var(var) = symbol else {
            continue;
        };
        let node = NodeRef::new(NodeKind::Declaration, var.span);
        if let Some(value) = evaluator.evaluate_var(&var.name, ctx.diagnostics, node) {
            exports.st_vars.insert(var.name.clone(), value.to_string());
        }
    }
}
