//! `@st-namespace "name";` and the legacy string-only `@namespace "name";`.

use csstree::{AtRule, Node};

use super::{Action, AnalyzeContext, FeatureHooks, NodeInterest, TransformContext, unquote};
use crate::namespace::sanitize_namespace;

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "st-namespace",
    interest: NodeInterest::AT_RULE,
    analyze_at_rule,
    transform_at_rule,
    ..FeatureHooks::NOOP
};

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn invalid_namespace_value() -> DiagnosticType {
        DiagnosticType::error(
            "INVALID_NAMESPACE_VALUE",
            "@st-namespace must contain a non-empty quoted string",
        )
    }

    pub fn invalid_namespace_name(declared: &str, used: &str) -> DiagnosticType {
        DiagnosticType::warning(
            "INVALID_NAMESPACE_NAME",
            format!("namespace \"{declared}\" is not a valid identifier; using \"{used}\""),
        )
    }

    pub fn nested_namespace() -> DiagnosticType {
        DiagnosticType::error(
            "NESTED_NAMESPACE",
            "namespace declarations are only allowed at the stylesheet root",
        )
    }
}

/// True for at-rules that declare the stylesheet namespace. A native
/// `@namespace svg url(...)` is left alone.
pub fn is_namespace_declaration(at_rule: &AtRule) -> bool {
    match at_rule.name.as_str() {
        "st-namespace" => true,
        "namespace" => unquote(&at_rule.params).is_some(),
        _ => false,
    }
}

fn analyze_at_rule(ctx: &mut AnalyzeContext<'_>, at_rule: &AtRule, parents: &[&Node]) {
    if !is_namespace_declaration(at_rule) {
        return;
    }
    if !parents.is_empty() {
        ctx.report(diagnostics::nested_namespace(), at_rule);
        return;
    }
    let declared = match unquote(&at_rule.params) {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => {
            ctx.report(diagnostics::invalid_namespace_value(), at_rule);
            return;
        }
    };
    let sanitized = sanitize_namespace(declared);
    if sanitized != declared {
        ctx.report_word(diagnostics::invalid_namespace_name(declared, &sanitized), at_rule, declared);
    }
    ctx.meta.declared_namespace = Some(sanitized);
    ctx.meta.namespace_span = Some(at_rule.span);
}

fn transform_at_rule(_ctx: &mut TransformContext<'_>, at_rule: &mut AtRule) -> Action {
    if is_namespace_declaration(at_rule) {
        Action::Remove
    } else {
        Action::Keep
    }
}
