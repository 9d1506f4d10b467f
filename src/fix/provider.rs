use crate::config::Replacement;
use crate::fix::action::{CodeAction, Intent, NodeKey};
use crate::fix::FixError;
use crate::matcher;
use crate::semantic::SemanticModel;
use crate::source::{Diagnostic, Node, NodeKind, SourceModel};
use std::collections::BTreeSet;

pub const MARK_VALID_TARGET_KEY: &str = "mark-valid-target";
pub const REMOVE_CONFLICTING_MARKERS_KEY: &str = "remove-conflicting-markers";
pub const REMOVE_PARAMETERS_KEY: &str = "Remove Parameters";

/// Everything a provider may look at.
#[derive(Clone, Copy)]
pub struct FixContext<'a> {
    pub model: &'a SourceModel,
    pub diagnostic: &'a Diagnostic,
    pub semantic: &'a dyn SemanticModel,
}

/// A per-rule fix policy.
///
/// Providers decline by returning no actions; they never fail for "not
/// applicable".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixProvider {
    /// Insert a required marker attribute on the enclosing declaration.
    MarkAsValidTarget { attribute: String },
    /// Remove attributes whose simple name is in `disallowed`.
    RemoveConflictingMarkers { disallowed: Vec<String> },
    /// `M(typeof(T), ...)` → `M<T>(...)` when `T` resolves.
    UseGenericOverload,
    /// Replace the declaration's parameter list with `()`.
    RemoveParameters,
    /// Rename an exact type check to its assignability twin.
    UseAssignableFrom { replacements: Vec<Replacement> },
}

fn enclosing_declaration<'m>(model: &'m SourceModel, diagnostic: &Diagnostic) -> Option<&'m Node> {
    matcher::find_enclosing_where(model, diagnostic.span, |kind| {
        matches!(
            kind,
            NodeKind::MethodDeclaration | NodeKind::ConstructorDeclaration
        ) || kind.is_type_declaration()
    })
    .map(|found| found.node())
}

fn enclosing_invocation<'m>(model: &'m SourceModel, diagnostic: &Diagnostic) -> Option<&'m Node> {
    matcher::find_enclosing(model, diagnostic.span, NodeKind::Invocation).map(|found| found.node())
}

impl FixProvider {
    pub fn name(&self) -> &'static str {
        match self {
            FixProvider::MarkAsValidTarget { .. } => "mark-as-valid-target",
            FixProvider::RemoveConflictingMarkers { .. } => "remove-conflicting-markers",
            FixProvider::UseGenericOverload => "use-generic-overload",
            FixProvider::RemoveParameters => "remove-parameters",
            FixProvider::UseAssignableFrom { .. } => "use-assignable-from",
        }
    }

    pub fn provide(&self, cx: &FixContext<'_>) -> Vec<CodeAction> {
        let actions = match self {
            FixProvider::MarkAsValidTarget { attribute } => mark_as_valid_target(cx, attribute),
            FixProvider::RemoveConflictingMarkers { disallowed } => {
                remove_conflicting_markers(cx, disallowed)
            }
            FixProvider::UseGenericOverload => use_generic_overload(cx),
            FixProvider::RemoveParameters => remove_parameters(cx),
            FixProvider::UseAssignableFrom { replacements } => {
                use_assignable_from(cx, replacements)
            }
        };
        if actions.is_none() {
            tracing::debug!(
                provider = self.name(),
                rule = %cx.diagnostic.rule_id,
                span = %cx.diagnostic.span,
                "provider declined"
            );
        }
        actions.into_iter().collect()
    }
}

fn mark_as_valid_target(cx: &FixContext<'_>, attribute: &str) -> Option<CodeAction> {
    let declaration = enclosing_declaration(cx.model, cx.diagnostic)?;
    if matcher::has_attribute(cx.model, declaration, &[attribute.to_string()]) {
        return None;
    }
    Some(CodeAction::new(
        cx.model,
        format!("Mark as {attribute}"),
        MARK_VALID_TARGET_KEY,
        Intent::InsertAttribute {
            declaration: NodeKey::of(declaration),
            attribute: attribute.to_string(),
        },
    ))
}

fn remove_conflicting_markers(cx: &FixContext<'_>, disallowed: &[String]) -> Option<CodeAction> {
    let declaration = enclosing_declaration(cx.model, cx.diagnostic)?;
    if !matcher::has_attribute(cx.model, declaration, disallowed) {
        return None;
    }
    Some(CodeAction::new(
        cx.model,
        "Remove conflicting attributes",
        REMOVE_CONFLICTING_MARKERS_KEY,
        Intent::RemoveAttributes {
            declaration: NodeKey::of(declaration),
            names: disallowed.to_vec(),
        },
    ))
}

fn use_generic_overload(cx: &FixContext<'_>) -> Option<CodeAction> {
    let invocation = enclosing_invocation(cx.model, cx.diagnostic)?;
    if !matcher::callee_type_arguments(invocation).is_empty() {
        return None;
    }
    let member = matcher::simple_callee_name(cx.model, invocation)?;
    let operand = matcher::first_argument_type_expression(invocation)?;
    let ty = cx.semantic.resolve_type(cx.model, operand)?;
    let display = cx.semantic.minimally_qualified_name(cx.model, &ty);

    Some(CodeAction::new(
        cx.model,
        format!("Use {member}<{display}>"),
        format!("use generic overload for {display}"),
        Intent::UseGenericOverload {
            invocation: NodeKey::of(invocation),
            type_argument: cx.model.text_of(operand).to_string(),
        },
    ))
}

fn remove_parameters(cx: &FixContext<'_>) -> Option<CodeAction> {
    let declaration = enclosing_declaration(cx.model, cx.diagnostic)?;
    let parameters = matcher::parameter_list(declaration)?;
    parameters.first_child_of_kind(NodeKind::Parameter)?;
    Some(CodeAction::new(
        cx.model,
        "Remove Parameters",
        REMOVE_PARAMETERS_KEY,
        Intent::ReplaceNode {
            target: NodeKey::of(parameters),
            text: "()".to_string(),
        },
    ))
}

fn use_assignable_from(cx: &FixContext<'_>, replacements: &[Replacement]) -> Option<CodeAction> {
    let invocation = enclosing_invocation(cx.model, cx.diagnostic)?;
    let name = matcher::callee_name_node(invocation)?;
    let member = cx.model.text_of(name);
    let replacement = replacements.iter().find(|r| r.from == member)?;
    Some(CodeAction::new(
        cx.model,
        format!("Use Assert.{}", replacement.to),
        format!("Use Assert.{}", replacement.to),
        Intent::ReplaceNode {
            target: NodeKey::of(name),
            text: replacement.to.clone(),
        },
    ))
}

/// A provider registered for a set of rule ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixRule {
    pub rule_ids: BTreeSet<String>,
    pub provider: FixProvider,
}

impl FixRule {
    pub fn new<I, S>(rule_ids: I, provider: FixProvider) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rule_ids: rule_ids.into_iter().map(Into::into).collect(),
            provider,
        }
    }

    pub fn owns(&self, rule_id: &str) -> bool {
        self.rule_ids.contains(rule_id)
    }

    /// Run the provider. A diagnostic for a rule this entry does not own is
    /// a wiring bug and is reported, not declined.
    pub fn provide(&self, cx: &FixContext<'_>) -> Result<Vec<CodeAction>, FixError> {
        if !self.owns(&cx.diagnostic.rule_id) {
            return Err(FixError::UnownedRule {
                rule_id: cx.diagnostic.rule_id.clone(),
                owned: self.rule_ids.iter().cloned().collect(),
            });
        }
        Ok(self.provider.provide(cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::DeclarationIndex;
    use crate::source::{Severity, Span};

    fn diagnostic(model: &SourceModel, rule: &str, needle: &str) -> Diagnostic {
        let start = model.text().find(needle).unwrap();
        Diagnostic::new(rule, Span::new(start, start + needle.len()), Severity::Warning)
    }

    fn provide(provider: &FixProvider, source: &str, needle: &str) -> Vec<CodeAction> {
        let model = SourceModel::parse(source).unwrap();
        let diagnostic = diagnostic(&model, "R", needle);
        let semantic = DeclarationIndex::default();
        provider.provide(&FixContext {
            model: &model,
            diagnostic: &diagnostic,
            semantic: &semantic,
        })
    }

    #[test]
    fn mark_as_valid_target_has_fixed_key() {
        let provider = FixProvider::MarkAsValidTarget {
            attribute: "Theory".to_string(),
        };
        let actions = provide(&provider, "class T { [InlineData(1)] void M(int x) { } }", "M");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].equivalence_key, MARK_VALID_TARGET_KEY);
        assert_eq!(actions[0].title, "Mark as Theory");

        let already = provide(&provider, "class T { [Theory] void M(int x) { } }", "M");
        assert!(already.is_empty());
    }

    #[test]
    fn remove_markers_declines_without_matches() {
        let provider = FixProvider::RemoveConflictingMarkers {
            disallowed: vec!["InlineData".to_string()],
        };
        assert!(provide(&provider, "class T { [Fact] void M() { } }", "M").is_empty());
        assert_eq!(
            provide(&provider, "class T { [Fact, InlineData(1)] void M() { } }", "M").len(),
            1
        );
    }

    #[test]
    fn generic_overload_declines_on_unresolved_type() {
        let provider = FixProvider::UseGenericOverload;
        let resolved = provide(
            &provider,
            "class Foo { } class T { void M() { check(typeof(Foo), v); } }",
            "check(typeof(Foo), v)",
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].equivalence_key, "use generic overload for Foo");
        assert_eq!(resolved[0].title, "Use check<Foo>");

        let unresolved = provide(
            &provider,
            "class T { void M() { check(typeof(Bar), v); } }",
            "check(typeof(Bar), v)",
        );
        assert!(unresolved.is_empty());

        let not_typeof = provide(&provider, "class T { void M() { check(x, v); } }", "check(x, v)");
        assert!(not_typeof.is_empty());
    }

    #[test]
    fn decline_is_idempotent() {
        let provider = FixProvider::UseGenericOverload;
        let source = "class Foo { } class T { void M() { check(typeof(Foo), v); } }";
        let first = provide(&provider, source, "check(typeof(Foo), v)");
        let second = provide(&provider, source, "check(typeof(Foo), v)");
        assert_eq!(first, second);
    }

    #[test]
    fn remove_parameters_needs_parameters() {
        let provider = FixProvider::RemoveParameters;
        assert_eq!(provide(&provider, "class T { void M(int x) { } }", "M").len(), 1);
        assert!(provide(&provider, "class T { void M() { } }", "M").is_empty());
    }

    #[test]
    fn assignable_from_renames_member() {
        let provider = FixProvider::UseAssignableFrom {
            replacements: vec![Replacement {
                from: "IsType".to_string(),
                to: "IsAssignableFrom".to_string(),
            }],
        };
        let actions = provide(
            &provider,
            "class T { void M() { Assert.IsType<IDisposable>(x); } }",
            "Assert.IsType<IDisposable>(x)",
        );
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].equivalence_key, "Use Assert.IsAssignableFrom");
    }

    #[test]
    fn unowned_rule_is_a_wiring_error() {
        let rule = FixRule::new(["X1008"], FixProvider::RemoveParameters);
        let model = SourceModel::parse("class T { void M(int x) { } }").unwrap();
        let diagnostic = diagnostic(&model, "X9999", "M");
        let semantic = DeclarationIndex::default();
        let err = rule
            .provide(&FixContext {
                model: &model,
                diagnostic: &diagnostic,
                semantic: &semantic,
            })
            .unwrap_err();
        assert!(err.is_configuration_error());
    }
}
