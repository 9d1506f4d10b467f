//! Built-in xUnit-style rules.
//!
//! All of them are structural; only [`AbstractTypeCheck`] consults the
//! semantic model, and only to classify a type argument.

use crate::config::{AttributeConfig, OverloadConfig};
use crate::matcher;
use crate::rules::RuleEvaluator;
use crate::semantic::SemanticModel;
use crate::source::{Diagnostic, Node, NodeKind, Severity, SourceModel};
use std::sync::Arc;

/// Attribute summary of one method declaration.
struct TestMethod<'a> {
    declaration: &'a Node,
    name: &'a Node,
    is_fact: bool,
    is_theory: bool,
    has_data: bool,
}

fn test_methods<'a>(model: &'a SourceModel, names: &AttributeConfig) -> Vec<TestMethod<'a>> {
    let fact = std::slice::from_ref(&names.fact);
    let theory = std::slice::from_ref(&names.theory);
    model
        .tree()
        .descendants()
        .filter(|n| n.kind() == NodeKind::MethodDeclaration)
        .filter_map(|declaration| {
            Some(TestMethod {
                declaration,
                name: matcher::declaration_name(declaration)?,
                is_fact: matcher::has_attribute(model, declaration, fact),
                is_theory: matcher::has_attribute(model, declaration, theory),
                has_data: matcher::has_attribute(model, declaration, &names.data),
            })
        })
        .collect()
}

fn has_parameters(declaration: &Node) -> bool {
    matcher::parameter_list(declaration)
        .is_some_and(|list| list.children_of_kind(NodeKind::Parameter).next().is_some())
}

/// `X1001`: a fact method must not have parameters.
pub struct FactWithParameters {
    attributes: AttributeConfig,
}

impl FactWithParameters {
    pub const ID: &'static str = "X1001";

    pub fn new(attributes: &AttributeConfig) -> Self {
        Self {
            attributes: attributes.clone(),
        }
    }
}

impl RuleEvaluator for FactWithParameters {
    fn rule_ids(&self) -> Vec<&str> {
        vec![Self::ID]
    }

    fn evaluate(&self, model: &SourceModel) -> Vec<Diagnostic> {
        test_methods(model, &self.attributes)
            .into_iter()
            .filter(|m| m.is_fact && !m.is_theory && has_parameters(m.declaration))
            .map(|m| {
                Diagnostic::new(Self::ID, m.name.span(), Severity::Error).with_message(format!(
                    "Fact method '{}' must not have parameters",
                    model.text_of(m.name)
                ))
            })
            .collect()
    }
}

/// `X1005`: a fact method should not carry test data.
pub struct FactWithTestData {
    attributes: AttributeConfig,
}

impl FactWithTestData {
    pub const ID: &'static str = "X1005";

    pub fn new(attributes: &AttributeConfig) -> Self {
        Self {
            attributes: attributes.clone(),
        }
    }
}

impl RuleEvaluator for FactWithTestData {
    fn rule_ids(&self) -> Vec<&str> {
        vec![Self::ID]
    }

    fn evaluate(&self, model: &SourceModel) -> Vec<Diagnostic> {
        test_methods(model, &self.attributes)
            .into_iter()
            .filter(|m| m.is_fact && !m.is_theory && m.has_data)
            .map(|m| {
                Diagnostic::new(Self::ID, m.name.span(), Severity::Warning).with_message(format!(
                    "Fact method '{}' should not have test data",
                    model.text_of(m.name)
                ))
            })
            .collect()
    }
}

/// `X1008`: test data on a method that is neither a fact nor a theory.
pub struct DataWithoutTheory {
    attributes: AttributeConfig,
}

impl DataWithoutTheory {
    pub const ID: &'static str = "X1008";

    pub fn new(attributes: &AttributeConfig) -> Self {
        Self {
            attributes: attributes.clone(),
        }
    }
}

impl RuleEvaluator for DataWithoutTheory {
    fn rule_ids(&self) -> Vec<&str> {
        vec![Self::ID]
    }

    fn evaluate(&self, model: &SourceModel) -> Vec<Diagnostic> {
        test_methods(model, &self.attributes)
            .into_iter()
            .filter(|m| m.has_data && !m.is_fact && !m.is_theory)
            .map(|m| {
                Diagnostic::new(Self::ID, m.name.span(), Severity::Warning).with_message(format!(
                    "Test data attribute on '{}' should only be used on a {}",
                    model.text_of(m.name),
                    self.attributes.theory
                ))
            })
            .collect()
    }
}

/// `X2007` / `X2015`: a `typeof`-taking assertion with a generic overload.
pub struct TypeofOverload {
    id: &'static str,
    members: Vec<String>,
    severity: Severity,
}

impl TypeofOverload {
    pub const TYPE_CHECK_ID: &'static str = "X2007";
    pub const THROWS_ID: &'static str = "X2015";

    pub fn type_checks(overloads: &OverloadConfig) -> Self {
        Self {
            id: Self::TYPE_CHECK_ID,
            members: overloads.type_checks.clone(),
            severity: Severity::Warning,
        }
    }

    pub fn throws(overloads: &OverloadConfig) -> Self {
        Self {
            id: Self::THROWS_ID,
            members: overloads.throws.clone(),
            severity: Severity::Warning,
        }
    }
}

impl RuleEvaluator for TypeofOverload {
    fn rule_ids(&self) -> Vec<&str> {
        vec![self.id]
    }

    fn evaluate(&self, model: &SourceModel) -> Vec<Diagnostic> {
        model
            .tree()
            .descendants()
            .filter(|n| n.kind() == NodeKind::Invocation)
            .filter_map(|call| {
                let member = matcher::simple_callee_name(model, call)?;
                if !self.members.iter().any(|m| m == member)
                    || !matcher::callee_type_arguments(call).is_empty()
                {
                    return None;
                }
                let ty = matcher::first_argument_type_expression(call)?;
                Some(
                    Diagnostic::new(self.id, call.span(), self.severity).with_message(format!(
                        "Use the generic overload of '{member}' for type '{}'",
                        model.text_of(ty)
                    )),
                )
            })
            .collect()
    }
}

/// `X2018`: exact type checks against interfaces or abstract classes always
/// fail.
pub struct AbstractTypeCheck {
    members: Vec<String>,
    semantic: Arc<dyn SemanticModel>,
}

impl AbstractTypeCheck {
    pub const ID: &'static str = "X2018";

    pub fn new(overloads: &OverloadConfig, semantic: Arc<dyn SemanticModel>) -> Self {
        Self {
            members: overloads.assignable.iter().map(|r| r.from.clone()).collect(),
            semantic,
        }
    }
}

impl RuleEvaluator for AbstractTypeCheck {
    fn rule_ids(&self) -> Vec<&str> {
        vec![Self::ID]
    }

    fn evaluate(&self, model: &SourceModel) -> Vec<Diagnostic> {
        model
            .tree()
            .descendants()
            .filter(|n| n.kind() == NodeKind::Invocation)
            .filter_map(|call| {
                let member = matcher::simple_callee_name(model, call)?;
                if !self.members.iter().any(|m| m == member) {
                    return None;
                }
                let arguments = matcher::callee_type_arguments(call);
                let [argument] = arguments.as_slice() else {
                    return None;
                };
                let ty = self.semantic.resolve_type(model, argument)?;
                if !ty.is_abstract_or_interface() {
                    return None;
                }
                let kind = if ty.is_abstract { "abstract class" } else { "interface" };
                Some(
                    Diagnostic::new(Self::ID, call.span(), Severity::Warning).with_message(format!(
                        "Do not use '{member}' with {kind} '{}'",
                        self.semantic.minimally_qualified_name(model, &ty)
                    )),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::semantic::DeclarationIndex;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn ids(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.rule_id.as_str()).collect()
    }

    #[test]
    fn fact_with_parameters_points_at_name() {
        let source = "class T { [Fact] public void Check(int x) { } [Fact] public void Ok() { } }";
        let model = SourceModel::parse(source).unwrap();
        let found = FactWithParameters::new(&config().attributes).evaluate(&model);
        assert_eq!(found.len(), 1);
        assert_eq!(model.slice(found[0].span), Some("Check"));
        assert_eq!(found[0].severity, Severity::Error);
    }

    #[test]
    fn fact_with_data() {
        let source = "class T { [Fact, InlineData(1)] public void A() { } [Theory, InlineData(1)] public void B(int x) { } }";
        let model = SourceModel::parse(source).unwrap();
        let found = FactWithTestData::new(&config().attributes).evaluate(&model);
        assert_eq!(found.len(), 1);
        assert_eq!(model.slice(found[0].span), Some("A"));
    }

    #[test]
    fn data_without_theory() {
        let source = "class T {\n    [MemberData(nameof(Cases))]\n    public void A(int x) { }\n    [Theory]\n    [InlineData(1)]\n    public void B(int x) { }\n}";
        let model = SourceModel::parse(source).unwrap();
        let found = DataWithoutTheory::new(&config().attributes).evaluate(&model);
        assert_eq!(ids(&found), vec!["X1008"]);
        assert_eq!(model.slice(found[0].span), Some("A"));
    }

    #[test]
    fn typeof_overloads() {
        let source = r#"
class T {
    void M() {
        Assert.IsType(typeof(string), value);
        Assert.IsType<string>(value);
        Assert.Throws(typeof(Exception), () => Run());
        Assert.Equal(typeof(string), value);
    }
}"#;
        let model = SourceModel::parse(source).unwrap();
        let checks = TypeofOverload::type_checks(&config().overloads).evaluate(&model);
        assert_eq!(checks.len(), 1);
        assert_eq!(
            model.slice(checks[0].span),
            Some("Assert.IsType(typeof(string), value)")
        );

        let throws = TypeofOverload::throws(&config().overloads).evaluate(&model);
        assert_eq!(ids(&throws), vec!["X2015"]);
    }

    #[test]
    fn abstract_type_check() {
        let source = r#"
using System;
abstract class Shape { }
class Circle : Shape { }
class T {
    void M() {
        Assert.IsType<IDisposable>(a);
        Assert.IsNotType<Shape>(b);
        Assert.IsType<Circle>(c);
        Assert.IsType<Unknown>(d);
    }
}"#;
        let model = SourceModel::parse(source).unwrap();
        let semantic = Arc::new(DeclarationIndex::from_config(&config().semantic));
        let found = AbstractTypeCheck::new(&config().overloads, semantic).evaluate(&model);
        let spans: Vec<_> = found.iter().filter_map(|d| model.slice(d.span)).collect();
        assert_eq!(
            spans,
            vec!["Assert.IsType<IDisposable>(a)", "Assert.IsNotType<Shape>(b)"]
        );
        assert!(found[1].message.contains("abstract class"));
    }
}
