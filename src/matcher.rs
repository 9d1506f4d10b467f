//! Structural lookups from a diagnostic span to the node a fix targets.
//!
//! Everything here is purely syntactic: names are compared as written and no
//! symbol resolution takes place.

use crate::source::{Node, NodeKind, SourceModel, Span};

/// A node together with the chain of ancestors that leads to it.
///
/// Nodes hold no parent pointers; callers that need to look upwards use the
/// ancestor path recorded during descent.
#[derive(Debug, Clone)]
pub struct NodeRef<'a> {
    node: &'a Node,
    ancestors: Vec<&'a Node>,
}

impl<'a> NodeRef<'a> {
    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// Ancestors from the root down to the immediate parent.
    pub fn ancestors(&self) -> &[&'a Node] {
        &self.ancestors
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.ancestors.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

/// Path of nodes from `root` down to the innermost node containing `span`.
///
/// Descent picks the first non-whitespace child containing the span, so the
/// result is deterministic for a given tree and span.
pub fn path_to(root: &Node, span: Span) -> Option<Vec<&Node>> {
    if !root.span().contains(span) {
        return None;
    }

    let mut path = vec![root];
    let mut current = root;
    'descend: loop {
        for child in current.children() {
            if child.kind() == NodeKind::Trivia {
                continue;
            }
            if child.span().contains(span) {
                path.push(child);
                current = child;
                continue 'descend;
            }
        }
        return Some(path);
    }
}

/// Innermost node of kind `kind` enclosing `span` (the node at the span
/// itself included).
///
/// `None` means "no fix available", not an error.
pub fn find_enclosing(model: &SourceModel, span: Span, kind: NodeKind) -> Option<NodeRef<'_>> {
    find_enclosing_where(model, span, |k| k == kind)
}

/// Innermost enclosing node whose kind satisfies `predicate`.
pub fn find_enclosing_where(
    model: &SourceModel,
    span: Span,
    predicate: impl Fn(NodeKind) -> bool,
) -> Option<NodeRef<'_>> {
    let path = path_to(model.tree(), span)?;
    let index = path.iter().rposition(|n| predicate(n.kind()))?;
    Some(NodeRef {
        node: path[index],
        ancestors: path[..index].to_vec(),
    })
}

/// Locate the node of `kind` whose span is exactly `span`.
pub fn find_exact(model: &SourceModel, span: Span, kind: NodeKind) -> Option<&Node> {
    path_to(model.tree(), span)?
        .into_iter()
        .rev()
        .find(|n| n.kind() == kind && n.span() == span)
}

/// The identifier naming a simple-name expression.
///
/// `Foo` → `Foo`, `Foo<T>` → `Foo`, `a.b.Foo` / `a.Foo<T>` → `Foo`.
pub fn simple_name_node(expr: &Node) -> Option<&Node> {
    match expr.kind() {
        NodeKind::Identifier => Some(expr),
        NodeKind::GenericName => expr.first_child_of_kind(NodeKind::Identifier),
        NodeKind::MemberAccess => expr.child_by_field("name").and_then(simple_name_node),
        NodeKind::QualifiedName => expr
            .child_by_field("name")
            .or_else(|| expr.named_children().last())
            .and_then(simple_name_node),
        _ => None,
    }
}

/// The expression being invoked (`Assert.IsType` in `Assert.IsType(x)`).
pub fn callee(invocation: &Node) -> Option<&Node> {
    invocation
        .child_by_field("function")
        .or_else(|| invocation.named_children().next())
}

/// The identifier node naming the invoked member.
pub fn callee_name_node(invocation: &Node) -> Option<&Node> {
    callee(invocation).and_then(simple_name_node)
}

/// Type arguments written on the invoked member (`IsType<T>` → `[T]`).
/// Empty for a non-generic call.
pub fn callee_type_arguments(invocation: &Node) -> Vec<&Node> {
    let generic = callee(invocation).and_then(|c| match c.kind() {
        NodeKind::GenericName => Some(c),
        NodeKind::MemberAccess => c
            .child_by_field("name")
            .filter(|n| n.kind() == NodeKind::GenericName),
        _ => None,
    });
    generic
        .and_then(|g| g.first_child_of_kind(NodeKind::TypeArgumentList))
        .map(|list| list.named_children().collect())
        .unwrap_or_default()
}

/// Simple name of the invoked member, without qualifier or type arguments.
pub fn simple_callee_name<'m>(model: &'m SourceModel, invocation: &Node) -> Option<&'m str> {
    callee_name_node(invocation).map(|n| model.text_of(n))
}

/// Arguments of an invocation in source order.
pub fn arguments(invocation: &Node) -> Vec<&Node> {
    invocation
        .child_by_field("arguments")
        .or_else(|| invocation.first_child_of_kind(NodeKind::ArgumentList))
        .map(|list| list.children_of_kind(NodeKind::Argument).collect())
        .unwrap_or_default()
}

/// The value expression of an argument, skipping `name:` and `ref`/`out`.
pub fn argument_expression(argument: &Node) -> Option<&Node> {
    argument
        .named_children()
        .filter(|c| c.field() != Some("name"))
        .last()
}

/// Operand of `typeof(T)`.
pub fn typeof_operand(typeof_expr: &Node) -> Option<&Node> {
    if typeof_expr.kind() != NodeKind::TypeOf {
        return None;
    }
    typeof_expr
        .child_by_field("type")
        .or_else(|| typeof_expr.named_children().next())
}

/// If the first argument is `typeof(T)`, the type expression `T`.
pub fn first_argument_type_expression(invocation: &Node) -> Option<&Node> {
    let first = *arguments(invocation).first()?;
    argument_expression(first).and_then(typeof_operand)
}

/// Attribute lists written directly on a declaration.
pub fn attribute_lists(declaration: &Node) -> impl Iterator<Item = &Node> {
    declaration.children_of_kind(NodeKind::AttributeList)
}

pub fn attributes(attribute_list: &Node) -> impl Iterator<Item = &Node> {
    attribute_list.children_of_kind(NodeKind::Attribute)
}

/// All attributes on a declaration, across all of its lists.
pub fn declaration_attributes(declaration: &Node) -> impl Iterator<Item = &Node> {
    attribute_lists(declaration).flat_map(attributes)
}

/// Simple name of an attribute (`Xunit.InlineData(1)` → `InlineData`).
pub fn attribute_name<'m>(model: &'m SourceModel, attribute: &Node) -> Option<&'m str> {
    attribute
        .child_by_field("name")
        .or_else(|| attribute.named_children().next())
        .and_then(simple_name_node)
        .map(|n| model.text_of(n))
}

/// Compare attribute names the way attribute syntax resolves them: the
/// `Attribute` suffix is optional on either side.
pub fn attribute_name_matches(written: &str, wanted: &str) -> bool {
    let strip = |name: &'_ str| -> String {
        name.strip_suffix("Attribute")
            .filter(|s| !s.is_empty())
            .unwrap_or(name)
            .to_string()
    };
    strip(written) == strip(wanted)
}

/// True if the declaration carries an attribute named like any of `names`.
pub fn has_attribute(model: &SourceModel, declaration: &Node, names: &[String]) -> bool {
    declaration_attributes(declaration).any(|attr| {
        attribute_name(model, attr)
            .is_some_and(|name| names.iter().any(|w| attribute_name_matches(name, w)))
    })
}

pub fn declaration_name(declaration: &Node) -> Option<&Node> {
    declaration.child_by_field("name")
}

pub fn parameter_list(declaration: &Node) -> Option<&Node> {
    declaration
        .child_by_field("parameters")
        .or_else(|| declaration.first_child_of_kind(NodeKind::ParameterList))
}
