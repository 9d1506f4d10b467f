//! Semantic lookup: just enough type resolution to gate type-dependent fixes.
//!
//! The engine treats this as an external oracle behind [`SemanticModel`].
//! [`DeclarationIndex`] is the built-in implementation: it knows the C#
//! keyword types, the types declared in the compilation unit being fixed,
//! and a configured list of well-known external types.

use crate::config::SemanticConfig;
use crate::matcher;
use crate::source::{Node, NodeKind, SourceModel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    /// Built-in keyword type (`int`, `string`, ...)
    Keyword,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// Dotted namespace; empty for keywords and the global namespace
    pub namespace: String,
    pub name: String,
    pub kind: TypeKind,
    pub is_abstract: bool,
    /// Resolved type arguments of a constructed generic type
    pub arguments: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            is_abstract: false,
            arguments: Vec::new(),
        }
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new("", name, TypeKind::Keyword)
    }

    /// Parse a dotted full name such as `System.IO.Stream`.
    pub fn from_full_name(full_name: &str, kind: TypeKind) -> Self {
        match full_name.rsplit_once('.') {
            Some((namespace, name)) => Self::new(namespace, name, kind),
            None => Self::new("", full_name, kind),
        }
    }

    pub fn abstract_type(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Interfaces and abstract classes cannot be the exact runtime type of
    /// an object.
    pub fn is_abstract_or_interface(&self) -> bool {
        self.kind == TypeKind::Interface || self.is_abstract
    }

    fn same_definition(&self, other: &TypeDescriptor) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }
}

/// The semantic-lookup collaborator.
///
/// Implementations must be safe to share across verification threads.
pub trait SemanticModel: Send + Sync {
    /// Resolve a type expression, or `None` if it cannot be resolved.
    fn resolve_type(&self, model: &SourceModel, expr: &Node) -> Option<TypeDescriptor>;

    /// Shortest name that denotes `ty` at the top of `model`.
    fn minimally_qualified_name(&self, model: &SourceModel, ty: &TypeDescriptor) -> String;
}

const KEYWORD_TYPES: &[&str] = &[
    "bool", "byte", "sbyte", "char", "decimal", "double", "float", "int", "uint", "nint",
    "nuint", "long", "ulong", "short", "ushort", "object", "string", "dynamic",
];

/// Declaration-based resolver.
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    known: Vec<TypeDescriptor>,
}

impl DeclarationIndex {
    pub fn new(known: Vec<TypeDescriptor>) -> Self {
        Self { known }
    }

    pub fn from_config(config: &SemanticConfig) -> Self {
        Self::new(
            config
                .known_types
                .iter()
                .map(|k| {
                    TypeDescriptor::from_full_name(&k.name, k.kind).abstract_type(k.is_abstract)
                })
                .collect(),
        )
    }

    pub fn known_types(&self) -> &[TypeDescriptor] {
        &self.known
    }

    fn lookup_simple(&self, scope: &UnitScope, name: &str) -> Option<TypeDescriptor> {
        if let Some(declared) = scope.declared.iter().find(|t| t.name == name) {
            return Some(declared.clone());
        }
        self.known
            .iter()
            .find(|t| t.name == name && scope.sees_namespace(&t.namespace))
            .cloned()
    }

    fn lookup_qualified(
        &self,
        scope: &UnitScope,
        namespace: &str,
        name: &str,
    ) -> Option<TypeDescriptor> {
        scope
            .declared
            .iter()
            .chain(self.known.iter())
            .find(|t| t.namespace == namespace && t.name == name)
            .cloned()
    }

    fn resolve_in(
        &self,
        model: &SourceModel,
        scope: &UnitScope,
        expr: &Node,
    ) -> Option<TypeDescriptor> {
        match expr.kind() {
            NodeKind::PredefinedType => {
                let name = model.text_of(expr);
                KEYWORD_TYPES
                    .contains(&name)
                    .then(|| TypeDescriptor::keyword(name))
            }
            NodeKind::Identifier => self.lookup_simple(scope, model.text_of(expr)),
            NodeKind::GenericName => {
                let ident = expr.first_child_of_kind(NodeKind::Identifier)?;
                let mut ty = self.lookup_simple(scope, model.text_of(ident))?;
                ty.arguments = self.resolve_arguments(model, scope, expr)?;
                Some(ty)
            }
            NodeKind::QualifiedName => {
                let qualifier = expr.child_by_field("qualifier")?;
                let name_node = expr.child_by_field("name")?;
                let namespace = compact(model.text_of(qualifier));
                let namespace = namespace.strip_prefix("global::").unwrap_or(&namespace);
                let simple = matcher::simple_name_node(name_node)?;
                let mut ty = self.lookup_qualified(scope, namespace, model.text_of(simple))?;
                if name_node.kind() == NodeKind::GenericName {
                    ty.arguments = self.resolve_arguments(model, scope, name_node)?;
                }
                Some(ty)
            }
            _ => None,
        }
    }

    fn resolve_arguments(
        &self,
        model: &SourceModel,
        scope: &UnitScope,
        generic: &Node,
    ) -> Option<Vec<TypeDescriptor>> {
        let Some(list) = generic.first_child_of_kind(NodeKind::TypeArgumentList) else {
            return Some(Vec::new());
        };
        list.named_children()
            .map(|arg| self.resolve_in(model, scope, arg))
            .collect()
    }
}

impl SemanticModel for DeclarationIndex {
    fn resolve_type(&self, model: &SourceModel, expr: &Node) -> Option<TypeDescriptor> {
        let scope = UnitScope::scan(model);
        self.resolve_in(model, &scope, expr)
    }

    fn minimally_qualified_name(&self, model: &SourceModel, ty: &TypeDescriptor) -> String {
        let scope = UnitScope::scan(model);
        scope.display(ty)
    }
}

/// Names visible at the top level of one compilation unit.
#[derive(Debug, Default)]
struct UnitScope {
    declared: Vec<TypeDescriptor>,
    namespaces: Vec<String>,
    usings: Vec<String>,
}

impl UnitScope {
    fn scan(model: &SourceModel) -> Self {
        let mut scope = UnitScope::default();
        scope.walk(model, model.tree(), "");
        scope
    }

    fn walk(&mut self, model: &SourceModel, node: &Node, namespace: &str) {
        // File-scoped `namespace N;` applies to the siblings that follow it
        let mut current = namespace.to_string();
        for child in node.children() {
            match child.kind() {
                NodeKind::NamespaceDeclaration => {
                    let Some(name) = child.child_by_field("name") else {
                        continue;
                    };
                    let full = join(namespace, &compact(model.text_of(name)));
                    self.namespaces.push(full.clone());
                    if child.has_token(";") {
                        current = full.clone();
                    }
                    self.walk(model, child, &full);
                }
                NodeKind::UsingDirective => {
                    if child.has_token("=") || child.has_token("static") {
                        continue;
                    }
                    if let Some(target) = child.named_children().last() {
                        self.usings.push(compact(model.text_of(target)));
                    }
                }
                kind if kind.is_type_declaration() => {
                    if let Some(ty) = declared_type(model, child, &current) {
                        self.declared.push(ty);
                    }
                    self.walk(model, child, &current);
                }
                kind if kind.is_lexical() => {}
                _ => self.walk(model, child, &current),
            }
        }
    }

    fn sees_namespace(&self, namespace: &str) -> bool {
        namespace.is_empty()
            || self.usings.iter().any(|u| u == namespace)
            || self.namespaces.iter().any(|n| n == namespace)
    }

    fn display(&self, ty: &TypeDescriptor) -> String {
        let visible = ty.kind == TypeKind::Keyword
            || self.declared.iter().any(|d| d.same_definition(ty))
            || self.sees_namespace(&ty.namespace);
        let mut name = if visible { ty.name.clone() } else { ty.full_name() };
        if !ty.arguments.is_empty() {
            let args: Vec<String> = ty.arguments.iter().map(|a| self.display(a)).collect();
            name.push('<');
            name.push_str(&args.join(", "));
            name.push('>');
        }
        name
    }
}

fn declared_type(model: &SourceModel, decl: &Node, namespace: &str) -> Option<TypeDescriptor> {
    let name = matcher::declaration_name(decl)?;
    let kind = match decl.kind() {
        NodeKind::StructDeclaration => TypeKind::Struct,
        NodeKind::InterfaceDeclaration => TypeKind::Interface,
        NodeKind::EnumDeclaration => TypeKind::Enum,
        NodeKind::RecordDeclaration => TypeKind::Record,
        _ => TypeKind::Class,
    };
    let is_abstract = decl
        .children_of_kind(NodeKind::Modifier)
        .any(|m| model.text_of(m) == "abstract");
    Some(TypeDescriptor::new(namespace, model.text_of(name), kind).abstract_type(is_abstract))
}

fn join(outer: &str, inner: &str) -> String {
    if outer.is_empty() {
        inner.to_string()
    } else {
        format!("{outer}.{inner}")
    }
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
