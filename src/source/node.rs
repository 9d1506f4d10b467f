use crate::source::span::Span;

/// Closed set of syntax kinds the fix engine reasons about.
///
/// Grammar kinds with no dedicated variant land in [`NodeKind::Other`];
/// anonymous grammar tokens (`[`, `(`, keywords) are [`NodeKind::Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    CompilationUnit,
    NamespaceDeclaration,
    UsingDirective,
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    RecordDeclaration,
    EnumDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    Modifier,
    AttributeList,
    Attribute,
    AttributeArgumentList,
    ParameterList,
    Parameter,
    Block,
    Invocation,
    MemberAccess,
    ArgumentList,
    Argument,
    TypeOf,
    Identifier,
    GenericName,
    TypeArgumentList,
    QualifiedName,
    PredefinedType,
    Comment,
    /// Anonymous grammar token
    Token,
    /// Whitespace between tokens
    Trivia,
    /// Parse error or missing token
    Error,
    Other(&'static str),
}

impl NodeKind {
    /// Map a tree-sitter C# grammar kind onto the closed set.
    pub fn from_grammar(kind: &'static str, named: bool) -> Self {
        if !named {
            return NodeKind::Token;
        }
        match kind {
            "compilation_unit" => NodeKind::CompilationUnit,
            "namespace_declaration" | "file_scoped_namespace_declaration" => {
                NodeKind::NamespaceDeclaration
            }
            "using_directive" => NodeKind::UsingDirective,
            "class_declaration" => NodeKind::ClassDeclaration,
            "struct_declaration" => NodeKind::StructDeclaration,
            "interface_declaration" => NodeKind::InterfaceDeclaration,
            "record_declaration" | "record_struct_declaration" => NodeKind::RecordDeclaration,
            "enum_declaration" => NodeKind::EnumDeclaration,
            "method_declaration" => NodeKind::MethodDeclaration,
            "constructor_declaration" => NodeKind::ConstructorDeclaration,
            "modifier" => NodeKind::Modifier,
            "attribute_list" => NodeKind::AttributeList,
            "attribute" => NodeKind::Attribute,
            "attribute_argument_list" => NodeKind::AttributeArgumentList,
            "parameter_list" => NodeKind::ParameterList,
            "parameter" => NodeKind::Parameter,
            "block" => NodeKind::Block,
            "invocation_expression" => NodeKind::Invocation,
            "member_access_expression" => NodeKind::MemberAccess,
            "argument_list" => NodeKind::ArgumentList,
            "argument" => NodeKind::Argument,
            "typeof_expression" => NodeKind::TypeOf,
            "identifier" => NodeKind::Identifier,
            "generic_name" => NodeKind::GenericName,
            "type_argument_list" => NodeKind::TypeArgumentList,
            "qualified_name" => NodeKind::QualifiedName,
            "predefined_type" => NodeKind::PredefinedType,
            "comment" => NodeKind::Comment,
            "ERROR" => NodeKind::Error,
            other => NodeKind::Other(other),
        }
    }

    /// Declarations that introduce a named type.
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::ClassDeclaration
                | NodeKind::StructDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::RecordDeclaration
                | NodeKind::EnumDeclaration
        )
    }

    /// Token, whitespace and comment nodes carry no structure of their own.
    pub fn is_lexical(self) -> bool {
        matches!(self, NodeKind::Token | NodeKind::Trivia | NodeKind::Comment)
    }
}

/// An owned syntax tree node.
///
/// Leaves carry their source text, so concatenating the leaves of a tree in
/// order reproduces the text it was parsed from. Each node is owned by its
/// parent; there are no back-references (see [`crate::matcher::NodeRef`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    span: Span,
    field: Option<&'static str>,
    text: Option<String>,
    children: Vec<Node>,
}

impl Node {
    pub fn leaf(
        kind: NodeKind,
        span: Span,
        field: Option<&'static str>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            span,
            field,
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    pub fn branch(
        kind: NodeKind,
        span: Span,
        field: Option<&'static str>,
        children: Vec<Node>,
    ) -> Self {
        Self {
            kind,
            span,
            field,
            text: None,
            children,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Grammar field name under which the parent holds this node.
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// Source text of a leaf; `None` for interior nodes.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Children that are neither tokens, whitespace nor comments.
    pub fn named_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|c| !c.kind.is_lexical())
    }

    pub fn child_by_field(&self, field: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.field == Some(field))
    }

    pub fn children_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    pub fn first_child_of_kind(&self, kind: NodeKind) -> Option<&Node> {
        self.children_of_kind(kind).next()
    }

    /// True if any direct child is the anonymous token `token`.
    pub fn has_token(&self, token: &str) -> bool {
        self.children
            .iter()
            .any(|c| c.kind == NodeKind::Token && c.text() == Some(token))
    }

    /// Pre-order traversal of this node and all its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn error_spans(&self) -> Vec<Span> {
        self.descendants()
            .filter(|n| n.kind == NodeKind::Error)
            .map(|n| n.span)
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.descendants().any(|n| n.kind == NodeKind::Error)
    }

    /// Reassemble the source text covered by this node.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.span.len());
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.render_into(out);
        }
    }
}

/// Pre-order iterator returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        // "f(x)"
        Node::branch(
            NodeKind::Invocation,
            Span::new(0, 4),
            None,
            vec![
                Node::leaf(NodeKind::Identifier, Span::new(0, 1), Some("function"), "f"),
                Node::branch(
                    NodeKind::ArgumentList,
                    Span::new(1, 4),
                    Some("arguments"),
                    vec![
                        Node::leaf(NodeKind::Token, Span::new(1, 2), None, "("),
                        Node::leaf(NodeKind::Identifier, Span::new(2, 3), None, "x"),
                        Node::leaf(NodeKind::Token, Span::new(3, 4), None, ")"),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn render_concatenates_leaves() {
        assert_eq!(sample().render(), "f(x)");
    }

    #[test]
    fn descendants_are_preorder() {
        let tree = sample();
        let kinds: Vec<_> = tree.descendants().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Invocation,
                NodeKind::Identifier,
                NodeKind::ArgumentList,
                NodeKind::Token,
                NodeKind::Identifier,
                NodeKind::Token,
            ]
        );
    }

    #[test]
    fn field_lookup_and_named_children() {
        let tree = sample();
        let args = tree.child_by_field("arguments").unwrap();
        assert_eq!(args.kind(), NodeKind::ArgumentList);
        assert_eq!(args.named_children().count(), 1);
        assert!(args.has_token("("));
    }

    #[test]
    fn grammar_mapping() {
        assert_eq!(
            NodeKind::from_grammar("method_declaration", true),
            NodeKind::MethodDeclaration
        );
        assert_eq!(NodeKind::from_grammar("(", false), NodeKind::Token);
        assert_eq!(
            NodeKind::from_grammar("lambda_expression", true),
            NodeKind::Other("lambda_expression")
        );
    }
}
