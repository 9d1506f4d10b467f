use crate::source::{Node, NodeKind, Span};
use crate::ts::errors::TreeSitterError;
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Parser, Tree};

/// Parsing collaborator: turns text into an owned [`Node`] tree.
///
/// Implementations must be total: malformed input yields error nodes, not
/// an `Err`. `Err` is reserved for the parser itself being unusable.
pub trait SyntaxParser {
    fn parse_syntax(&mut self, text: &str) -> Result<Node, TreeSitterError>;
}

/// Tree-sitter parser for C# source code.
pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    /// Create a parser using the C# grammar bundled with ast-grep-language.
    pub fn new() -> Result<Self, TreeSitterError> {
        let mut parser = Parser::new();
        let ts_lang = SupportLang::CSharp.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| TreeSitterError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse source code into a tree-sitter Tree.
    pub fn parse_tree(&mut self, source: &str) -> Result<Tree, TreeSitterError> {
        self.parser
            .parse(source, None)
            .ok_or(TreeSitterError::ParseFailed)
    }

    /// Parse source code and lower it into an owned tree.
    pub fn parse(&mut self, source: &str) -> Result<Node, TreeSitterError> {
        let tree = self.parse_tree(source)?;
        Ok(lower(tree.root_node(), source))
    }
}

impl SyntaxParser for CSharpParser {
    fn parse_syntax(&mut self, text: &str) -> Result<Node, TreeSitterError> {
        self.parse(text)
    }
}

/// Lower a tree-sitter CST into an owned [`Node`] tree covering all of
/// `source`.
///
/// Gaps between siblings become [`NodeKind::Trivia`] leaves, so the leaves
/// of the result tile `[0, source.len())` exactly.
pub fn lower(root: tree_sitter::Node<'_>, source: &str) -> Node {
    lower_node(root, None, 0, source.len(), source)
}

fn lower_node(
    node: tree_sitter::Node<'_>,
    field: Option<&'static str>,
    start: usize,
    end: usize,
    source: &str,
) -> Node {
    let kind = if node.is_error() || node.is_missing() {
        NodeKind::Error
    } else {
        NodeKind::from_grammar(node.kind(), node.is_named())
    };
    let span = Span::new(start, end);

    let mut cursor = node.walk();
    if !cursor.goto_first_child() {
        let text = source.get(start..end).unwrap_or_default();
        return Node::leaf(kind, span, field, text);
    }

    let mut children = Vec::new();
    let mut pos = start;
    loop {
        let child = cursor.node();
        let child_field = cursor.field_name();
        let child_start = child.start_byte().clamp(pos, end);
        let child_end = child.end_byte().clamp(child_start, end);

        if child_start > pos {
            children.push(trivia(pos, child_start, source));
        }
        children.push(lower_node(child, child_field, child_start, child_end, source));
        pos = child_end;

        if !cursor.goto_next_sibling() {
            break;
        }
    }
    if pos < end {
        children.push(trivia(pos, end, source));
    }

    Node::branch(kind, span, field, children)
}

fn trivia(start: usize, end: usize, source: &str) -> Node {
    Node::leaf(
        NodeKind::Trivia,
        Span::new(start, end),
        None,
        source.get(start..end).unwrap_or_default(),
    )
}

/// Render a tree back to source text.
pub fn render(tree: &Node) -> String {
    tree.render()
}
