use crate::pool;
use crate::source::node::Node;
use crate::source::span::Span;
use crate::source::text::{detect_newline, LineIndex};
use crate::ts::{SyntaxParser, TreeSitterError};
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Diagnostic severity as reported by rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// A located rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule_id: String,
    pub span: Span,
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
}

impl Diagnostic {
    pub fn new(rule_id: impl Into<String>, span: Span, severity: Severity) -> Self {
        Self {
            rule_id: rule_id.into(),
            span,
            severity,
            message: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Identity of one text snapshot (xxh3 of its contents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(u64);

impl SnapshotId {
    pub fn of(text: &str) -> Self {
        SnapshotId(xxh3_64(text.as_bytes()))
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Text, its parse tree and the diagnostics reported against it.
///
/// A model is never mutated; rewriting produces a new model whose tree is a
/// fresh parse of the new text.
#[derive(Debug, Clone)]
pub struct SourceModel {
    text: String,
    tree: Node,
    diagnostics: Vec<Diagnostic>,
    id: SnapshotId,
}

impl SourceModel {
    /// Parse `text` with the thread's pooled C# parser.
    pub fn parse(text: impl Into<String>) -> Result<Self, TreeSitterError> {
        let text = text.into();
        let tree = pool::with_parser(|parser| parser.parse(&text))??;
        Ok(Self::assemble(text, tree))
    }

    /// Parse `text` with a caller-supplied parser.
    pub fn parse_with(
        parser: &mut impl SyntaxParser,
        text: impl Into<String>,
    ) -> Result<Self, TreeSitterError> {
        let text = text.into();
        let tree = parser.parse_syntax(&text)?;
        Ok(Self::assemble(text, tree))
    }

    fn assemble(text: String, tree: Node) -> Self {
        let id = SnapshotId::of(&text);
        Self {
            text,
            tree,
            diagnostics: Vec::new(),
            id,
        }
    }

    /// The same snapshot with `diagnostics` attached.
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text at `span`, or `None` if the span is out of bounds or splits a
    /// character.
    pub fn slice(&self, span: Span) -> Option<&str> {
        self.text.get(span.range())
    }

    /// Source text covered by a node of this model's tree.
    pub fn text_of(&self, node: &Node) -> &str {
        self.slice(node.span()).unwrap_or_default()
    }

    pub fn newline(&self) -> &'static str {
        detect_newline(&self.text)
    }

    pub fn line_index(&self) -> LineIndex {
        LineIndex::new(&self.text)
    }
}
