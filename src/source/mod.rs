//! Immutable source snapshots: text, owned syntax tree and diagnostics.

pub mod model;
pub mod node;
pub mod span;
pub mod text;

pub use model::{Diagnostic, Severity, SnapshotId, SourceModel};
pub use node::{Descendants, Node, NodeKind};
pub use span::Span;
pub use text::{detect_newline, line_indent, line_start, LineEndings, LineIndex};
