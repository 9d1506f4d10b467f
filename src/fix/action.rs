use crate::edit::Edit;
use crate::fix::synth::EditSynthesizer;
use crate::fix::FixError;
use crate::matcher;
use crate::source::{Node, NodeKind, SnapshotId, SourceModel, Span};

/// Stable address of a node within one snapshot.
///
/// Nodes are owned by their tree; actions refer to them by kind and span so
/// an action can be held, sent between threads and synthesized later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub span: Span,
}

impl NodeKey {
    pub fn of(node: &Node) -> Self {
        Self {
            kind: node.kind(),
            span: node.span(),
        }
    }

    /// Find the addressed node in `model`.
    pub fn resolve<'m>(&self, model: &'m SourceModel) -> Result<&'m Node, FixError> {
        matcher::find_exact(model, self.span, self.kind).ok_or(FixError::TargetNotFound {
            kind: self.kind,
            span: self.span,
        })
    }
}

/// What a code action means to do, before it is lowered to edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Add `[attribute]` in front of the declaration's attribute lists.
    InsertAttribute { declaration: NodeKey, attribute: String },
    /// Remove every attribute on the declaration named like one of `names`.
    RemoveAttributes {
        declaration: NodeKey,
        names: Vec<String>,
    },
    /// `M(typeof(T), rest)` → `M<T>(rest)`.
    UseGenericOverload {
        invocation: NodeKey,
        type_argument: String,
    },
    /// Replace one node's text wholesale.
    ReplaceNode { target: NodeKey, text: String },
}

/// A named, deduplicable proposal to fix one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAction {
    pub title: String,
    pub equivalence_key: String,
    /// Snapshot the intent's node keys refer to
    pub snapshot: SnapshotId,
    pub intent: Intent,
}

impl CodeAction {
    pub fn new(
        model: &SourceModel,
        title: impl Into<String>,
        equivalence_key: impl Into<String>,
        intent: Intent,
    ) -> Self {
        Self {
            title: title.into(),
            equivalence_key: equivalence_key.into(),
            snapshot: model.id(),
            intent,
        }
    }

    /// Lower this action to edits against `model`.
    pub fn synthesize(&self, model: &SourceModel) -> Result<Vec<Edit>, FixError> {
        EditSynthesizer::synthesize(model, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_key_round_trips_within_snapshot() {
        let model = SourceModel::parse("class C { void M(int x) { } }").unwrap();
        let list = model
            .tree()
            .descendants()
            .find(|n| n.kind() == NodeKind::ParameterList)
            .unwrap();
        let key = NodeKey::of(list);
        assert!(std::ptr::eq(key.resolve(&model).unwrap(), list));

        let other = SourceModel::parse("class C { }").unwrap();
        assert!(matches!(
            key.resolve(&other),
            Err(FixError::TargetNotFound { .. })
        ));
    }
}
