use crate::edit::{splice, Edit};
use crate::fix::action::CodeAction;
use crate::fix::{Conflict, ConflictReport, FixError};
use crate::source::SourceModel;
use std::collections::HashSet;

/// Commits the edits of many code actions in one rewrite, or none of them.
#[derive(Debug, Clone)]
pub struct BatchApplier {
    check_syntax: bool,
}

impl Default for BatchApplier {
    fn default() -> Self {
        Self { check_syntax: true }
    }
}

/// Result of a committed batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Fresh parse of the rewritten text
    pub model: SourceModel,
    /// Equivalence keys of the actions applied, in order
    pub applied: Vec<String>,
    pub edit_count: usize,
    /// Syntax errors present after the rewrite that were not there before
    pub introduced_errors: usize,
}

impl BatchOutcome {
    pub fn text(&self) -> &str {
        self.model.text()
    }
}

impl BatchApplier {
    pub fn new(check_syntax: bool) -> Self {
        Self { check_syntax }
    }

    /// Apply `actions` to `model`.
    ///
    /// Actions are deduplicated by equivalence key, first occurrence wins.
    /// If any two surviving edits overlap, nothing is applied and the
    /// conflicting keys are reported.
    pub fn apply(
        &self,
        model: &SourceModel,
        actions: &[CodeAction],
    ) -> Result<BatchOutcome, FixError> {
        let mut seen = HashSet::new();
        let mut batches = Vec::new();
        for action in actions {
            if !seen.insert(action.equivalence_key.as_str()) {
                tracing::debug!(key = %action.equivalence_key, "dropping duplicate action");
                continue;
            }
            batches.push((action.equivalence_key.as_str(), action.synthesize(model)?));
        }
        self.commit(model, batches)
    }

    /// Apply every action carrying `key` (fix all occurrences).
    ///
    /// Actions whose synthesized edits are identical are applied once.
    pub fn apply_fix_all(
        &self,
        model: &SourceModel,
        actions: &[CodeAction],
        key: &str,
    ) -> Result<BatchOutcome, FixError> {
        let matching: Vec<&CodeAction> = actions
            .iter()
            .filter(|a| a.equivalence_key == key)
            .collect();
        if matching.is_empty() {
            return Err(FixError::unknown_key(
                key,
                actions.iter().map(|a| a.equivalence_key.clone()),
            ));
        }

        self.commit(model, distinct_edit_sets(model, matching)?)
    }

    /// Apply every action in `actions`, whatever its key.
    ///
    /// Unlike [`BatchApplier::apply`], actions sharing a key are all kept;
    /// only actions whose synthesized edits are identical are applied once.
    pub fn apply_each(
        &self,
        model: &SourceModel,
        actions: &[CodeAction],
    ) -> Result<BatchOutcome, FixError> {
        self.commit(model, distinct_edit_sets(model, actions)?)
    }

    fn commit(
        &self,
        model: &SourceModel,
        batches: Vec<(&str, Vec<Edit>)>,
    ) -> Result<BatchOutcome, FixError> {
        let mut tagged: Vec<(usize, &Edit)> = Vec::new();
        for (index, (_, edits)) in batches.iter().enumerate() {
            for edit in edits {
                edit.validate(model)?;
                tagged.push((index, edit));
            }
        }
        tagged.sort_by_key(|(index, edit)| (edit.span.start, edit.span.end, *index));

        let report = find_conflicts(&batches, &tagged);
        if !report.is_empty() {
            tracing::warn!(keys = ?report.keys(), "batch refused: overlapping edits");
            return Err(FixError::Conflict(report));
        }

        let applied: Vec<String> = batches.iter().map(|(key, _)| key.to_string()).collect();
        if tagged.is_empty() {
            return Ok(BatchOutcome {
                model: model.clone(),
                applied,
                edit_count: 0,
                introduced_errors: 0,
            });
        }

        let edits: Vec<Edit> = tagged.iter().map(|(_, edit)| (*edit).clone()).collect();
        let text = splice(model.text(), &edits)?;
        let rewritten = SourceModel::parse(text)?;

        let introduced_errors = if self.check_syntax {
            rewritten
                .tree()
                .error_spans()
                .len()
                .saturating_sub(model.tree().error_spans().len())
        } else {
            0
        };
        if introduced_errors > 0 {
            tracing::warn!(introduced_errors, "rewrite introduced syntax errors");
        }
        tracing::debug!(
            actions = applied.len(),
            edits = edits.len(),
            from = %model.id(),
            to = %rewritten.id(),
            "batch applied"
        );

        Ok(BatchOutcome {
            model: rewritten,
            applied,
            edit_count: edits.len(),
            introduced_errors,
        })
    }
}

fn distinct_edit_sets<'a>(
    model: &SourceModel,
    actions: impl IntoIterator<Item = &'a CodeAction>,
) -> Result<Vec<(&'a str, Vec<Edit>)>, FixError> {
    let mut batches: Vec<(&str, Vec<Edit>)> = Vec::new();
    for action in actions {
        let edits = action.synthesize(model)?;
        if batches.iter().any(|(_, existing)| *existing == edits) {
            tracing::debug!(key = %action.equivalence_key, "dropping identical action");
            continue;
        }
        batches.push((action.equivalence_key.as_str(), edits));
    }
    Ok(batches)
}

/// Every overlapping pair among `tagged` (sorted by start).
fn find_conflicts(batches: &[(&str, Vec<Edit>)], tagged: &[(usize, &Edit)]) -> ConflictReport {
    let mut conflicts = Vec::new();
    for (i, (first_index, first)) in tagged.iter().enumerate() {
        for (second_index, second) in &tagged[i + 1..] {
            // Sorted by start: nothing further can reach back into `first`
            if second.span.start > first.span.end {
                break;
            }
            if first.span.conflicts_with(second.span) {
                conflicts.push(Conflict {
                    first_key: batches[*first_index].0.to_string(),
                    first_span: first.span,
                    second_key: batches[*second_index].0.to_string(),
                    second_span: second.span,
                });
            }
        }
    }
    ConflictReport { conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::action::{Intent, NodeKey};
    use crate::source::{Node, NodeKind};

    const SOURCE: &str = "class T {\n    [Fact, InlineData(1)]\n    public void M(int x) { }\n}\n";

    fn model() -> SourceModel {
        SourceModel::parse(SOURCE).unwrap()
    }

    fn method(model: &SourceModel) -> &Node {
        model
            .tree()
            .descendants()
            .find(|n| n.kind() == NodeKind::MethodDeclaration)
            .unwrap()
    }

    fn remove(model: &SourceModel, key: &str, name: &str) -> CodeAction {
        CodeAction::new(
            model,
            key,
            key,
            Intent::RemoveAttributes {
                declaration: NodeKey::of(method(model)),
                names: vec![name.to_string()],
            },
        )
    }

    fn remove_parameters(model: &SourceModel) -> CodeAction {
        let list = method(model)
            .children()
            .iter()
            .find(|n| n.kind() == NodeKind::ParameterList)
            .unwrap();
        CodeAction::new(
            model,
            "Remove Parameters",
            "Remove Parameters",
            Intent::ReplaceNode {
                target: NodeKey::of(list),
                text: "()".to_string(),
            },
        )
    }

    #[test]
    fn applies_independent_actions_together() {
        let model = model();
        let actions = vec![remove(&model, "a", "InlineData"), remove_parameters(&model)];
        let outcome = BatchApplier::default().apply(&model, &actions).unwrap();
        assert_eq!(
            outcome.text(),
            "class T {\n    [Fact]\n    public void M() { }\n}\n"
        );
        assert_eq!(outcome.applied, vec!["a", "Remove Parameters"]);
        assert_eq!(outcome.edit_count, 2);
        assert_eq!(outcome.introduced_errors, 0);
        assert_eq!(outcome.model.tree().render(), outcome.text());
    }

    #[test]
    fn overlapping_actions_apply_nothing() {
        let model = model();
        let actions = vec![remove(&model, "a", "InlineData"), remove(&model, "b", "Fact")];
        let err = BatchApplier::default()
            .apply(&model, &actions)
            .unwrap_err();
        let report = match err {
            FixError::Conflict(report) => report,
            other => panic!("expected conflict, got {other:?}"),
        };
        assert_eq!(report.keys().into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(model.text(), SOURCE);
    }

    #[test]
    fn duplicate_keys_apply_once() {
        let model = model();
        // Same key, different intent: only the first survives
        let actions = vec![remove(&model, "a", "InlineData"), remove(&model, "a", "Fact")];
        let outcome = BatchApplier::default().apply(&model, &actions).unwrap();
        assert_eq!(outcome.applied, vec!["a"]);
        assert!(outcome.text().contains("[Fact]"));
    }

    #[test]
    fn empty_batch_is_identity() {
        let model = model();
        let outcome = BatchApplier::default().apply(&model, &[]).unwrap();
        assert_eq!(outcome.text(), SOURCE);
        assert_eq!(outcome.model.id(), model.id());
        assert!(outcome.applied.is_empty());
    }

    #[test]
    fn fix_all_deduplicates_identical_edits() {
        let model = model();
        let actions = vec![
            remove(&model, "a", "InlineData"),
            remove(&model, "a", "InlineData"),
            remove_parameters(&model),
        ];
        let outcome = BatchApplier::default()
            .apply_fix_all(&model, &actions, "a")
            .unwrap();
        assert_eq!(outcome.edit_count, 1);
        assert!(outcome.text().contains("M(int x)"));

        let err = BatchApplier::default()
            .apply_fix_all(&model, &actions, "missing")
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn apply_each_keeps_actions_sharing_a_key() {
        let model = model();
        let mut parameters = remove_parameters(&model);
        parameters.equivalence_key = "a".to_string();
        let actions = vec![
            remove(&model, "a", "InlineData"),
            remove(&model, "a", "InlineData"),
            parameters,
        ];

        let outcome = BatchApplier::default()
            .apply_each(&model, &actions)
            .unwrap();
        assert_eq!(outcome.applied, vec!["a", "a"]);
        assert_eq!(outcome.edit_count, 2);
        assert_eq!(
            outcome.text(),
            "class T {\n    [Fact]\n    public void M() { }\n}\n"
        );

        let first_only = BatchApplier::default().apply(&model, &actions).unwrap();
        assert_eq!(first_only.edit_count, 1);
    }

    #[test]
    fn stale_actions_are_refused() {
        let model = model();
        let action = remove(&model, "a", "InlineData");
        let other = SourceModel::parse(SOURCE.replace("x", "y")).unwrap();
        assert!(BatchApplier::default().apply(&other, &[action]).is_err());
    }
}
