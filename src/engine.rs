//! Whole-file driver: diagnose, pick actions, batch, repeat until stable.

use crate::config::EngineConfig;
use crate::fix::{BatchApplier, BatchOutcome, CodeAction, Conflict, FixCatalog, FixError};
use crate::rules::{RuleError, RuleSet};
use crate::semantic::{DeclarationIndex, SemanticModel};
use crate::source::{Diagnostic, SourceModel};
use std::sync::Arc;

/// Which code actions to apply for each diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The first action the catalog offers
    First,
    /// Every action with this equivalence key
    Key(String),
}

#[derive(Debug, Clone)]
pub struct FixReport {
    /// Final text
    pub source: String,
    /// Batches committed
    pub iterations: usize,
    /// Equivalence keys applied, across all iterations
    pub applied: Vec<String>,
    /// Diagnostics left in the final text
    pub remaining: Vec<Diagnostic>,
    /// Equivalence keys dropped to resolve conflicts
    pub dropped: Vec<String>,
    pub introduced_errors: usize,
}

impl FixReport {
    pub fn changed(&self) -> bool {
        self.iterations > 0
    }
}

pub struct FixEngine {
    catalog: FixCatalog,
    rules: RuleSet,
    semantic: Arc<dyn SemanticModel>,
    applier: BatchApplier,
    max_iterations: usize,
}

impl FixEngine {
    pub fn new(catalog: FixCatalog, rules: RuleSet, semantic: Arc<dyn SemanticModel>) -> Self {
        Self {
            catalog,
            rules,
            semantic,
            applier: BatchApplier::default(),
            max_iterations: 8,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, RuleError> {
        let semantic = Arc::new(DeclarationIndex::from_config(&config.semantic));
        Ok(Self {
            catalog: FixCatalog::from_config(config),
            rules: RuleSet::builtin(config)?,
            semantic,
            applier: BatchApplier::new(config.engine.check_syntax),
            max_iterations: config.engine.max_iterations.max(1),
        })
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn catalog(&self) -> &FixCatalog {
        &self.catalog
    }

    /// Parse `text` and attach the diagnostics the rules report.
    pub fn diagnose(&self, text: &str) -> Result<SourceModel, FixError> {
        Ok(self.evaluate(SourceModel::parse(text)?))
    }

    fn evaluate(&self, model: SourceModel) -> SourceModel {
        let diagnostics = self.rules.evaluate(&model);
        model.with_diagnostics(diagnostics)
    }

    /// Every code action offered for every diagnostic on `model`.
    pub fn code_actions(&self, model: &SourceModel) -> Result<Vec<CodeAction>, FixError> {
        let mut actions = Vec::new();
        for diagnostic in model.diagnostics() {
            actions.extend(
                self.catalog
                    .fixes_for(model, diagnostic, self.semantic.as_ref())?,
            );
        }
        Ok(actions)
    }

    fn select(
        &self,
        model: &SourceModel,
        selection: &Selection,
    ) -> Result<Vec<CodeAction>, FixError> {
        let mut selected = Vec::new();
        for diagnostic in model.diagnostics() {
            let actions = self
                .catalog
                .fixes_for(model, diagnostic, self.semantic.as_ref())?;
            match selection {
                Selection::First => selected.extend(actions.into_iter().next()),
                Selection::Key(key) => {
                    selected.extend(actions.into_iter().filter(|a| &a.equivalence_key == key))
                }
            }
        }
        Ok(selected)
    }

    fn apply(
        &self,
        model: &SourceModel,
        actions: &[CodeAction],
        selection: &Selection,
    ) -> Result<BatchOutcome, FixError> {
        match selection {
            Selection::First => self.applier.apply_each(model, actions),
            Selection::Key(key) => self.applier.apply_fix_all(model, actions, key),
        }
    }

    /// Fix `text` until no selected action applies or the iteration limit
    /// is reached.
    ///
    /// Each pass applies every selected action, so one pass fixes all
    /// occurrences of a rule. A conflicting batch is retried without the
    /// later of the two conflicting actions; the dropped action gets another
    /// chance against the next snapshot.
    pub fn fix(&self, text: &str, selection: &Selection) -> Result<FixReport, FixError> {
        let mut model = self.diagnose(text)?;
        let mut report = FixReport {
            source: String::new(),
            iterations: 0,
            applied: Vec::new(),
            remaining: Vec::new(),
            dropped: Vec::new(),
            introduced_errors: 0,
        };

        while report.iterations < self.max_iterations {
            let mut actions = self.select(&model, selection)?;
            let outcome = loop {
                if actions.is_empty() {
                    break None;
                }
                match self.apply(&model, &actions, selection) {
                    Ok(outcome) => break Some(outcome),
                    Err(FixError::Conflict(conflicts)) => {
                        let Some(conflict) = conflicts.conflicts.first() else {
                            break None;
                        };
                        let Some(position) = victim_position(&model, &actions, conflict) else {
                            break None;
                        };
                        let victim = actions.remove(position).equivalence_key;
                        tracing::debug!(
                            key = %victim,
                            span = %conflict.second_span,
                            "dropped conflicting action"
                        );
                        report.dropped.push(victim);
                    }
                    Err(e) => return Err(e),
                }
            };

            let Some(outcome) = outcome else {
                break;
            };
            if outcome.model.text() == model.text() {
                break;
            }
            report.iterations += 1;
            report.applied.extend(outcome.applied);
            report.introduced_errors += outcome.introduced_errors;
            model = self.evaluate(outcome.model);
        }

        tracing::debug!(
            iterations = report.iterations,
            applied = report.applied.len(),
            remaining = model.diagnostics().len(),
            "fix finished"
        );
        report.remaining = model.diagnostics().to_vec();
        report.source = model.text().to_string();
        Ok(report)
    }
}

/// Index of the action that produced the later edit of `conflict`.
fn victim_position(
    model: &SourceModel,
    actions: &[CodeAction],
    conflict: &Conflict,
) -> Option<usize> {
    let owns_span = |action: &CodeAction| {
        action
            .synthesize(model)
            .is_ok_and(|edits| edits.iter().any(|e| e.span == conflict.second_span))
    };
    actions
        .iter()
        .rposition(|a| a.equivalence_key == conflict.second_key && owns_span(a))
        .or_else(|| {
            actions
                .iter()
                .rposition(|a| a.equivalence_key == conflict.second_key)
        })
}
