use crate::config::EngineConfig;
use crate::fix::{BatchApplier, BatchOutcome, CodeAction, FixCatalog, FixError};
use crate::rules::{RuleError, RuleSet};
use crate::semantic::{DeclarationIndex, SemanticModel};
use crate::source::{LineEndings, LineIndex, SourceModel, Span};
use crate::ts::TreeSitterError;
use crate::verify::diff::unified_diff;
use crate::verify::markup::{parse_markup, MarkupError};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid markup: {0}")]
    Markup(#[from] MarkupError),

    #[error("failed to parse source: {0}")]
    Parse(#[from] TreeSitterError),

    #[error(
        "diagnostics differ\n  missing:    [{}]\n  unexpected: [{}]",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    DiagnosticMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error(transparent)]
    Fix(#[from] FixError),

    #[error("rewrite introduced {count} syntax error(s)")]
    SyntaxErrorIntroduced { count: usize },

    #[error("rewritten text differs from expected\n{diff}")]
    TextMismatch { diff: String },
}

/// A diagnostic expected in addition to the marked-up ones.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpectedDiagnostic {
    pub rule_id: String,
    /// Byte span in the marker-free text
    pub span: Span,
}

/// One before/after verification case.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixCase {
    #[serde(default)]
    pub name: String,
    /// Marked-up source
    pub before: String,
    /// Expected text after fixing; `None` checks diagnostics only
    #[serde(default)]
    pub after: Option<String>,
    /// Equivalence key to apply; the first action per diagnostic otherwise
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub diagnostics: Vec<ExpectedDiagnostic>,
}

impl FixCase {
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            after: Some(after.into()),
            ..Self::default()
        }
    }

    /// A case that only checks diagnostics.
    pub fn diagnostics_only(before: impl Into<String>) -> Self {
        Self {
            before: before.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_diagnostic(mut self, rule_id: impl Into<String>, span: Span) -> Self {
        self.diagnostics.push(ExpectedDiagnostic {
            rule_id: rule_id.into(),
            span,
        });
        self
    }
}

/// What a passing case did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub diagnostics: usize,
    /// Equivalence keys applied
    pub applied: Vec<String>,
}

/// Drives parse → diagnose → fix → compare for one case at a time.
pub struct Verifier {
    rules: RuleSet,
    catalog: FixCatalog,
    semantic: Arc<dyn SemanticModel>,
    applier: BatchApplier,
    line_endings: LineEndings,
}

impl Verifier {
    pub fn new(rules: RuleSet, catalog: FixCatalog, semantic: Arc<dyn SemanticModel>) -> Self {
        Self {
            rules,
            catalog,
            semantic,
            applier: BatchApplier::default(),
            line_endings: LineEndings::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, RuleError> {
        Ok(Self {
            rules: RuleSet::builtin(config)?,
            catalog: FixCatalog::from_config(config),
            semantic: Arc::new(DeclarationIndex::from_config(&config.semantic)),
            applier: BatchApplier::new(config.engine.check_syntax),
            line_endings: config.engine.line_endings,
        })
    }

    /// Only evaluate the given rules.
    pub fn for_rules<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules = self.rules.restricted_to(ids);
        self
    }

    pub fn with_line_endings(mut self, line_endings: LineEndings) -> Self {
        self.line_endings = line_endings;
        self
    }

    /// Parse `before` (marked up), evaluate the rules and check the
    /// diagnostics against the markers plus `extra`.
    pub fn verify_diagnostics(
        &self,
        before: &str,
        extra: &[ExpectedDiagnostic],
    ) -> Result<SourceModel, VerifyError> {
        let marked = parse_markup(&self.line_endings.normalize(before))?;
        let active = self.rules.rule_ids();
        let implicit = match active.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        let mut expected: BTreeSet<(String, Span)> =
            marked.expected(implicit, active.len())?.into_iter().collect();
        expected.extend(extra.iter().map(|d| (d.rule_id.clone(), d.span)));

        let model = SourceModel::parse(marked.text)?;
        let diagnostics = self.rules.evaluate(&model);
        let actual: BTreeSet<(String, Span)> = diagnostics
            .iter()
            .map(|d| (d.rule_id.clone(), d.span))
            .collect();

        if expected != actual {
            let lines = model.line_index();
            let describe = |set: &BTreeSet<(String, Span)>, other: &BTreeSet<(String, Span)>| {
                set.difference(other)
                    .map(|(id, span)| describe_diagnostic(&lines, id, *span))
                    .collect::<Vec<_>>()
            };
            return Err(VerifyError::DiagnosticMismatch {
                missing: describe(&expected, &actual),
                unexpected: describe(&actual, &expected),
            });
        }
        Ok(model.with_diagnostics(diagnostics))
    }

    /// Collect actions for every diagnostic on `model`, apply them and
    /// compare the result with `after`.
    pub fn verify_fix(
        &self,
        model: &SourceModel,
        after: &str,
        key: Option<&str>,
    ) -> Result<BatchOutcome, VerifyError> {
        let mut offered: Vec<Vec<CodeAction>> = Vec::new();
        for diagnostic in model.diagnostics() {
            offered.push(
                self.catalog
                    .fixes_for(model, diagnostic, self.semantic.as_ref())?,
            );
        }

        let outcome = match key {
            Some(key) => {
                let all: Vec<CodeAction> = offered.into_iter().flatten().collect();
                self.applier.apply_fix_all(model, &all, key)?
            }
            None => {
                let first: Vec<CodeAction> = offered
                    .into_iter()
                    .filter_map(|actions| actions.into_iter().next())
                    .collect();
                self.applier.apply(model, &first)?
            }
        };

        if outcome.introduced_errors > 0 {
            return Err(VerifyError::SyntaxErrorIntroduced {
                count: outcome.introduced_errors,
            });
        }

        let expected = self.line_endings.normalize(after);
        if outcome.text() != expected {
            return Err(VerifyError::TextMismatch {
                diff: unified_diff(&expected, outcome.text()),
            });
        }
        Ok(outcome)
    }

    pub fn verify(&self, case: &FixCase) -> Result<VerifyReport, VerifyError> {
        let model = self.verify_diagnostics(&case.before, &case.diagnostics)?;
        let diagnostics = model.diagnostics().len();
        let applied = match &case.after {
            Some(after) => self.verify_fix(&model, after, case.key.as_deref())?.applied,
            None => Vec::new(),
        };
        tracing::debug!(case = %case.name, diagnostics, applied = ?applied, "case passed");
        Ok(VerifyReport {
            diagnostics,
            applied,
        })
    }

    /// Verify independent cases in parallel, results in input order.
    pub fn verify_many(&self, cases: &[FixCase]) -> Vec<Result<VerifyReport, VerifyError>> {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(cases.len().max(1));
        let chunk = cases.len().div_ceil(workers).max(1);

        std::thread::scope(|scope| {
            let handles: Vec<_> = cases
                .chunks(chunk)
                .map(|batch| {
                    scope.spawn(move || batch.iter().map(|c| self.verify(c)).collect::<Vec<_>>())
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

fn describe_diagnostic(lines: &LineIndex, rule_id: &str, span: Span) -> String {
    let (start_line, start_col) = lines.line_col(span.start);
    let (end_line, end_col) = lines.line_col(span.end);
    format!("{rule_id} at {start_line}:{start_col}-{end_line}:{end_col}")
}
