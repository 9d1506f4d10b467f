//! Rule evaluation: the collaborator that produces located diagnostics.
//!
//! The fix engine never decides what is a violation; it consumes whatever a
//! [`RuleEvaluator`] reports. This module carries the built-in structural
//! rules and the config-driven ast-grep [`PatternRule`].

pub mod builtin;
pub mod pattern;

pub use builtin::{
    AbstractTypeCheck, DataWithoutTheory, FactWithParameters, FactWithTestData, TypeofOverload,
};
pub use pattern::PatternRule;

use crate::config::EngineConfig;
use crate::semantic::DeclarationIndex;
use crate::source::{Diagnostic, SourceModel};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("rule '{id}' has an invalid pattern: {message}")]
    InvalidPattern { id: String, message: String },
}

/// Rule-evaluation collaborator.
pub trait RuleEvaluator: Send + Sync {
    /// Ids of the diagnostics this evaluator can report.
    fn rule_ids(&self) -> Vec<&str>;

    /// Report every violation in `model`.
    fn evaluate(&self, model: &SourceModel) -> Vec<Diagnostic>;
}

/// An ordered collection of evaluators, optionally restricted to some ids.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn RuleEvaluator>>,
    only: Option<BTreeSet<String>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rules plus the pattern rules declared in `config`.
    pub fn builtin(config: &EngineConfig) -> Result<Self, RuleError> {
        let semantic = Arc::new(DeclarationIndex::from_config(&config.semantic));
        let mut set = Self::new();
        set.push(FactWithParameters::new(&config.attributes));
        set.push(FactWithTestData::new(&config.attributes));
        set.push(DataWithoutTheory::new(&config.attributes));
        set.push(TypeofOverload::type_checks(&config.overloads));
        set.push(TypeofOverload::throws(&config.overloads));
        set.push(AbstractTypeCheck::new(&config.overloads, semantic));
        for rule in &config.pattern_rules {
            set.push(PatternRule::from_config(rule)?);
        }
        Ok(set)
    }

    pub fn push(&mut self, rule: impl RuleEvaluator + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Report only diagnostics whose id is in `ids`.
    pub fn restricted_to<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .rules
            .iter()
            .flat_map(|r| r.rule_ids())
            .filter(|id| self.reports(id))
            .collect();
        ids.dedup();
        ids
    }

    fn reports(&self, id: &str) -> bool {
        self.only.as_ref().is_none_or(|only| only.contains(id))
    }

    /// Evaluate every rule, ordered by position then rule id.
    pub fn evaluate(&self, model: &SourceModel) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = self
            .rules
            .iter()
            .flat_map(|r| r.evaluate(model))
            .filter(|d| self.reports(&d.rule_id))
            .collect();
        diagnostics.sort_by(|a, b| {
            (a.span.start, a.span.end, &a.rule_id).cmp(&(b.span.start, b.span.end, &b.rule_id))
        });
        diagnostics.dedup_by(|a, b| a.span == b.span && a.rule_id == b.rule_id);
        tracing::debug!(count = diagnostics.len(), snapshot = %model.id(), "evaluated rules");
        diagnostics
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rule_ids())
            .field("only", &self.only)
            .finish()
    }
}
