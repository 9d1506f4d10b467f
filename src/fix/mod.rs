//! From diagnostics to verified edits.
//!
//! [`FixCatalog`] maps rule ids to [`FixProvider`]s; a provider turns one
//! diagnostic into [`CodeAction`]s; [`EditSynthesizer`] lowers an action's
//! intent to [`crate::Edit`]s against one snapshot; [`BatchApplier`] commits
//! the edits of many actions in a single pass or refuses with a
//! [`ConflictReport`].

pub mod action;
pub mod batch;
pub mod catalog;
pub mod provider;
pub mod synth;

pub use action::{CodeAction, Intent, NodeKey};
pub use batch::{BatchApplier, BatchOutcome};
pub use catalog::{FixCatalog, FixCatalogBuilder};
pub use provider::{FixContext, FixProvider, FixRule};
pub use synth::EditSynthesizer;

use crate::edit::EditError;
use crate::source::{NodeKind, Span};
use crate::ts::TreeSitterError;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixError {
    #[error("{0}")]
    Conflict(ConflictReport),

    #[error("provider for [{}] invoked with a diagnostic for rule '{rule_id}'", .owned.join(", "))]
    UnownedRule { rule_id: String, owned: Vec<String> },

    #[error("no code action with equivalence key '{key}'{}", did_you_mean(.suggestion))]
    UnknownEquivalenceKey {
        key: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },

    #[error("no {kind:?} node at {span} in this snapshot")]
    TargetNotFound { kind: NodeKind, span: Span },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Parse(#[from] TreeSitterError),
}

impl FixError {
    /// Build an unknown-key error, suggesting the closest available key.
    pub fn unknown_key<I, S>(key: &str, available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let available: Vec<String> = available
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let suggestion = available
            .iter()
            .map(|k| (strsim::levenshtein(key, k), k))
            .filter(|(distance, k)| *distance <= k.len().max(key.len()) / 3 + 1)
            .min()
            .map(|(_, k)| k.clone());
        FixError::UnknownEquivalenceKey {
            key: key.to_string(),
            available,
            suggestion,
        }
    }

    /// Wiring bugs: must surface to the caller, never be swallowed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            FixError::UnownedRule { .. } | FixError::UnknownEquivalenceKey { .. }
        )
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

/// One pair of overlapping edits and the actions that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub first_key: String,
    pub first_span: Span,
    pub second_key: String,
    pub second_span: Span,
}

/// Why a batch was refused. Nothing from the batch was applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
}

impl ConflictReport {
    /// Every equivalence key involved in a conflict.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.conflicts
            .iter()
            .flat_map(|c| [c.first_key.as_str(), c.second_key.as_str()])
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conflicting edits:")?;
        for c in &self.conflicts {
            write!(
                f,
                " '{}' at {} overlaps '{}' at {};",
                c.first_key, c.first_span, c.second_key, c.second_span
            )?;
        }
        Ok(())
    }
}
