use crate::config::EngineConfig;
use crate::fix::action::CodeAction;
use crate::fix::provider::{FixContext, FixProvider, FixRule};
use crate::fix::FixError;
use crate::semantic::SemanticModel;
use crate::source::{Diagnostic, SourceModel};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Rule id → providers, in registration order.
///
/// Built once and read-only afterwards; share it freely between threads.
#[derive(Debug, Clone, Default)]
pub struct FixCatalog {
    rules: Vec<FixRule>,
    index: HashMap<String, Vec<usize>>,
}

/// Append-only registration, consumed by [`FixCatalogBuilder::build`].
#[derive(Debug, Default)]
pub struct FixCatalogBuilder {
    rules: Vec<FixRule>,
}

impl FixCatalogBuilder {
    pub fn register(mut self, rule: FixRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> FixCatalog {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, rule) in self.rules.iter().enumerate() {
            for id in &rule.rule_ids {
                index.entry(id.clone()).or_default().push(position);
            }
        }
        FixCatalog {
            rules: self.rules,
            index,
        }
    }
}

impl FixCatalog {
    pub fn builder() -> FixCatalogBuilder {
        FixCatalogBuilder::default()
    }

    /// The built-in registrations, parameterized by configured names.
    pub fn from_config(config: &EngineConfig) -> Self {
        let data = config.attributes.data.clone();
        Self::builder()
            .register(FixRule::new(
                ["X1008"],
                FixProvider::MarkAsValidTarget {
                    attribute: config.attributes.theory.clone(),
                },
            ))
            .register(FixRule::new(
                ["X1008", "X1005"],
                FixProvider::RemoveConflictingMarkers { disallowed: data },
            ))
            .register(FixRule::new(["X1001"], FixProvider::RemoveParameters))
            .register(FixRule::new(["X2007", "X2015"], FixProvider::UseGenericOverload))
            .register(FixRule::new(
                ["X2018"],
                FixProvider::UseAssignableFrom {
                    replacements: config.overloads.assignable.clone(),
                },
            ))
            .build()
    }

    /// Process-wide catalog built from the default configuration.
    pub fn global() -> &'static FixCatalog {
        static CATALOG: OnceLock<FixCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| FixCatalog::from_config(&EngineConfig::default()))
    }

    pub fn rules_for(&self, rule_id: &str) -> impl Iterator<Item = &FixRule> {
        self.index
            .get(rule_id)
            .into_iter()
            .flatten()
            .map(|&position| &self.rules[position])
    }

    pub fn providers_for(&self, rule_id: &str) -> Vec<&FixProvider> {
        self.rules_for(rule_id).map(|r| &r.provider).collect()
    }

    /// Rule ids with at least one registered provider.
    pub fn fixable_rule_ids(&self) -> BTreeSet<&str> {
        self.index.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All code actions for one diagnostic, in provider registration order.
    pub fn fixes_for(
        &self,
        model: &SourceModel,
        diagnostic: &Diagnostic,
        semantic: &dyn SemanticModel,
    ) -> Result<Vec<CodeAction>, FixError> {
        let cx = FixContext {
            model,
            diagnostic,
            semantic,
        };
        let mut actions = Vec::new();
        for rule in self.rules_for(&diagnostic.rule_id) {
            actions.extend(rule.provide(&cx)?);
        }
        tracing::debug!(
            rule = %diagnostic.rule_id,
            span = %diagnostic.span,
            actions = actions.len(),
            "collected code actions"
        );
        Ok(actions)
    }
}
