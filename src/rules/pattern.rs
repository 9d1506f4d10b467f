use crate::cache;
use crate::config::PatternRuleConfig;
use crate::rules::{RuleError, RuleEvaluator};
use crate::source::{Diagnostic, Severity, SourceModel, Span};
use ast_grep_core::AstGrep;
use ast_grep_language::SupportLang;

/// A config-defined rule: every match of an ast-grep pattern is a violation.
///
/// # Metavariable Syntax
///
/// - `$NAME` - Matches a single node and captures it
/// - `$$$NAME` - Matches zero or more nodes (variadic)
/// - `$_` - Matches any single node (anonymous)
///
/// # Example Patterns
///
/// ```text
/// Console.WriteLine($$$ARGS)     // console output in tests
/// Assert.True($A == $B)          // equality hidden in a boolean assert
/// Thread.Sleep($MS)              // sleeping tests
/// ```
#[derive(Debug, Clone)]
pub struct PatternRule {
    id: String,
    pattern: String,
    severity: Severity,
    message: String,
}

impl PatternRule {
    /// Create a rule, compiling the pattern once up front so a bad pattern
    /// fails at configuration time rather than during evaluation.
    pub fn new(
        id: impl Into<String>,
        pattern: impl Into<String>,
        severity: Severity,
    ) -> Result<Self, RuleError> {
        let id = id.into();
        let pattern = pattern.into();
        cache::get_or_compile_pattern(&pattern, SupportLang::CSharp).map_err(|message| {
            RuleError::InvalidPattern {
                id: id.clone(),
                message,
            }
        })?;
        let message = format!("matches pattern `{pattern}`");
        Ok(Self {
            id,
            pattern,
            severity,
            message,
        })
    }

    pub fn from_config(config: &PatternRuleConfig) -> Result<Self, RuleError> {
        let mut rule = Self::new(&config.id, &config.pattern, config.severity)?;
        if let Some(message) = &config.message {
            rule.message = message.clone();
        }
        Ok(rule)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl RuleEvaluator for PatternRule {
    fn rule_ids(&self) -> Vec<&str> {
        vec![self.id.as_str()]
    }

    fn evaluate(&self, model: &SourceModel) -> Vec<Diagnostic> {
        let pattern = match cache::get_or_compile_pattern(&self.pattern, SupportLang::CSharp) {
            Ok(pattern) => pattern,
            Err(message) => {
                tracing::warn!(rule = %self.id, %message, "pattern failed to compile");
                return Vec::new();
            }
        };

        let sg = AstGrep::new(model.text(), SupportLang::CSharp);
        sg.root()
            .find_all(&pattern)
            .map(|m| {
                let range = m.get_node().range();
                Diagnostic::new(self.id.clone(), Span::new(range.start, range.end), self.severity)
                    .with_message(self.message.clone())
            })
            .collect()
    }
}
