use crate::semantic::TypeKind;
use crate::source::{LineEndings, Severity};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// Rule ids reserved by the built-in rules.
pub const BUILTIN_RULE_IDS: &[&str] = &["X1001", "X1005", "X1008", "X2007", "X2015", "X2018"];

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EngineConfig {
    #[serde(default)]
    pub attributes: AttributeConfig,
    #[serde(default)]
    pub overloads: OverloadConfig,
    #[serde(default)]
    pub semantic: SemanticConfig,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub pattern_rules: Vec<PatternRuleConfig>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.attributes.fact.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                section: "attributes",
                field: "fact",
            });
        }
        if self.attributes.theory.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                section: "attributes",
                field: "theory",
            });
        }
        if self.attributes.data.iter().any(|d| d.trim().is_empty()) {
            issues.push(ValidationIssue::MissingField {
                section: "attributes",
                field: "data",
            });
        }

        for pair in &self.overloads.assignable {
            if pair.from.trim().is_empty() || pair.to.trim().is_empty() {
                issues.push(ValidationIssue::InvalidCombo {
                    rule_id: Some("X2018".to_string()),
                    message: "assignable replacement needs both 'from' and 'to'".to_string(),
                });
            }
        }

        for known in &self.semantic.known_types {
            if known.name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    section: "semantic.known_types",
                    field: "name",
                });
            }
        }

        if self.engine.max_iterations == 0 {
            issues.push(ValidationIssue::InvalidCombo {
                rule_id: None,
                message: "engine.max_iterations must be at least 1".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for rule in &self.pattern_rules {
            if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    section: "pattern_rules",
                    field: "id",
                });
                continue;
            }
            if rule.pattern.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    section: "pattern_rules",
                    field: "pattern",
                });
            }
            if BUILTIN_RULE_IDS.contains(&rule.id.as_str()) || !seen.insert(rule.id.as_str()) {
                issues.push(ValidationIssue::DuplicateRuleId(rule.id.clone()));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

/// Attribute names recognised by the built-in rules, matched by simple name.
#[derive(Debug, Deserialize, Clone)]
pub struct AttributeConfig {
    #[serde(default = "default_fact")]
    pub fact: String,
    #[serde(default = "default_theory")]
    pub theory: String,
    #[serde(default = "default_data")]
    pub data: Vec<String>,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            fact: default_fact(),
            theory: default_theory(),
            data: default_data(),
        }
    }
}

fn default_fact() -> String {
    "Fact".to_string()
}

fn default_theory() -> String {
    "Theory".to_string()
}

fn default_data() -> Vec<String> {
    ["InlineData", "MemberData", "ClassData"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Member names with a `typeof`-taking overload that has a generic twin.
#[derive(Debug, Deserialize, Clone)]
pub struct OverloadConfig {
    #[serde(default = "default_type_checks")]
    pub type_checks: Vec<String>,
    #[serde(default = "default_throws")]
    pub throws: Vec<String>,
    #[serde(default = "default_assignable")]
    pub assignable: Vec<Replacement>,
}

impl Default for OverloadConfig {
    fn default() -> Self {
        Self {
            type_checks: default_type_checks(),
            throws: default_throws(),
            assignable: default_assignable(),
        }
    }
}

impl OverloadConfig {
    pub fn assignable_replacement(&self, member: &str) -> Option<&str> {
        self.assignable
            .iter()
            .find(|r| r.from == member)
            .map(|r| r.to.as_str())
    }
}

fn default_type_checks() -> Vec<String> {
    ["IsType", "IsNotType", "IsAssignableFrom", "IsNotAssignableFrom"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_throws() -> Vec<String> {
    ["Throws", "ThrowsAsync", "ThrowsAny", "ThrowsAnyAsync"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_assignable() -> Vec<Replacement> {
    vec![
        Replacement {
            from: "IsType".to_string(),
            to: "IsAssignableFrom".to_string(),
        },
        Replacement {
            from: "IsNotType".to_string(),
            to: "IsNotAssignableFrom".to_string(),
        },
    ]
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SemanticConfig {
    #[serde(default = "default_known_types")]
    pub known_types: Vec<KnownType>,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            known_types: default_known_types(),
        }
    }
}

/// An external type the resolver treats as existing.
#[derive(Debug, Deserialize, Clone)]
pub struct KnownType {
    /// Dotted full name, e.g. `System.IO.Stream`
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
}

fn default_known_types() -> Vec<KnownType> {
    let known = |name: &str, kind, is_abstract| KnownType {
        name: name.to_string(),
        kind,
        is_abstract,
    };
    vec![
        known("System.Exception", TypeKind::Class, false),
        known("System.ArgumentException", TypeKind::Class, false),
        known("System.ArgumentNullException", TypeKind::Class, false),
        known("System.InvalidOperationException", TypeKind::Class, false),
        known("System.NotSupportedException", TypeKind::Class, false),
        known("System.NotImplementedException", TypeKind::Class, false),
        known("System.IDisposable", TypeKind::Interface, false),
        known("System.IComparable", TypeKind::Interface, false),
        known("System.Collections.IEnumerable", TypeKind::Interface, false),
        known("System.IO.Stream", TypeKind::Class, true),
        known("System.IO.IOException", TypeKind::Class, false),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    /// Upper bound on diagnose/fix rounds per file
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub line_endings: LineEndings,
    /// Re-parse after batch application and report introduced syntax errors
    #[serde(default = "default_true")]
    pub check_syntax: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            line_endings: LineEndings::default(),
            check_syntax: true,
        }
    }
}

fn default_max_iterations() -> usize {
    8
}

fn default_true() -> bool {
    true
}

/// A config-defined structural rule, matched with ast-grep.
#[derive(Debug, Deserialize, Clone)]
pub struct PatternRuleConfig {
    pub id: String,
    pub pattern: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        section: &'static str,
        field: &'static str,
    },
    DuplicateRuleId(String),
    InvalidCombo {
        rule_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { section, field } => {
                write!(f, "[{section}] missing required field '{field}'")
            }
            ValidationIssue::DuplicateRuleId(id) => {
                write!(f, "rule id '{id}' is defined more than once")
            }
            ValidationIssue::InvalidCombo { rule_id, message } => match rule_id {
                Some(id) => write!(f, "rule '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid engine configuration: {message}"),
            },
        }
    }
}
