//! Fixwright: rule-driven code fixes for C#
//!
//! Diagnostics come in as located rule violations; fixes go out as verified
//! byte-span edits, applied in one non-overlapping batch per pass.
//!
//! # Architecture
//!
//! All fixes compile down to a single primitive: [`Edit`], a byte-span
//! replacement bound to the snapshot it was computed against. Intelligence
//! lives in selecting and synthesizing fixes (matcher, providers,
//! synthesizer), not in applying them.
//!
//! - [`source`]: spans, diagnostics and the owned syntax tree
//! - [`matcher`]: typed lookups over that tree
//! - [`fix`]: catalog, providers, edit synthesis, batch application
//! - [`rules`]: the rule-evaluation collaborator
//! - [`semantic`]: the type-lookup collaborator
//! - [`verify`]: before/after verification harness
//!
//! # Safety
//!
//! - Every edit verifies its before-text and snapshot before applying
//! - A batch with overlapping edits applies nothing
//! - The rewritten text is always re-parsed, never patched in place
//! - Atomic file writes (tempfile + fsync + rename)
//!
//! # Example
//!
//! ```
//! use fixwright::{EngineConfig, FixEngine, Selection};
//!
//! let engine = FixEngine::from_config(&EngineConfig::default()).unwrap();
//! let report = engine
//!     .fix("class T { [Fact] void M(int x) { } }", &Selection::First)
//!     .unwrap();
//! assert_eq!(report.source, "class T { [Fact] void M() { } }");
//! ```

pub mod cache;
pub mod config;
pub mod edit;
pub mod engine;
pub mod fix;
pub mod matcher;
pub mod pool;
pub mod rules;
pub mod semantic;
pub mod source;
pub mod ts;
pub mod verify;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, EngineConfig};
pub use edit::{atomic_write, splice, Edit, EditError, EditVerification};
pub use engine::{FixEngine, FixReport, Selection};
pub use fix::{
    BatchApplier, BatchOutcome, CodeAction, ConflictReport, EditSynthesizer, FixCatalog,
    FixError, FixProvider, FixRule,
};
pub use rules::{RuleError, RuleEvaluator, RuleSet};
pub use semantic::{DeclarationIndex, SemanticModel, TypeDescriptor};
pub use source::{Diagnostic, Node, NodeKind, Severity, SnapshotId, SourceModel, Span};
pub use ts::TreeSitterError;
pub use verify::{FixCase, Verifier, VerifyError};
