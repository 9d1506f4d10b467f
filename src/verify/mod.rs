//! Differential verification: marked-up before text, expected after text.
//!
//! ```
//! use fixwright::config::EngineConfig;
//! use fixwright::verify::{FixCase, Verifier};
//!
//! let verifier = Verifier::from_config(&EngineConfig::default()).unwrap();
//! let case = FixCase::new(
//!     "class T { [Fact] void {|X1001:M|}(int x) { } }",
//!     "class T { [Fact] void M() { } }",
//! );
//! verifier.verify(&case).unwrap();
//! ```

pub mod diff;
pub mod fixtures;
pub mod harness;
pub mod markup;

pub use diff::unified_diff;
pub use fixtures::{cases_from_str, load_cases, FixtureError};
pub use harness::{ExpectedDiagnostic, FixCase, Verifier, VerifyError, VerifyReport};
pub use markup::{parse_markup, MarkedSource, MarkedSpan, MarkupError};
