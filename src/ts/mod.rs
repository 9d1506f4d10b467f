//! Tree-sitter integration: the concrete parsing collaborator.
//!
//! C# source is parsed with the grammar bundled in ast-grep-language and
//! lowered into the crate's owned [`crate::source::Node`] tree, keeping every
//! byte of whitespace so that rendering a tree reproduces its text.

pub mod errors;
pub mod parser;
pub mod validator;

pub use errors::TreeSitterError;
pub use parser::{lower, render, CSharpParser, SyntaxParser};
pub use validator::{validate_edit, validate_syntax};
