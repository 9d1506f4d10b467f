//! Thread-local parser pooling.
//!
//! Every snapshot re-parse goes through here, so each thread creates its
//! C# parser once and reuses it for all subsequent parses.

use crate::ts::{CSharpParser, TreeSitterError};
use std::cell::RefCell;

thread_local! {
    static CSHARP_PARSER: RefCell<Option<CSharpParser>> = const { RefCell::new(None) };
}

/// Execute function with pooled parser instance.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use fixwright::pool::with_parser;
///
/// let tree = with_parser(|parser| parser.parse("class C { }"))??;
/// assert!(!tree.has_errors());
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, TreeSitterError>
where
    F: FnOnce(&mut CSharpParser) -> R,
{
    CSHARP_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let mut parser = match slot.take() {
            Some(parser) => parser,
            None => CSharpParser::new()?,
        };
        let result = f(&mut parser);
        *slot = Some(parser);
        Ok(result)
    })
}
