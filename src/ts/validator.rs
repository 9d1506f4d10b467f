use crate::pool;
use crate::source::Span;
use crate::ts::errors::TreeSitterError;

/// Validate that C# source code has no syntax errors.
///
/// Returns Ok(()) if the code parses without ERROR or MISSING nodes.
pub fn validate_syntax(source: &str) -> Result<(), TreeSitterError> {
    let tree = pool::with_parser(|parser| parser.parse(source))??;
    report(&tree.error_spans())
}

/// Validate that a rewrite did not introduce syntax errors.
///
/// Spans shift under editing, so errors are compared by count: the edited
/// text may carry the errors the original already had, but no more.
pub fn validate_edit(original: &str, edited: &str) -> Result<(), TreeSitterError> {
    let (before, after) = pool::with_parser(|parser| {
        let before = parser.parse(original)?;
        let after = parser.parse(edited)?;
        Ok::<_, TreeSitterError>((before.error_spans(), after.error_spans()))
    })??;

    if after.len() <= before.len() {
        return Ok(());
    }

    let introduced: Vec<Span> = after
        .into_iter()
        .filter(|span| !before.contains(span))
        .collect();
    report(&introduced)
}

fn report(errors: &[Span]) -> Result<(), TreeSitterError> {
    match errors {
        [] => Ok(()),
        [single] => Err(TreeSitterError::SyntaxError {
            byte_start: single.start,
            byte_end: single.end,
        }),
        many => Err(TreeSitterError::MultipleSyntaxErrors { count: many.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_valid_syntax() {
        let source = r#"
public class TestClass {
    [Fact]
    public void TestMethod() { }
}
"#;
        assert!(validate_syntax(source).is_ok());
    }

    #[test]
    fn validate_invalid_syntax() {
        let source = "class C { void M( { }";
        assert!(validate_syntax(source).is_err());
    }

    #[test]
    fn validate_edit_introduces_error() {
        let original = "class C { void M() { } }";
        let edited = "class C { void M( { } }";
        assert!(validate_edit(original, edited).is_err());
    }

    #[test]
    fn validate_edit_keeps_existing_error() {
        let original = "class C { void M( { } }";
        assert!(validate_edit(original, original).is_ok());
    }

    #[test]
    fn validate_edit_clean_rewrite() {
        let original = "class C { void M(int x) { } }";
        let edited = "class C { void M() { } }";
        assert!(validate_edit(original, edited).is_ok());
    }
}
