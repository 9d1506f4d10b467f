//! Inline span markers in fixture text.
//!
//! `[|...|]` marks a diagnostic of the rule under test, `{|X1008:...|}` a
//! diagnostic of an explicit rule. Markers may nest; they are stripped and
//! the spans they enclosed are reported against the stripped text.

use crate::source::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("marker opened at byte {offset} is never closed")]
    Unclosed { offset: usize },

    #[error("closing marker at byte {offset} has no matching opener")]
    Unmatched { offset: usize },

    #[error("closing marker at byte {offset} does not match the `{opener}` opened before it")]
    Mismatched { offset: usize, opener: &'static str },

    #[error("marker at byte {offset} is missing its `RuleId:` prefix")]
    MissingRuleId { offset: usize },

    #[error("`[|...|]` at byte {offset} needs an explicit rule: {rules} rules are active")]
    ImplicitRule { offset: usize, rules: usize },
}

/// One marked span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedSpan {
    /// `None` for `[|...|]`
    pub rule_id: Option<String>,
    pub span: Span,
    /// Byte offset of the opener in the marked-up input
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedSource {
    /// Input with every marker removed
    pub text: String,
    /// Sorted by span
    pub spans: Vec<MarkedSpan>,
}

impl MarkedSource {
    /// Expected `(rule id, span)` pairs, resolving `[|...|]` to `implicit`.
    pub fn expected(
        &self,
        implicit: Option<&str>,
        active_rules: usize,
    ) -> Result<Vec<(String, Span)>, MarkupError> {
        self.spans
            .iter()
            .map(|marked| match (&marked.rule_id, implicit) {
                (Some(id), _) => Ok((id.clone(), marked.span)),
                (None, Some(id)) => Ok((id.to_string(), marked.span)),
                (None, None) => Err(MarkupError::ImplicitRule {
                    offset: marked.offset,
                    rules: active_rules,
                }),
            })
            .collect()
    }
}

enum Opener {
    Bracket,
    Brace(String),
}

fn is_rule_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

pub fn parse_markup(input: &str) -> Result<MarkedSource, MarkupError> {
    let mut text = String::with_capacity(input.len());
    let mut open: Vec<(Opener, usize, usize)> = Vec::new();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < input.len() {
        let rest = &input[i..];
        if rest.starts_with("[|") {
            open.push((Opener::Bracket, text.len(), i));
            i += 2;
        } else if rest.starts_with("{|") {
            let body = &rest[2..];
            let id_len = body.find(|c: char| !is_rule_id_char(c)).unwrap_or(body.len());
            if id_len == 0 || !body[id_len..].starts_with(':') {
                return Err(MarkupError::MissingRuleId { offset: i });
            }
            open.push((Opener::Brace(body[..id_len].to_string()), text.len(), i));
            i += 2 + id_len + 1;
        } else if rest.starts_with("|]") || rest.starts_with("|}") {
            let (opener, start, offset) = open.pop().ok_or(MarkupError::Unmatched { offset: i })?;
            let rule_id = match (opener, rest.starts_with("|]")) {
                (Opener::Bracket, true) => None,
                (Opener::Brace(id), false) => Some(id),
                (Opener::Bracket, false) => {
                    return Err(MarkupError::Mismatched { offset: i, opener: "[|" })
                }
                (Opener::Brace(_), true) => {
                    return Err(MarkupError::Mismatched { offset: i, opener: "{|" })
                }
            };
            spans.push(MarkedSpan {
                rule_id,
                span: Span::new(start, text.len()),
                offset,
            });
            i += 2;
        } else {
            let Some(c) = rest.chars().next() else {
                break;
            };
            text.push(c);
            i += c.len_utf8();
        }
    }

    if let Some((_, _, offset)) = open.first() {
        return Err(MarkupError::Unclosed { offset: *offset });
    }

    spans.sort_by_key(|s| (s.span.start, s.span.end));
    Ok(MarkedSource { text, spans })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markers_and_records_spans() {
        let marked = parse_markup("void [|M|](int x) { }").unwrap();
        assert_eq!(marked.text, "void M(int x) { }");
        assert_eq!(marked.spans.len(), 1);
        assert_eq!(marked.spans[0].span, Span::new(5, 6));
        assert_eq!(marked.spans[0].rule_id, None);
    }

    #[test]
    fn explicit_rule_ids() {
        let marked = parse_markup("a {|X1001:b|} c {|X1005:d|}").unwrap();
        assert_eq!(marked.text, "a b c d");
        let ids: Vec<_> = marked
            .spans
            .iter()
            .map(|s| s.rule_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["X1001", "X1005"]);
        assert_eq!(&marked.text[marked.spans[1].span.range()], "d");
    }

    #[test]
    fn nested_markers() {
        let marked = parse_markup("{|X2007:Check([|typeof(Foo)|], v)|};").unwrap();
        assert_eq!(marked.text, "Check(typeof(Foo), v);");
        assert_eq!(marked.spans[0].span, Span::new(0, 21));
        assert_eq!(&marked.text[marked.spans[1].span.range()], "typeof(Foo)");
    }

    #[test]
    fn unbalanced_markers_are_errors() {
        assert_eq!(
            parse_markup("a [|b"),
            Err(MarkupError::Unclosed { offset: 2 })
        );
        assert_eq!(
            parse_markup("a b|]"),
            Err(MarkupError::Unmatched { offset: 3 })
        );
        assert!(matches!(
            parse_markup("[|a|}"),
            Err(MarkupError::Mismatched { .. })
        ));
        assert_eq!(
            parse_markup("{|a|}"),
            Err(MarkupError::MissingRuleId { offset: 0 })
        );
    }

    #[test]
    fn ordinary_pipes_are_text() {
        let marked = parse_markup("if (a || b) { x |= 1; }").unwrap();
        assert_eq!(marked.text, "if (a || b) { x |= 1; }");
        assert!(marked.spans.is_empty());
    }

    #[test]
    fn implicit_markers_need_a_single_rule() {
        let marked = parse_markup("[|M|]").unwrap();
        assert_eq!(
            marked.expected(Some("X1008"), 1).unwrap(),
            vec![("X1008".to_string(), Span::new(0, 1))]
        );
        assert_eq!(
            marked.expected(None, 6),
            Err(MarkupError::ImplicitRule { offset: 0, rules: 6 })
        );
    }
}
