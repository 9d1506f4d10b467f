use similar::{ChangeTag, TextDiff};

/// Unified diff of `expected` against `actual`, line by line.
///
/// Line endings are made visible so CRLF/LF mismatches are not blank diffs.
pub fn unified_diff(expected: &str, actual: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual);
    let mut out = String::new();
    out.push_str("--- expected\n+++ actual\n");
    for group in diff.grouped_ops(3) {
        for op in group {
            for change in diff.iter_changes(&op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                out.push(sign);
                out.push_str(&visible_line(change.value()));
                out.push('\n');
            }
        }
        out.push_str("...\n");
    }
    out
}

fn visible_line(line: &str) -> String {
    if let Some(body) = line.strip_suffix("\r\n") {
        format!("{body}\\r\\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        body.to_string()
    } else {
        format!("{line}\\ no newline")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_changed_lines() {
        let diff = unified_diff("a\nb\nc\n", "a\nx\nc\n");
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+x\n"));
        assert!(diff.contains(" a\n"));
    }

    #[test]
    fn shows_line_ending_differences() {
        let diff = unified_diff("a\r\n", "a\n");
        assert!(diff.contains("-a\\r\\n"));
        assert!(diff.contains("+a\n"));
    }

    #[test]
    fn identical_text_has_no_hunks() {
        assert_eq!(unified_diff("same\n", "same\n"), "--- expected\n+++ actual\n");
    }
}
