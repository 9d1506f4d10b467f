use serde::Deserialize;

/// Line-ending normalization applied to fixture text before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndings {
    /// Compare text exactly as given
    Preserve,
    /// Convert `\r\n` to `\n`
    #[default]
    Lf,
    /// Convert every line ending to `\r\n`
    Crlf,
}

impl LineEndings {
    pub fn normalize(self, text: &str) -> String {
        match self {
            LineEndings::Preserve => text.to_string(),
            LineEndings::Lf => text.replace("\r\n", "\n"),
            LineEndings::Crlf => text.replace("\r\n", "\n").replace('\n', "\r\n"),
        }
    }
}

/// The newline sequence a document predominantly uses.
pub fn detect_newline(text: &str) -> &'static str {
    let crlf = text.matches("\r\n").count();
    let lf = text.matches('\n').count() - crlf;
    if crlf > lf {
        "\r\n"
    } else {
        "\n"
    }
}

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Leading spaces and tabs of the line containing `offset`.
pub fn line_indent(text: &str, offset: usize) -> &str {
    let start = line_start(text, offset);
    let len = text[start..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    &text[start..start + len]
}

/// Maps byte offsets to 1-based line/column pairs.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    /// 1-based (line, column); column counts bytes.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
