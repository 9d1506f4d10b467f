use crate::source::{SnapshotId, SourceModel, Span};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: byte-span replacement with verification.
///
/// Every fix compiles down to a list of these. An edit is bound to the
/// snapshot it was computed against and records what it expects to find at
/// its span, so it can never be spliced into text it was not derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until it is spliced into text"]
pub struct Edit {
    /// Byte range `[start, end)` in the snapshot text
    pub span: Span,
    /// Replacement text; empty for a deletion
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
    /// Snapshot the span refers to
    pub snapshot: SnapshotId,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at {span}: expected {expected}, found {found:?}")]
    BeforeTextMismatch {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("invalid byte range {span} in text of length {text_len}")]
    InvalidByteRange { span: Span, text_len: usize },

    #[error("edit computed against snapshot {expected} applied to snapshot {found}")]
    StaleSnapshot {
        expected: SnapshotId,
        found: SnapshotId,
    },

    #[error("overlapping edits at {first} and {second}")]
    Overlap { first: Span, second: Span },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Edit {
    /// Replace the text at `span` in `model`.
    pub fn replace(
        model: &SourceModel,
        span: Span,
        new_text: impl Into<String>,
    ) -> Result<Self, EditError> {
        let before = model.slice(span).ok_or(EditError::InvalidByteRange {
            span,
            text_len: model.len(),
        })?;
        Ok(Self {
            span,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(before),
            snapshot: model.id(),
        })
    }

    /// Insert `text` at `offset`.
    pub fn insert(
        model: &SourceModel,
        offset: usize,
        text: impl Into<String>,
    ) -> Result<Self, EditError> {
        Self::replace(model, Span::empty(offset), text)
    }

    pub fn delete(model: &SourceModel, span: Span) -> Result<Self, EditError> {
        Self::replace(model, span, String::new())
    }

    /// Validate the edit against a snapshot.
    ///
    /// Checks snapshot identity, range bounds (including UTF-8 character
    /// boundaries) and the recorded before-text.
    pub fn validate(&self, model: &SourceModel) -> Result<(), EditError> {
        if self.snapshot != model.id() {
            return Err(EditError::StaleSnapshot {
                expected: self.snapshot,
                found: model.id(),
            });
        }
        let current = model.slice(self.span).ok_or(EditError::InvalidByteRange {
            span: self.span,
            text_len: model.len(),
        })?;
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                span: self.span,
                expected: format!("{:?}", self.expected_before),
                found: current.to_string(),
            });
        }
        Ok(())
    }
}

/// Splice non-overlapping edits into `text` in a single left-to-right pass.
///
/// Edits may arrive in any order. Offsets refer to `text`; nothing is
/// adjusted between edits. Overlap is re-checked here so that a caller
/// bypassing the batch applier still cannot corrupt the text.
pub fn splice(text: &str, edits: &[Edit]) -> Result<String, EditError> {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|e| (e.span.start, e.span.end));

    for pair in ordered.windows(2) {
        if pair[0].span.conflicts_with(pair[1].span) {
            return Err(EditError::Overlap {
                first: pair[0].span,
                second: pair[1].span,
            });
        }
    }

    let delta: isize = ordered
        .iter()
        .map(|e| e.new_text.len() as isize - e.span.len() as isize)
        .sum();
    let mut out = String::with_capacity((text.len() as isize + delta).max(0) as usize);
    let mut cursor = 0;
    for edit in ordered {
        let prefix = text.get(cursor..edit.span.start).ok_or(EditError::InvalidByteRange {
            span: edit.span,
            text_len: text.len(),
        })?;
        out.push_str(prefix);
        out.push_str(&edit.new_text);
        cursor = edit.span.end;
    }
    let rest = text.get(cursor..).ok_or(EditError::InvalidByteRange {
        span: Span::empty(cursor),
        text_len: text.len(),
    })?;
    out.push_str(rest);
    Ok(out)
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the file is left untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(EditError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path has no parent directory",
            )))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
