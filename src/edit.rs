use std::ops::Range;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: byte-span replacement with verification.
///
/// Every rewrite action compiles down to this single primitive. Intelligence
/// lives in span acquisition (matchers, balance analysis), not in the
/// application logic. Edits operate on in-memory document text; writing the
/// result back to disk is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "SpanEdit does nothing until applied"]
pub struct SpanEdit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
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
    #[error("before-text verification failed at byte {byte_start}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range [{byte_start}, {byte_end}) in text of length {text_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        text_len: usize,
    },

    #[error("overlapping edit spans: [{first:?}) and [{second:?})")]
    OverlappingSpans {
        first: Range<usize>,
        second: Range<usize>,
    },

    #[error("edit range splits a UTF-8 code point at byte {offset}")]
    SplitsCodePoint { offset: usize },
}

impl SpanEdit {
    /// Create a new edit with automatic verification generation.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: &str,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before),
        }
    }

    /// Create a deletion of the given span.
    pub fn delete(byte_start: usize, byte_end: usize, expected_before: &str) -> Self {
        Self::new(byte_start, byte_end, "", expected_before)
    }

    pub fn span(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }

    /// Validate the edit against the current text, returning the span slice.
    fn validate<'a>(&self, text: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > text.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                text_len: text.len(),
            });
        }
        if !text.is_char_boundary(self.byte_start) {
            return Err(EditError::SplitsCodePoint {
                offset: self.byte_start,
            });
        }
        if !text.is_char_boundary(self.byte_end) {
            return Err(EditError::SplitsCodePoint {
                offset: self.byte_end,
            });
        }

        let current = &text[self.byte_start..self.byte_end];

        // Idempotency: an already-applied edit always validates.
        if current == self.new_text {
            return Ok(current);
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(current)
    }

    /// Apply this edit to the given text, producing the edited text.
    pub fn apply(&self, text: &str) -> Result<String, EditError> {
        self.validate(text)?;
        let mut out = String::with_capacity(
            text.len() + self.new_text.len() - (self.byte_end - self.byte_start),
        );
        out.push_str(&text[..self.byte_start]);
        out.push_str(&self.new_text);
        out.push_str(&text[self.byte_end..]);
        Ok(out)
    }

    /// Apply multiple edits to the same text in one pass.
    ///
    /// Edits are sorted by byte_start descending and applied bottom-to-top so
    /// earlier replacements never invalidate the offsets of later ones.
    /// Overlapping spans are rejected before anything is applied.
    pub fn apply_all(mut edits: Vec<SpanEdit>, text: &str) -> Result<String, EditError> {
        if edits.is_empty() {
            return Ok(text.to_string());
        }

        edits.sort_by(|a, b| b.byte_start.cmp(&a.byte_start));

        // Validate all edits against the original text first.
        for edit in &edits {
            edit.validate(text)?;
        }

        // Sorted descending: for each adjacent pair, the earlier edit must end
        // at or before the later edit starts.
        for window in edits.windows(2) {
            let (later, earlier) = (&window[0], &window[1]);
            if earlier.byte_end > later.byte_start {
                return Err(EditError::OverlappingSpans {
                    first: earlier.span(),
                    second: later.span(),
                });
            }
        }

        let mut out = text.to_string();
        for edit in &edits {
            out.replace_range(edit.byte_start..edit.byte_end, &edit.new_text);
        }
        Ok(out)
    }
}
