//! Error types returned by this crate.
//!
//! Mirroring the upstream `regex-automata`/`regex-syntax` style, these are
//! plain enums with hand-written `Display`/`Error` impls rather than
//! `thiserror`-derived ones.

use alloc::string::String;
use core::fmt;

/// An error that occurs while parsing or compiling a pattern.
///
/// Every variant carries the byte offset into the pattern at which the
/// error was detected, plus a short slice of the surrounding pattern text
/// for context in the rendered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    kind: CompileErrorKind,
    offset: usize,
    context: String,
}

/// The specific reason a pattern failed to compile.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompileErrorKind {
    /// A `\` appeared at the end of the pattern with nothing to escape.
    TrailingBackslash,
    /// A `\` was followed by a character that does not form a known escape.
    BadEscape,
    /// A `(` was never closed by a matching `)`.
    MissingParen,
    /// A `[` was never closed by a matching `]`.
    MissingBracket,
    /// A repeat operator (`*`, `+`, `?`, `{m,n}`) had nothing to repeat.
    InvalidRepeat,
    /// A `{m,n}` bound was malformed, e.g. `m > n` or not a valid integer.
    InvalidRepeatSize,
    /// A character class contained a malformed range or POSIX name.
    InvalidCharacterClass,
    /// A construct reserved for backtracking engines was used, e.g. a
    /// backreference, lookbehind, or possessive quantifier. These are
    /// rejected because they are incompatible with the linear-time
    /// guarantee this engine provides.
    InvalidPerlOp,
    /// The pattern itself is not valid UTF-8.
    InvalidUtf8,
    /// Compiling the pattern would exceed the configured size or recursion
    /// bound. This is how the compiler rejects patterns engineered to blow
    /// up program size or recursion depth (e.g. `a{1,1000000000}` or deeply
    /// nested groups).
    TooComplex,
}

impl CompileError {
    pub(crate) fn new(kind: CompileErrorKind, pattern: &str, offset: usize) -> CompileError {
        let start = pattern
            .char_indices()
            .rev()
            .find(|&(i, _)| i <= offset && offset - i <= 16)
            .map(|(i, _)| i)
            .unwrap_or(offset.saturating_sub(16));
        let end = (offset + 16).min(pattern.len());
        // Step to a char boundary so we never slice mid-codepoint.
        let start = (start..=offset).find(|&i| pattern.is_char_boundary(i)).unwrap_or(0);
        let end = (end..=pattern.len()).find(|&i| pattern.is_char_boundary(i)).unwrap_or(pattern.len());
        CompileError { kind, offset, context: String::from(&pattern[start..end]) }
    }

    /// The kind of error that occurred.
    pub fn kind(&self) -> &CompileErrorKind {
        &self.kind
    }

    /// The byte offset into the pattern at which the error was detected.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.kind {
            CompileErrorKind::TrailingBackslash => "trailing backslash",
            CompileErrorKind::BadEscape => "unrecognized escape sequence",
            CompileErrorKind::MissingParen => "unclosed group, missing `)`",
            CompileErrorKind::MissingBracket => "unclosed character class, missing `]`",
            CompileErrorKind::InvalidRepeat => "repeat operator with nothing to repeat",
            CompileErrorKind::InvalidRepeatSize => "invalid repeat bounds",
            CompileErrorKind::InvalidCharacterClass => "invalid character class",
            CompileErrorKind::InvalidPerlOp => {
                "construct requires backtracking and is not supported by this linear-time engine"
            }
            CompileErrorKind::InvalidUtf8 => "pattern is not valid UTF-8",
            CompileErrorKind::TooComplex => "pattern is too complex to compile",
        };
        write!(f, "{} at position {} (near \"{}\")", reason, self.offset, self.context)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CompileError {}

/// An error that occurs while matching a compiled pattern against a
/// haystack.
///
/// Unlike `CompileError`, this is not returned for "no match" — that is a
/// normal, successful outcome represented by `None`/`false`. `MatchError`
/// is reserved for cases where the search could not run to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchError {
    kind: MatchErrorKind,
}

/// The specific reason a search did not complete.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MatchErrorKind {
    /// The search exceeded its configured time budget or deduplication
    /// budget before it could determine whether a match exists. Surfaced
    /// instead of letting a pathological pattern run unbounded.
    TooComplex,
    /// The program was malformed in a way that should be unreachable given
    /// a program produced by this crate's own compiler.
    Internal(&'static str),
}

impl MatchError {
    pub(crate) fn too_complex() -> MatchError {
        MatchError { kind: MatchErrorKind::TooComplex }
    }

    pub(crate) fn internal(msg: &'static str) -> MatchError {
        MatchError { kind: MatchErrorKind::Internal(msg) }
    }

    /// The kind of error that occurred.
    pub fn kind(&self) -> &MatchErrorKind {
        &self.kind
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MatchErrorKind::TooComplex => {
                write!(f, "search exceeded its time or state budget")
            }
            MatchErrorKind::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MatchError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn context_never_splits_a_codepoint() {
        let pattern = "a(b\u{1F600}c";
        let err = CompileError::new(CompileErrorKind::MissingParen, pattern, pattern.len());
        assert!(pattern.is_char_boundary(0));
        let rendered = err.to_string();
        assert!(rendered.contains("unclosed group"));
    }

    #[test]
    fn display_includes_offset_and_reason() {
        let err = CompileError::new(CompileErrorKind::TrailingBackslash, "a\\", 1);
        let msg = err.to_string();
        assert!(msg.contains("trailing backslash"));
        assert!(msg.contains("position 1"));
        assert_eq!(*err.kind(), CompileErrorKind::TrailingBackslash);
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn match_error_display() {
        let err = MatchError::too_complex();
        assert_eq!(err.to_string(), "search exceeded its time or state budget");
        let err = MatchError::internal("bad pc");
        assert!(err.to_string().contains("bad pc"));
    }
}
