//! The public matching API: [`Regex`], its [`Builder`], and the match
//! types it returns.
//!
//! # Overview
//!
//! ```
//! use linrex::regex::Regex;
//!
//! let re = Regex::new(r"(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})").unwrap();
//! let caps = re.captures("shipped on 2024-03-07").unwrap();
//! assert_eq!(&caps.name("year").unwrap().as_str("shipped on 2024-03-07"), &"2024");
//! assert_eq!(caps.get(0).unwrap().range(), 11..21);
//! ```
//!
//! # Synchronization and cloning
//!
//! A [`Regex`] is cheap to clone: the compiled [`crate::program::Program`]
//! is held behind an `Arc` and shared, while each clone gets its own
//! [`Pool`] of match-time scratch space. That split means cloning a `Regex`
//! to hand to another thread never makes the two threads contend over the
//! same scratch pool — the cost of sharing nothing is one extra `Arc` bump
//! plus an empty `Vec`, not a deep copy of the compiled program.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Range;

use bon::bon;

use crate::compiler::{self, CompileOptions};
use crate::error::{CompileError, MatchError};
use crate::exec::{self, Cache, SearchOptions};
use crate::pool::Pool;
use crate::program::Program;

/// A byte-offset span `[start, end)` into a searched haystack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Slice `haystack` (the same haystack the match was found in) by this
    /// span.
    pub fn as_str<'h>(&self, haystack: &'h str) -> &'h str {
        &haystack[self.range()]
    }
}

/// The overall span of one match, returned by [`Regex::find`]/[`Regex::find_iter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    span: Span,
}

impl Match {
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }

    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    pub fn as_str<'h>(&self, haystack: &'h str) -> &'h str {
        self.span.as_str(haystack)
    }
}

/// Every capture group's span from one match: slot 0 is the whole match,
/// slots 1.. are the explicit groups in the order they were opened.
#[derive(Clone, Debug)]
pub struct Captures {
    slots: Vec<i64>,
    names: Arc<Vec<Option<String>>>,
}

impl Captures {
    /// The span of group `i`, or `None` if group `i` did not participate in
    /// this match (e.g. the untaken branch of an alternation).
    pub fn get(&self, i: usize) -> Option<Span> {
        let start = *self.slots.get(2 * i)?;
        let end = *self.slots.get(2 * i + 1)?;
        if start < 0 || end < 0 {
            None
        } else {
            Some(Span { start: start as usize, end: end as usize })
        }
    }

    /// The span of the group named `name` via `(?P<name>...)`/`(?<name>...)`.
    pub fn name(&self, name: &str) -> Option<Span> {
        let idx = self.names.iter().position(|n| n.as_deref() == Some(name))?;
        self.get(idx + 1)
    }

    /// Number of groups, including the implicit whole-match group 0.
    pub fn len(&self) -> usize {
        self.slots.len() / 2
    }
}

/// Options that change how a call searches without recompiling the
/// pattern: whether the search may only start at byte 0, and whether
/// leftmost-first (default) or leftmost-longest semantics resolve
/// ambiguous alternations.
#[derive(Clone, Copy, Debug, Default)]
struct SearchDefaults {
    anchored: bool,
    longest: bool,
}

/// A compiled, linear-time regular expression.
pub struct Regex {
    program: Arc<Program>,
    pool: Pool<Cache>,
    defaults: SearchDefaults,
}

fn new_cache() -> Cache {
    Cache::new(0)
}

#[bon]
impl Regex {
    /// Compile `pattern` with non-default options. See [`Regex::new`] for
    /// the common case.
    ///
    /// ```
    /// use linrex::regex::Regex;
    ///
    /// let re = Regex::builder(r"hello").case_insensitive(true).build().unwrap();
    /// assert!(re.is_match("Hello, World!"));
    /// ```
    #[builder(finish_fn = build)]
    pub fn new(
        #[builder(start_fn)] pattern: &str,
        #[builder(default = false)] case_insensitive: bool,
        #[builder(default = false)] dot_all: bool,
        #[builder(default = false)] multiline: bool,
        #[builder(default = false)] anchored: bool,
        #[builder(default = false)] longest: bool,
    ) -> Result<Regex, CompileError> {
        let options = CompileOptions { case_insensitive, dot_all, multiline };
        let program = Arc::new(compiler::compile(pattern, options)?);
        Ok(Regex { program, pool: Pool::new(new_cache), defaults: SearchDefaults { anchored, longest } })
    }
}

impl Regex {
    /// Compile `pattern` with default options (case-sensitive, `.` excludes
    /// `\n`, `^`/`$` anchor only the whole text, leftmost-first, unanchored
    /// search).
    ///
    /// ```
    /// use linrex::regex::Regex;
    ///
    /// let re = Regex::new(r"\d+").unwrap();
    /// assert_eq!(re.find("order #42").unwrap().range(), 7..9);
    /// ```
    pub fn new(pattern: &str) -> Result<Regex, CompileError> {
        Regex::builder(pattern).build()
    }

    /// Number of explicit capturing groups in the pattern (not counting the
    /// implicit whole-match group 0).
    pub fn captures_len(&self) -> usize {
        self.program.num_captures as usize + 1
    }

    fn search_options(&self) -> SearchOptions {
        SearchOptions { anchored: self.defaults.anchored, longest: self.defaults.longest, ..SearchOptions::default() }
    }

    fn try_search(&self, haystack: &str, start: usize) -> Result<Option<Vec<i64>>, MatchError> {
        let mut cache = self.pool.get();
        exec::search(&self.program, haystack.as_bytes(), start, self.search_options(), &mut cache)
    }

    /// Whether the pattern matches anywhere in `haystack`.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.try_search(haystack, 0).map(|m| m.is_some()).unwrap_or(false)
    }

    /// The leftmost match, if any.
    ///
    /// ```
    /// use linrex::regex::Regex;
    ///
    /// let re = Regex::new("a+").unwrap();
    /// assert!(re.find("xyz").is_none());
    /// ```
    pub fn find(&self, haystack: &str) -> Option<Match> {
        let slots = self.try_search(haystack, 0).ok().flatten()?;
        Some(Match { span: Span { start: slots[0] as usize, end: slots[1] as usize } })
    }

    /// The leftmost match's captures, if any.
    pub fn captures(&self, haystack: &str) -> Option<Captures> {
        let slots = self.try_search(haystack, 0).ok().flatten()?;
        Some(Captures { slots, names: Arc::new(self.program.capture_names.clone()) })
    }

    /// Iterate non-overlapping matches left to right.
    ///
    /// ```
    /// use linrex::regex::Regex;
    ///
    /// let re = Regex::new(r"\w+").unwrap();
    /// let words: Vec<&str> = re.find_iter("the quick fox").map(|m| m.as_str("the quick fox")).collect();
    /// assert_eq!(words, vec!["the", "quick", "fox"]);
    /// ```
    pub fn find_iter<'r, 'h>(&'r self, haystack: &'h str) -> FindMatches<'r, 'h> {
        FindMatches { re: self, haystack, pos: 0, done: false }
    }

    /// Iterate non-overlapping matches' captures left to right.
    pub fn captures_iter<'r, 'h>(&'r self, haystack: &'h str) -> CaptureMatches<'r, 'h> {
        CaptureMatches { re: self, haystack, pos: 0, done: false }
    }
}

impl Clone for Regex {
    fn clone(&self) -> Regex {
        Regex { program: self.program.clone(), pool: Pool::new(new_cache), defaults: self.defaults }
    }
}

/// Iterator over non-overlapping [`Match`]es, returned by [`Regex::find_iter`].
pub struct FindMatches<'r, 'h> {
    re: &'r Regex,
    haystack: &'h str,
    pos: usize,
    done: bool,
}

impl<'r, 'h> Iterator for FindMatches<'r, 'h> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        if self.done || self.pos > self.haystack.len() {
            return None;
        }
        let slots = self.re.try_search(self.haystack, self.pos).ok().flatten()?;
        let (start, end) = (slots[0] as usize, slots[1] as usize);
        self.pos = if end > start { end } else { next_char_boundary(self.haystack, end) };
        if self.pos > self.haystack.len() {
            self.done = true;
        }
        Some(Match { span: Span { start, end } })
    }
}

/// Iterator over non-overlapping [`Captures`], returned by [`Regex::captures_iter`].
pub struct CaptureMatches<'r, 'h> {
    re: &'r Regex,
    haystack: &'h str,
    pos: usize,
    done: bool,
}

impl<'r, 'h> Iterator for CaptureMatches<'r, 'h> {
    type Item = Captures;

    fn next(&mut self) -> Option<Captures> {
        if self.done || self.pos > self.haystack.len() {
            return None;
        }
        let slots = self.re.try_search(self.haystack, self.pos).ok().flatten()?;
        let (start, end) = (slots[0] as usize, slots[1] as usize);
        self.pos = if end > start { end } else { next_char_boundary(self.haystack, end) };
        if self.pos > self.haystack.len() {
            self.done = true;
        }
        Some(Captures { slots, names: Arc::new(self.re.program.capture_names.clone()) })
    }
}

fn next_char_boundary(s: &str, from: usize) -> usize {
    let mut i = from + 1;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal() {
        let re = Regex::new("abc").unwrap();
        assert!(re.is_match("xxabcxx"));
        assert_eq!(re.find("xxabcxx").unwrap().range(), 2..5);
    }

    #[test]
    fn case_insensitive_via_builder() {
        let re = Regex::builder("hello").case_insensitive(true).build().unwrap();
        assert!(re.is_match("HELLO"));
        assert!(!Regex::new("hello").unwrap().is_match("HELLO"));
    }

    #[test]
    fn alternation_priority() {
        let re = Regex::new("a|ab").unwrap();
        assert_eq!(re.find("ab").unwrap().range(), 0..1);
        let longest = Regex::builder("a|ab").longest(true).build().unwrap();
        assert_eq!(longest.find("ab").unwrap().range(), 0..2);
    }

    #[test]
    fn named_captures() {
        let re = Regex::new(r"(?P<year>\d{4})-(?P<month>\d{2})").unwrap();
        let caps = re.captures("2024-03").unwrap();
        assert_eq!(caps.name("year").unwrap().range(), 0..4);
        assert_eq!(caps.name("month").unwrap().range(), 5..7);
        assert!(caps.name("nope").is_none());
    }

    #[test]
    fn find_iter_is_non_overlapping_left_to_right() {
        let re = Regex::new(r"\d+").unwrap();
        let matches: Vec<_> = re.find_iter("a1 b22 c333").map(|m| m.range()).collect();
        assert_eq!(matches, vec![1..2, 4..6, 8..11]);
    }

    #[test]
    fn find_iter_handles_empty_matches_without_looping_forever() {
        let re = Regex::new(r"a*").unwrap();
        let matches: Vec<_> = re.find_iter("baab").map(|m| m.range()).take(10).collect();
        assert!(matches.len() < 10);
    }

    #[test]
    fn clone_gets_independent_pool() {
        let re = Regex::new("x").unwrap();
        let re2 = re.clone();
        assert!(re2.is_match("x"));
    }

    #[test]
    fn redos_pattern_terminates_without_matching() {
        let re = Regex::new(r"(a+)+b").unwrap();
        let haystack = alloc::format!("{}c", "a".repeat(10_000));
        assert!(!re.is_match(&haystack));
    }
}
