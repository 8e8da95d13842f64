/*!
A linear-time, RE2-compatible regular expression engine.

`linrex` compiles a pattern string to Thompson-construction NFA bytecode and
matches it against input text with a simultaneous-state simulation: the
total work for one search is bounded by `O(len(program) * len(text))`, no
matter how the pattern is shaped. Backtracking constructs that break that
bound — backreferences, lookbehind, possessive quantifiers — are rejected at
parse time rather than silently accepted and run unbounded.

## Usage
```
use linrex::regex::Regex;

let re = Regex::new(r"(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})").unwrap();
let caps = re.captures("shipped on 2024-03-07").unwrap();
assert_eq!(caps.name("year").unwrap().as_str("shipped on 2024-03-07"), "2024");
assert_eq!(caps.get(0).unwrap().range(), 11..21);
```

## Catastrophic backtracking does not apply here
```
use linrex::regex::Regex;

let re = Regex::new(r"(a+)+b").unwrap();
let haystack = "a".repeat(10_000);
// A backtracking engine would take exponential time on this pattern/input
// pair; this one still finishes (and correctly reports no match) because
// every position dedups threads by program counter.
assert!(!re.is_match(&haystack));
```

## Crate features
*/
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]

extern crate alloc;

pub mod arena;
pub mod compiler;
pub mod error;
pub mod exec;
pub mod pool;
pub mod program;
pub mod regex;
pub mod syntax;

pub use regex::{Captures, Match, Regex, Span};

#[cfg(test)]
mod tests {
    use crate::regex::Regex;

    #[test]
    fn end_to_end_scenarios_from_spec() {
        let re = Regex::new(r"a(b|c)d").unwrap();
        let caps = re.captures("xabcdy").unwrap();
        assert_eq!(caps.get(0).unwrap().range(), 1..5);
        assert_eq!(caps.get(1).unwrap().range(), 2..3);

        let re = Regex::new(r".*?b").unwrap();
        assert_eq!(re.find("aaab").unwrap().range(), 0..4);

        let re = Regex::builder(r"(a+)(a+)").longest(true).build().unwrap();
        let caps = re.captures("aaaa").unwrap();
        assert_eq!(caps.get(0).unwrap().range(), 0..4);
        assert_eq!(caps.get(1).unwrap().range(), 0..3);
        assert_eq!(caps.get(2).unwrap().range(), 3..4);

        let re = Regex::new(r"a{2,4}").unwrap();
        assert_eq!(re.find("aaaaa").unwrap().range(), 0..4);

        let re = Regex::new(r"\bword\b").unwrap();
        assert_eq!(re.find("a word b").unwrap().range(), 2..6);

        let re = Regex::new(r"(a+)+b").unwrap();
        let haystack = alloc::format!("{}c", "a".repeat(30));
        assert!(!re.is_match(&haystack));
    }

    #[test]
    fn dot_excludes_newline_unless_dot_all() {
        assert!(!Regex::new(r"^.$").unwrap().is_match("\n"));
        assert!(Regex::builder(r"^.$").dot_all(true).build().unwrap().is_match("\n"));
    }

    #[test]
    fn anchored_empty_text() {
        assert!(Regex::new(r"^$").unwrap().is_match(""));
        assert!(!Regex::new(r"^$").unwrap().is_match("x"));
    }
}
