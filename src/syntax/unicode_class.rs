//! Derivation of [`ClassRange`] lists from `char` classification predicates.
//!
//! The engine has no dependency on a Unicode character-database crate.
//! Instead, `\p{...}` classes and POSIX bracket expressions are derived on demand by scanning
//! the codepoint space and merging consecutive codepoints that share a
//! classification into ranges. This is computed fresh per compile rather
//! than cached from a static table; for the pattern sizes this engine
//! targets that cost is paid once per `Regex::new`, not per match.

use alloc::vec::Vec;

use crate::syntax::ast::ClassRange;

/// Build sorted, merged ranges covering every `char` in `0..=0x10FFFF` (minus
/// the surrogate gap, which contains no valid `char` values) for which
/// `pred` holds.
pub fn ranges_from_predicate(pred: impl Fn(char) -> bool) -> Vec<ClassRange> {
    let mut ranges = Vec::new();
    let mut run_start: Option<u32> = None;

    let mut push_run = |ranges: &mut Vec<ClassRange>, start: u32, end: u32| {
        if let (Some(lo), Some(hi)) = (char::from_u32(start), char::from_u32(end)) {
            ranges.push(ClassRange::new(lo, hi));
        }
    };

    for cp in 0u32..=0x10FFFF {
        let Some(c) = char::from_u32(cp) else { continue };
        if pred(c) {
            run_start.get_or_insert(cp);
        } else if let Some(start) = run_start.take() {
            push_run(&mut ranges, start, cp - 1);
        }
    }
    if let Some(start) = run_start {
        push_run(&mut ranges, start, 0x10FFFF);
    }
    ranges
}

/// Ranges for the ASCII-only subset of a predicate (codepoints `0..=0x7F`).
pub fn ascii_ranges_from_predicate(pred: impl Fn(char) -> bool) -> Vec<ClassRange> {
    let mut ranges = Vec::new();
    let mut run_start: Option<u8> = None;
    for cp in 0u8..=0x7F {
        let c = cp as char;
        if pred(c) {
            run_start.get_or_insert(cp);
        } else if let Some(start) = run_start.take() {
            ranges.push(ClassRange::new(start as char, (cp - 1) as char));
        }
    }
    if let Some(start) = run_start {
        ranges.push(ClassRange::new(start as char, 0x7F as char));
    }
    ranges
}

/// Resolve a POSIX bracket-expression name (`alpha`, `digit`, ...) to its
/// ASCII-only range list, per classic POSIX "C" locale semantics. Returns
/// `None` for an unrecognized name.
pub fn posix_class_ranges(name: &str) -> Option<Vec<ClassRange>> {
    let ranges = match name {
        "alpha" => ascii_ranges_from_predicate(|c| c.is_ascii_alphabetic()),
        "digit" => ascii_ranges_from_predicate(|c| c.is_ascii_digit()),
        "alnum" => ascii_ranges_from_predicate(|c| c.is_ascii_alphanumeric()),
        "upper" => ascii_ranges_from_predicate(|c| c.is_ascii_uppercase()),
        "lower" => ascii_ranges_from_predicate(|c| c.is_ascii_lowercase()),
        "space" => ascii_ranges_from_predicate(|c| c.is_ascii_whitespace()),
        "punct" => ascii_ranges_from_predicate(|c| c.is_ascii_punctuation()),
        "cntrl" => ascii_ranges_from_predicate(|c| c.is_ascii_control()),
        "graph" => ascii_ranges_from_predicate(|c| c.is_ascii_graphic()),
        "print" => ascii_ranges_from_predicate(|c| c.is_ascii_graphic() || c == ' '),
        "blank" => ascii_ranges_from_predicate(|c| c == ' ' || c == '\t'),
        "xdigit" => ascii_ranges_from_predicate(|c| c.is_ascii_hexdigit()),
        "word" => ascii_ranges_from_predicate(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => return None,
    };
    Some(ranges)
}

/// Resolve a `\p{Name}`/`\pX` unicode property name. When `unicode` is
/// disabled, falls back to the ASCII-only subset of the same predicate.
pub fn unicode_property_ranges(name: &str) -> Option<Vec<ClassRange>> {
    let pred: fn(char) -> bool = match name {
        "L" | "Letter" | "Alpha" | "Alphabetic" => |c: char| c.is_alphabetic(),
        "N" | "Number" | "Digit" => |c: char| c.is_numeric(),
        "Space" | "White_Space" => |c: char| c.is_whitespace(),
        "Upper" | "Uppercase" => |c: char| c.is_uppercase(),
        "Lower" | "Lowercase" => |c: char| c.is_lowercase(),
        "Word" => |c: char| c.is_alphanumeric() || c == '_',
        _ => return None,
    };
    #[cfg(feature = "unicode")]
    {
        Some(ranges_from_predicate(pred))
    }
    #[cfg(not(feature = "unicode"))]
    {
        Some(ascii_ranges_from_predicate(pred))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_digit_ranges() {
        let r = posix_class_ranges("digit").unwrap();
        assert_eq!(r, alloc::vec![ClassRange::new('0', '9')]);
    }

    #[test]
    fn unicode_upper_includes_ascii() {
        let r = unicode_property_ranges("Upper").unwrap();
        assert!(r.iter().any(|cr| cr.contains('A')));
        assert!(!r.iter().any(|cr| cr.contains('a')));
    }
}
