//! PikeVM-style executor: simultaneous NFA thread simulation over a
//! [`Program`], one rune at a time, never backtracking.
//!
//! The key invariant this module exists to protect: total work is bounded
//! by `O(len(program) * len(text))`. That bound comes from two things
//! working together —
//!
//! - `ThreadList::seen` deduplicates threads by `pc` within a single text
//!   position, so the same instruction is never explored twice at the same
//!   offset (this is what makes `(a+)+b` against a long run of `a`s cheap
//!   instead of exponential).
//! - epsilon-closure (following `Jmp`/`Alt`/`Save`/`Assert` without
//!   consuming input) is computed with an explicit frame stack rather than
//!   recursion, so pattern nesting depth cannot blow the call stack. The
//!   stack still reproduces the exact left-to-right priority order plain
//!   recursion would, which is what makes leftmost-first semantics work.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::MatchError;
use crate::program::{AssertKind, Inst, Pc, Program};

/// Per-rune decode result: the scalar value (or `None` for end of text, or
/// `U+FFFD` substitution on malformed input) plus how many bytes it
/// occupied in `text`.
struct Decoded {
    ch: Option<char>,
    width: usize,
}

/// Decode one rune starting at `text[pos]`. Bounded to at most 4 byte
/// lookahead, so this is O(1) regardless of how much text remains — calling
/// `core::str::from_utf8` on the whole suffix here would re-validate it on
/// every step and turn the executor quadratic.
fn decode_at(text: &[u8], pos: usize) -> Decoded {
    if pos >= text.len() {
        return Decoded { ch: None, width: 0 };
    }
    let b0 = text[pos];
    let (expected_len, init) = if b0 < 0x80 {
        (1, b0 as u32)
    } else if b0 & 0xE0 == 0xC0 {
        (2, (b0 & 0x1F) as u32)
    } else if b0 & 0xF0 == 0xE0 {
        (3, (b0 & 0x0F) as u32)
    } else if b0 & 0xF8 == 0xF0 {
        (4, (b0 & 0x07) as u32)
    } else {
        return Decoded { ch: Some('\u{FFFD}'), width: 1 };
    };
    if pos + expected_len > text.len() {
        return Decoded { ch: Some('\u{FFFD}'), width: 1 };
    }
    let mut value = init;
    for i in 1..expected_len {
        let b = text[pos + i];
        if b & 0xC0 != 0x80 {
            return Decoded { ch: Some('\u{FFFD}'), width: 1 };
        }
        value = (value << 6) | (b & 0x3F) as u32;
    }
    match char::from_u32(value) {
        Some(c) if c.len_utf8() == expected_len => Decoded { ch: Some(c), width: expected_len },
        _ => Decoded { ch: Some('\u{FFFD}'), width: 1 },
    }
}

/// `\b`/`\B` are defined over ASCII word characters only. A trailing or
/// leading UTF-8 continuation byte is never ASCII alphanumeric, so testing
/// raw bytes (rather than decoding the full rune on either side) is already
/// correct for this definition and avoids an extra decode on every
/// assertion check.
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn assertion_holds(kind: AssertKind, text: &[u8], pos: usize, multiline: bool) -> bool {
    match kind {
        AssertKind::BeginText => pos == 0,
        AssertKind::EndText => pos == text.len(),
        AssertKind::BeginLine => {
            if !multiline {
                pos == 0
            } else {
                pos == 0 || text[pos - 1] == b'\n'
            }
        }
        AssertKind::EndLine => {
            if !multiline {
                pos == text.len()
            } else {
                pos == text.len() || text[pos] == b'\n'
            }
        }
        AssertKind::WordBoundary | AssertKind::NoWordBoundary => {
            let before = pos > 0 && is_word_byte(text[pos - 1]);
            let after = pos < text.len() && is_word_byte(text[pos]);
            let boundary = before != after;
            if kind == AssertKind::WordBoundary {
                boundary
            } else {
                !boundary
            }
        }
    }
}

#[derive(Clone)]
struct Thread {
    pc: Pc,
    caps: Rc<Vec<i64>>,
}

struct ThreadList {
    threads: Vec<Thread>,
    seen_gen: Vec<u32>,
    gen: u32,
}

impl ThreadList {
    fn new(num_insts: usize) -> ThreadList {
        ThreadList { threads: Vec::new(), seen_gen: vec![0; num_insts], gen: 0 }
    }

    fn resize(&mut self, num_insts: usize) {
        if self.seen_gen.len() != num_insts {
            self.seen_gen = vec![0; num_insts];
            self.gen = 0;
        }
    }

    /// Start a fresh position: instead of re-zeroing `seen` (an O(program
    /// size) cost paid once per text byte, which would make the whole
    /// search O(program * text) in constant factor alone), bump a
    /// generation counter and compare lazily in `is_new`.
    fn clear(&mut self) {
        self.threads.clear();
        self.gen = self.gen.wrapping_add(1);
    }

    fn is_new(&mut self, pc: Pc) -> bool {
        let idx = pc as usize;
        if self.seen_gen[idx] == self.gen {
            false
        } else {
            self.seen_gen[idx] = self.gen;
            true
        }
    }
}

/// Per-`Regex` reusable scratch space, handed out by its [`crate::pool::Pool`]
/// so concurrent searches against the same compiled program don't contend
/// on allocation.
pub struct Cache {
    clist: ThreadList,
    nlist: ThreadList,
}

impl Cache {
    pub fn new(num_insts: usize) -> Cache {
        Cache { clist: ThreadList::new(num_insts), nlist: ThreadList::new(num_insts) }
    }
}

/// Knobs that change how a search behaves without changing the compiled
/// program.
#[derive(Clone, Copy, Debug)]
pub struct SearchOptions {
    /// Only try to match starting at `start`, rather than sweeping forward.
    pub anchored: bool,
    /// POSIX leftmost-longest instead of leftmost-first (Perl-style).
    pub longest: bool,
    /// Upper bound on the number of epsilon-closure steps before giving up
    /// with [`MatchError`]. Bounds worst-case work independent of a wall
    /// clock, so it behaves the same on a slow CI runner as a fast laptop.
    pub max_steps: u64,
}

impl Default for SearchOptions {
    fn default() -> SearchOptions {
        SearchOptions { anchored: false, longest: false, max_steps: 10_000_000 }
    }
}

/// Run `prog` against `text` starting the sweep at byte offset `start`.
/// Returns the capture-slot vector of the match found (slot `2*i`/`2*i+1`
/// hold the start/end byte offset of group `i`, group 0 being the whole
/// match), or `None` if no match exists.
pub fn search(
    prog: &Program,
    text: &[u8],
    start: usize,
    options: SearchOptions,
    cache: &mut Cache,
) -> Result<Option<Vec<i64>>, MatchError> {
    cache.clist.resize(prog.insts.len());
    cache.nlist.resize(prog.insts.len());
    cache.clist.clear();
    cache.nlist.clear();

    let num_slots = prog.num_slots();
    let mut matched: Option<Rc<Vec<i64>>> = None;
    let mut pos = start;
    let mut steps: u64 = 0;
    let anchored = options.anchored || prog.anchored_start;

    loop {
        if cache.clist.threads.is_empty() && matched.is_some() {
            break;
        }
        if (pos == start || !anchored) && matched.is_none() {
            let mut caps = vec![-1i64; num_slots];
            caps[0] = pos as i64;
            add_thread(&mut cache.clist, prog, prog.start, Rc::new(caps), text, pos, &mut steps, options.max_steps)?;
        }
        if cache.clist.threads.is_empty() {
            if matched.is_some() || anchored || pos > text.len() {
                break;
            }
        }

        let Decoded { ch, width } = decode_at(text, pos);
        cache.nlist.clear();

        let mut i = 0;
        while i < cache.clist.threads.len() {
            steps += 1;
            if steps > options.max_steps {
                return Err(MatchError::too_complex());
            }
            let thread = cache.clist.threads[i].clone();
            i += 1;
            let next_pc = match &prog.insts[thread.pc as usize] {
                Inst::Char(c, next) => (ch == Some(*c)).then_some(*next),
                Inst::Class(idx, next) => {
                    ch.is_some_and(|c| prog.classes[*idx as usize].contains(c)).then_some(*next)
                }
                Inst::AnyChar(next) => ch.is_some().then_some(*next),
                Inst::AnyCharNoNL(next) => ch.is_some_and(|c| c != '\n').then_some(*next),
                Inst::Match => {
                    // The thread was queued before this position's char was
                    // decoded, so its `caps[1]` (match end) is still unset;
                    // record it here, on a fresh clone so threads that keep
                    // running elsewhere aren't affected.
                    let mut end_caps = thread.caps.clone();
                    Rc::make_mut(&mut end_caps)[1] = pos as i64;
                    if options.longest {
                        let better = match &matched {
                            None => true,
                            Some(best) => {
                                end_caps[0] < best[0] || (end_caps[0] == best[0] && end_caps[1] > best[1])
                            }
                        };
                        if better {
                            matched = Some(end_caps);
                        }
                    } else {
                        matched = Some(end_caps);
                        // Lower-priority threads still queued at this
                        // position can never win over this match under
                        // leftmost-first rules; stop considering them.
                        cache.clist.threads.truncate(i);
                    }
                    None
                }
                _ => unreachable!("epsilon instructions are resolved inside add_thread"),
            };
            if let Some(next) = next_pc {
                add_thread(&mut cache.nlist, prog, next, thread.caps, text, pos + width, &mut steps, options.max_steps)?;
            }
        }

        if width == 0 {
            break;
        }
        pos += width;
        core::mem::swap(&mut cache.clist, &mut cache.nlist);
    }

    Ok(matched.map(|rc| (*rc).clone()))
}

/// Evaluate a zero-width lookahead sub-program for an existence-only,
/// anchored match starting exactly at `pos`. Allocates its own scratch
/// rather than sharing the caller's `Cache`; see `DESIGN.md` for why nested
/// lookahead therefore does not carry the same linear-time guarantee as the
/// rest of the engine.
fn lookahead_matches(sub: &Program, text: &[u8], pos: usize) -> Result<bool, MatchError> {
    let mut cache = Cache::new(sub.insts.len());
    let options = SearchOptions { anchored: true, longest: false, max_steps: 1_000_000 };
    Ok(search(sub, text, pos, options, &mut cache)?.is_some())
}

/// Epsilon-closure from `pc`, following `Jmp`/`Alt`/`Save`/`Assert`/`Look`
/// without consuming input, appending every consuming instruction (or
/// `Match`) it reaches to `list` in priority order. Implemented with an
/// explicit stack instead of recursion: pushing `secondary` before
/// `primary` at an `Alt` means `primary` (and everything it leads to) is
/// fully drained from the stack before `secondary` is even looked at,
/// which is exactly the left-to-right order plain recursion would produce.
fn add_thread(
    list: &mut ThreadList,
    prog: &Program,
    start_pc: Pc,
    start_caps: Rc<Vec<i64>>,
    text: &[u8],
    pos: usize,
    steps: &mut u64,
    max_steps: u64,
) -> Result<(), MatchError> {
    let mut stack: Vec<(Pc, Rc<Vec<i64>>)> = vec![(start_pc, start_caps)];
    while let Some((pc, caps)) = stack.pop() {
        *steps += 1;
        if *steps > max_steps {
            return Err(MatchError::too_complex());
        }
        if !list.is_new(pc) {
            continue;
        }
        match &prog.insts[pc as usize] {
            Inst::Jmp(t) => stack.push((*t, caps)),
            Inst::Alt(a, b) => {
                stack.push((*b, caps.clone()));
                stack.push((*a, caps));
            }
            Inst::Save(slot, next) => {
                let mut caps = caps;
                let slot = *slot as usize;
                if slot < caps.len() {
                    Rc::make_mut(&mut caps)[slot] = pos as i64;
                }
                stack.push((*next, caps));
            }
            Inst::Assert(kind, next) => {
                if assertion_holds(*kind, text, pos, prog.multiline) {
                    stack.push((*next, caps));
                }
            }
            Inst::Look(idx, negated, next) => {
                let is_match = lookahead_matches(&prog.lookaheads[*idx as usize], text, pos)?;
                if is_match != *negated {
                    stack.push((*next, caps));
                }
            }
            Inst::Char(_, _) | Inst::Class(_, _) | Inst::AnyChar(_) | Inst::AnyCharNoNL(_) | Inst::Match => {
                list.threads.push(Thread { pc, caps });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, CompileOptions};

    fn run(pattern: &str, text: &str, opts: SearchOptions) -> Option<Vec<i64>> {
        let prog = compile(pattern, CompileOptions::default()).unwrap();
        let mut cache = Cache::new(prog.insts.len());
        search(&prog, text.as_bytes(), 0, opts, &mut cache).unwrap()
    }

    #[test]
    fn simple_literal_match() {
        let caps = run("abc", "xxabcxx", SearchOptions::default()).unwrap();
        assert_eq!((caps[0], caps[1]), (2, 5));
    }

    #[test]
    fn leftmost_first_prefers_earlier_alternative() {
        let caps = run("a|ab", "ab", SearchOptions::default()).unwrap();
        assert_eq!((caps[0], caps[1]), (0, 1));
    }

    #[test]
    fn leftmost_longest_prefers_longer_match() {
        let opts = SearchOptions { longest: true, ..SearchOptions::default() };
        let caps = run("a|ab", "ab", opts).unwrap();
        assert_eq!((caps[0], caps[1]), (0, 2));
    }

    #[test]
    fn capture_group_offsets() {
        let caps = run("a(b+)c", "xabbbcx", SearchOptions::default()).unwrap();
        assert_eq!((caps[0], caps[1]), (1, 6));
        assert_eq!((caps[2], caps[3]), (2, 5));
    }

    #[test]
    fn star_can_match_empty_at_end() {
        let caps = run("a*", "", SearchOptions::default()).unwrap();
        assert_eq!((caps[0], caps[1]), (0, 0));
    }

    #[test]
    fn no_match_returns_none() {
        assert!(run("xyz", "abc", SearchOptions::default()).is_none());
    }

    #[test]
    fn invalid_utf8_suffix_is_substituted_not_fatal() {
        let prog = compile(".", CompileOptions { dot_all: true, ..CompileOptions::default() }).unwrap();
        let mut cache = Cache::new(prog.insts.len());
        let text: &[u8] = &[0xFF];
        let got = search(&prog, text, 0, SearchOptions::default(), &mut cache).unwrap();
        assert_eq!(got.map(|c| (c[0], c[1])), Some((0, 1)));
    }

    #[test]
    fn catastrophic_backtracking_pattern_stays_bounded() {
        let prog = compile("(a+)+b", CompileOptions::default()).unwrap();
        let mut cache = Cache::new(prog.insts.len());
        let text = alloc::format!("{}c", "a".repeat(5000));
        let opts = SearchOptions { max_steps: 1_000_000, ..SearchOptions::default() };
        let result = search(&prog, text.as_bytes(), 0, opts, &mut cache).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn word_boundary_matches_ascii_edges() {
        let caps = run("\\bcat\\b", "a cat sat", SearchOptions::default()).unwrap();
        assert_eq!((caps[0], caps[1]), (2, 5));
    }

    #[test]
    fn lookahead_constrains_without_consuming() {
        let caps = run("foo(?=bar)", "foobar", SearchOptions::default()).unwrap();
        assert_eq!((caps[0], caps[1]), (0, 3));
        assert!(run("foo(?=bar)", "foobaz", SearchOptions::default()).is_none());
    }

    #[test]
    fn negative_lookahead_excludes_match() {
        assert!(run("foo(?!bar)", "foobar", SearchOptions::default()).is_none());
        let caps = run("foo(?!bar)", "foobaz", SearchOptions::default()).unwrap();
        assert_eq!((caps[0], caps[1]), (0, 3));
    }
}
