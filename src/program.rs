//! Compiled bytecode: the flat, indexed instruction table a [`crate::compiler`]
//! produces and [`crate::exec`] walks.
//!
//! There is no pointer in sight here on purpose (see the arena-vs-pointer
//! discipline note in `arena.rs`): every jump target is a plain `Pc` index
//! into [`Program::insts`], so the whole program is relocatable, `Clone`-able
//! by value, and safe to share read-only across threads.

use alloc::string::String;
use alloc::vec::Vec;

use crate::arena::TypedArena;
use crate::syntax::ast::ClassRange;

/// Index of one instruction within a [`Program`]'s instruction table.
pub type Pc = u32;

/// A zero-width assertion an [`Inst::Assert`] checks against the thread's
/// current position in the haystack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssertKind {
    BeginLine,
    EndLine,
    BeginText,
    EndText,
    WordBoundary,
    NoWordBoundary,
}

/// A normalized character class: sorted, disjoint `ranges`, optionally
/// `negated`. Referenced from [`Inst::Class`] by index rather than inlined
/// into the instruction, keeping `Inst` small and `Copy`-friendly.
#[derive(Clone, Debug)]
pub struct ClassEntry {
    pub ranges: Vec<ClassRange>,
    pub negated: bool,
}

impl ClassEntry {
    pub fn contains(&self, c: char) -> bool {
        let hit = self.ranges.binary_search_by(|r| {
            if c < r.lo {
                core::cmp::Ordering::Greater
            } else if c > r.hi {
                core::cmp::Ordering::Less
            } else {
                core::cmp::Ordering::Equal
            }
        });
        hit.is_ok() != self.negated
    }
}

/// One bytecode instruction. Every variant but `Match` carries its successor
/// `Pc` explicitly (rather than relying on an implicit `pc + 1` fall-through),
/// so that [`crate::compiler`]'s fragment/patch discipline can wire any
/// instruction's successor to any later-or-earlier-compiled target. This is
/// what makes fragment composition order-independent: a `Save` or `Char`
/// compiled before its successor exists yet is patched exactly the same way
/// a `Jmp` is.
#[derive(Clone, Debug)]
pub enum Inst {
    /// Matches exactly one rune, then continues at `next`.
    Char(char, Pc),
    /// Matches one rune covered (or not, if negated) by the class at
    /// `classes[index]`, then continues at `next`.
    Class(u32, Pc),
    /// Matches any rune, including `\n` (`dot_all`), then continues at `next`.
    AnyChar(Pc),
    /// Matches any rune except `\n`, then continues at `next`.
    AnyCharNoNL(Pc),
    /// Zero-width: proceed to `next` only if `kind` holds at the current position.
    Assert(AssertKind, Pc),
    /// Zero-width: record the current byte offset into capture slot `slot`,
    /// then continue at `next`.
    Save(u32, Pc),
    /// Zero-width: unconditional jump.
    Jmp(Pc),
    /// Zero-width: fork into two threads. `primary` is tried with higher
    /// priority than `secondary` (this encodes leftmost-first precedence:
    /// greedy repeats point `primary` at the loop body, `secondary` past
    /// it; lazy repeats swap the two).
    Alt(Pc, Pc),
    /// Zero-width: succeeds only if the independent sub-program
    /// `lookaheads[index]` finds an anchored match starting here; `negated`
    /// inverts the test, then continues at `next`. Each occurrence runs its
    /// own bounded search, but nested lookaheads are not folded into the
    /// enclosing program's single pass, so this instruction sits outside the
    /// main linearity proof.
    Look(u32, bool, Pc),
    /// Accept: a full match ends here.
    Match,
}

/// A compiled pattern: a flat instruction table plus the side tables its
/// instructions reference by index.
#[derive(Clone, Debug)]
pub struct Program {
    pub insts: Vec<Inst>,
    pub classes: Vec<ClassEntry>,
    /// Independently compiled programs for each lookahead sub-expression,
    /// referenced by [`Inst::Look`].
    pub lookaheads: Vec<Program>,
    pub start: Pc,
    /// Number of explicit capturing groups, not counting the implicit
    /// whole-match group 0.
    pub num_captures: u32,
    /// `capture_names[i]` names capture group `i + 1`, or `None` if it was
    /// never given a name.
    pub capture_names: Vec<Option<String>>,
    /// True when the pattern can only ever match starting at byte offset 0
    /// (e.g. it begins with `^` outside multiline mode), letting the
    /// executor skip the O(n) unanchored start-position sweep.
    pub anchored_start: bool,
    /// Whether `^`/`$` (compiled as `AssertKind::BeginLine`/`EndLine`) match
    /// at internal line boundaries in addition to the start/end of text.
    pub multiline: bool,
}

impl Program {
    /// Number of capture slots: two per group (start, end) including the
    /// implicit group 0.
    pub fn num_slots(&self) -> usize {
        2 * (self.num_captures as usize + 1)
    }
}

/// Drain a compile-time, cap-enforced [`TypedArena<T>`] into the plain `Vec<T>`
/// a finished [`Program`] stores. The arena's job (rejecting a pattern whose
/// compiled form would blow past the size cap) is done by the time the
/// compiler calls this; the program itself just needs flat, directly
/// indexable storage.
pub(crate) fn finalize<T: Clone>(arena: TypedArena<T>) -> Vec<T> {
    arena.as_slice().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_entry_membership_and_negation() {
        let c = ClassEntry { ranges: alloc::vec![ClassRange::new('a', 'z')], negated: false };
        assert!(c.contains('m'));
        assert!(!c.contains('M'));

        let neg = ClassEntry { ranges: c.ranges.clone(), negated: true };
        assert!(!neg.contains('m'));
        assert!(neg.contains('M'));
    }

    #[test]
    fn num_slots_accounts_for_group_zero() {
        let prog = Program {
            insts: Vec::new(),
            classes: Vec::new(),
            lookaheads: Vec::new(),
            start: 0,
            num_captures: 2,
            capture_names: alloc::vec![None, None],
            anchored_start: false,
            multiline: false,
        };
        assert_eq!(prog.num_slots(), 6);
    }
}
