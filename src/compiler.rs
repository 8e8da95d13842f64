//! Thompson construction: translates an [`Ast`] into a [`Program`].
//!
//! Each node compiles to a *fragment*: a start [`Pc`] plus a list of
//! "dangling" output slots still waiting to be pointed somewhere. Composing
//! two fragments (e.g. for `Concat`) means patching the first fragment's
//! dangling outs to the second fragment's start; the top-level compile
//! patches the final fragment's outs to a `Match` instruction. This is the
//! same fragment/patch-list discipline Thompson's original construction and
//! every NFA-simulation regex engine since (including RE2 and Rust's
//! `regex` crate) use to build the program in one linear pass without ever
//! needing a forward reference to an instruction that doesn't exist yet.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::arena::TypedArena;
use crate::error::{CompileError, CompileErrorKind};
use crate::program::{AssertKind, ClassEntry, Inst, Pc, Program};
use crate::syntax::ast::{AnchorKind, Ast, AstId, ClassRange};
use crate::syntax::parser::{self, ParseResult};
use crate::syntax::ranges;

/// Flags resolved from [`crate::regex::Builder`] that affect how the AST
/// translates into bytecode (as opposed to flags like `longest_match` that
/// only change how the executor walks an already-compiled program).
#[derive(Clone, Copy, Debug)]
pub struct CompileOptions {
    pub case_insensitive: bool,
    pub dot_all: bool,
    pub multiline: bool,
}

impl Default for CompileOptions {
    fn default() -> CompileOptions {
        CompileOptions { case_insensitive: false, dot_all: false, multiline: false }
    }
}

/// Parse and compile `pattern` in one call.
pub fn compile(pattern: &str, options: CompileOptions) -> Result<Program, CompileError> {
    let mut ast_arena: TypedArena<Ast> = TypedArena::new();
    let ParseResult { root, num_captures, capture_names } = parser::parse(pattern, &mut ast_arena)?;
    let mut c = Compiler::new(pattern, &ast_arena, options);
    let frag = c.compile_node(root)?;
    let match_pc = c.push(Inst::Match)?;
    c.patch(frag.out, match_pc);

    let anchored_start = !options.multiline && starts_with_begin_text(&ast_arena, root);

    Ok(Program {
        insts: crate::program::finalize(c.insts),
        classes: crate::program::finalize(c.classes),
        lookaheads: c.lookaheads,
        start: frag.start,
        num_captures,
        capture_names,
        anchored_start,
        multiline: options.multiline,
    })
}

/// One output slot of an instruction still awaiting its jump target.
#[derive(Clone, Copy, Debug)]
enum Out {
    Jmp(Pc),
    AltPrimary(Pc),
    AltSecondary(Pc),
}

/// A partially built piece of program: entry point plus dangling exits.
struct Frag {
    start: Pc,
    out: Vec<Out>,
}

struct Compiler<'a> {
    pattern: &'a str,
    ast: &'a TypedArena<Ast>,
    options: CompileOptions,
    insts: TypedArena<Inst>,
    classes: TypedArena<ClassEntry>,
    lookaheads: Vec<Program>,
}

impl<'a> Compiler<'a> {
    fn new(pattern: &'a str, ast: &'a TypedArena<Ast>, options: CompileOptions) -> Self {
        Compiler {
            pattern,
            ast,
            options,
            insts: TypedArena::new(),
            classes: TypedArena::new(),
            lookaheads: Vec::new(),
        }
    }

    fn push(&mut self, inst: Inst) -> Result<Pc, CompileError> {
        Ok(self.insts.alloc(inst, self.pattern)?.index() as Pc)
    }

    fn patch(&mut self, outs: Vec<Out>, target: Pc) {
        for out in outs {
            match out {
                // Every variant but `Alt`/`Match` carries a single explicit
                // successor field; patching means overwriting that field
                // regardless of which variant sits at `pc`; `Alt` has two
                // successors and is only ever patched via `AltPrimary`/
                // `AltSecondary`, and `Match` is terminal.
                Out::Jmp(pc) => match self.insts.get_mut(inst_id(pc)) {
                    Inst::Char(_, next)
                    | Inst::Class(_, next)
                    | Inst::AnyChar(next)
                    | Inst::AnyCharNoNL(next)
                    | Inst::Assert(_, next)
                    | Inst::Save(_, next)
                    | Inst::Jmp(next)
                    | Inst::Look(_, _, next) => *next = target,
                    Inst::Alt(_, _) | Inst::Match => {}
                },
                Out::AltPrimary(pc) => {
                    if let Inst::Alt(t, _) = self.insts.get_mut(inst_id(pc)) {
                        *t = target;
                    }
                }
                Out::AltSecondary(pc) => {
                    if let Inst::Alt(_, t) = self.insts.get_mut(inst_id(pc)) {
                        *t = target;
                    }
                }
            }
        }
    }

    fn node(&self, id: AstId) -> &Ast {
        self.ast.get(id)
    }

    fn compile_node(&mut self, id: AstId) -> Result<Frag, CompileError> {
        match self.node(id).clone() {
            Ast::Empty => {
                // A dangling fragment needs *some* instruction to anchor
                // its start pc; an unconditional jump-to-self-patched-later
                // is the cheapest no-op available.
                let pc = self.push(Inst::Jmp(0))?;
                Ok(Frag { start: pc, out: vec![Out::Jmp(pc)] })
            }
            Ast::Literal { bytes, case_insensitive } => {
                let ci = case_insensitive || self.options.case_insensitive;
                let text = String::from_utf8(bytes)
                    .map_err(|_| CompileError::new(CompileErrorKind::InvalidUtf8, self.pattern, 0))?;
                self.compile_literal(&text, ci)
            }
            Ast::CharClass { ranges, negated, case_insensitive } => {
                let ci = case_insensitive || self.options.case_insensitive;
                let ranges = if ci { fold_ranges(&ranges) } else { ranges };
                let idx = self.classes.alloc(ClassEntry { ranges, negated }, self.pattern)?.index() as u32;
                let pc = self.push(Inst::Class(idx, 0))?;
                Ok(Frag { start: pc, out: vec![Out::Jmp(pc)] })
            }
            Ast::AnyCharNoNL => {
                let inst = if self.options.dot_all { Inst::AnyChar(0) } else { Inst::AnyCharNoNL(0) };
                let pc = self.push(inst)?;
                Ok(Frag { start: pc, out: vec![Out::Jmp(pc)] })
            }
            Ast::AnyChar => {
                let pc = self.push(Inst::AnyChar(0))?;
                Ok(Frag { start: pc, out: vec![Out::Jmp(pc)] })
            }
            Ast::Anchor(kind) => {
                let assert = match kind {
                    AnchorKind::BeginLine => AssertKind::BeginLine,
                    AnchorKind::EndLine => AssertKind::EndLine,
                    AnchorKind::BeginText => AssertKind::BeginText,
                    AnchorKind::EndText => AssertKind::EndText,
                    AnchorKind::WordBoundary => AssertKind::WordBoundary,
                    AnchorKind::NoWordBoundary => AssertKind::NoWordBoundary,
                };
                let pc = self.push(Inst::Assert(assert, 0))?;
                Ok(Frag { start: pc, out: vec![Out::Jmp(pc)] })
            }
            Ast::Capture { index, child, .. } => {
                let inner = self.compile_node(child)?;
                match index {
                    None => Ok(inner),
                    Some(i) => {
                        let open = self.push(Inst::Save(2 * i, 0))?;
                        self.patch(vec![Out::Jmp(open)], inner.start);
                        let close = self.push(Inst::Save(2 * i + 1, 0))?;
                        self.patch(inner.out, close);
                        Ok(Frag { start: open, out: vec![Out::Jmp(close)] })
                    }
                }
            }
            Ast::Lookahead { negated, child } => {
                let mut sub_options = self.options;
                sub_options.multiline = self.options.multiline;
                let mut sub = Compiler::new(self.pattern, self.ast, sub_options);
                let frag = sub.compile_node(child)?;
                let match_pc = sub.push(Inst::Match)?;
                sub.patch(frag.out, match_pc);
                let sub_program = Program {
                    insts: crate::program::finalize(sub.insts),
                    classes: crate::program::finalize(sub.classes),
                    lookaheads: sub.lookaheads,
                    start: frag.start,
                    num_captures: 0,
                    capture_names: Vec::new(),
                    anchored_start: true,
                    multiline: self.options.multiline,
                };
                let look_idx = self.lookaheads.len() as u32;
                self.lookaheads.push(sub_program);
                let pc = self.push(Inst::Look(look_idx, negated, 0))?;
                Ok(Frag { start: pc, out: vec![Out::Jmp(pc)] })
            }
            Ast::Repeat { min, max, greedy, child } => self.compile_repeat(min, max, greedy, child),
            Ast::Concat(children) => self.compile_concat(&children),
            Ast::Alternate(children) => self.compile_alternate(&children),
        }
    }

    fn compile_literal(&mut self, text: &str, case_insensitive: bool) -> Result<Frag, CompileError> {
        let mut chars = text.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return self.compile_node_empty(),
        };
        let mut frag = self.compile_char(first, case_insensitive)?;
        for c in chars {
            let next = self.compile_char(c, case_insensitive)?;
            self.patch(frag.out, next.start);
            frag = Frag { start: frag.start, out: next.out };
        }
        Ok(frag)
    }

    fn compile_node_empty(&mut self) -> Result<Frag, CompileError> {
        let pc = self.push(Inst::Jmp(0))?;
        Ok(Frag { start: pc, out: vec![Out::Jmp(pc)] })
    }

    fn compile_char(&mut self, c: char, case_insensitive: bool) -> Result<Frag, CompileError> {
        if case_insensitive {
            let folded = case_fold_variants(c);
            if folded.len() > 1 {
                let ranges = ranges::normalize(folded.into_iter().map(|c| ClassRange::new(c, c)).collect());
                let idx = self.classes.alloc(ClassEntry { ranges, negated: false }, self.pattern)?.index() as u32;
                let pc = self.push(Inst::Class(idx, 0))?;
                return Ok(Frag { start: pc, out: vec![Out::Jmp(pc)] });
            }
        }
        let pc = self.push(Inst::Char(c, 0))?;
        Ok(Frag { start: pc, out: vec![Out::Jmp(pc)] })
    }

    fn compile_concat(&mut self, children: &[AstId]) -> Result<Frag, CompileError> {
        let mut iter = children.iter();
        let first_id = match iter.next() {
            Some(&id) => id,
            None => return self.compile_node_empty(),
        };
        let mut frag = self.compile_node(first_id)?;
        for &id in iter {
            let next = self.compile_node(id)?;
            self.patch(frag.out, next.start);
            frag = Frag { start: frag.start, out: next.out };
        }
        Ok(frag)
    }

    fn compile_alternate(&mut self, children: &[AstId]) -> Result<Frag, CompileError> {
        debug_assert!(children.len() >= 2);
        // Right-fold so the leftmost branch keeps top priority at every
        // level: branch 0 is tried before an Alt whose secondary target is
        // "the rest of the alternation".
        let mut frag = self.compile_node(*children.last().unwrap())?;
        for &id in children[..children.len() - 1].iter().rev() {
            let branch = self.compile_node(id)?;
            let alt_pc = self.push(Inst::Alt(0, 0))?;
            self.patch(vec![Out::AltPrimary(alt_pc)], branch.start);
            self.patch(vec![Out::AltSecondary(alt_pc)], frag.start);
            let mut out = branch.out;
            out.extend(frag.out);
            frag = Frag { start: alt_pc, out };
        }
        Ok(frag)
    }

    fn compile_repeat(
        &mut self,
        min: u32,
        max: Option<u32>,
        greedy: bool,
        child: AstId,
    ) -> Result<Frag, CompileError> {
        match (min, max) {
            (0, None) => self.compile_star(child, greedy),
            (1, None) => self.compile_plus(child, greedy),
            (0, Some(1)) => self.compile_question(child, greedy),
            (min, max) => self.compile_bounded(min, max, greedy, child),
        }
    }

    fn compile_star(&mut self, child: AstId, greedy: bool) -> Result<Frag, CompileError> {
        let alt_pc = self.push(Inst::Alt(0, 0))?;
        let body = self.compile_node(child)?;
        self.patch(body.out, alt_pc);
        if greedy {
            self.patch(vec![Out::AltPrimary(alt_pc)], body.start);
            Ok(Frag { start: alt_pc, out: vec![Out::AltSecondary(alt_pc)] })
        } else {
            self.patch(vec![Out::AltSecondary(alt_pc)], body.start);
            Ok(Frag { start: alt_pc, out: vec![Out::AltPrimary(alt_pc)] })
        }
    }

    fn compile_plus(&mut self, child: AstId, greedy: bool) -> Result<Frag, CompileError> {
        let body = self.compile_node(child)?;
        let alt_pc = self.push(Inst::Alt(0, 0))?;
        self.patch(body.out, alt_pc);
        if greedy {
            self.patch(vec![Out::AltPrimary(alt_pc)], body.start);
            Ok(Frag { start: body.start, out: vec![Out::AltSecondary(alt_pc)] })
        } else {
            self.patch(vec![Out::AltSecondary(alt_pc)], body.start);
            Ok(Frag { start: body.start, out: vec![Out::AltPrimary(alt_pc)] })
        }
    }

    fn compile_question(&mut self, child: AstId, greedy: bool) -> Result<Frag, CompileError> {
        let alt_pc = self.push(Inst::Alt(0, 0))?;
        let body = self.compile_node(child)?;
        if greedy {
            self.patch(vec![Out::AltPrimary(alt_pc)], body.start);
            let mut out = body.out;
            out.push(Out::AltSecondary(alt_pc));
            Ok(Frag { start: alt_pc, out })
        } else {
            self.patch(vec![Out::AltSecondary(alt_pc)], body.start);
            let mut out = body.out;
            out.push(Out::AltPrimary(alt_pc));
            Ok(Frag { start: alt_pc, out })
        }
    }

    /// `{m,n}` (and `{m,}`) by explicit unrolling: `m` mandatory copies
    /// followed by either `n - m` optional copies (bounded) or one trailing
    /// `*`-style loop (unbounded). Each copy is compiled from the shared
    /// `child` node fresh, since AST nodes carry no shared mutable state.
    fn compile_bounded(
        &mut self,
        min: u32,
        max: Option<u32>,
        greedy: bool,
        child: AstId,
    ) -> Result<Frag, CompileError> {
        let mut frag: Option<Frag> = None;
        for _ in 0..min {
            let copy = self.compile_node(child)?;
            frag = Some(match frag {
                None => copy,
                Some(prev) => {
                    self.patch(prev.out, copy.start);
                    Frag { start: prev.start, out: copy.out }
                }
            });
        }
        match max {
            None => {
                // m copies followed by a star of the same body.
                let star = self.compile_star(child, greedy)?;
                Ok(match frag {
                    None => star,
                    Some(prev) => {
                        self.patch(prev.out, star.start);
                        Frag { start: prev.start, out: star.out }
                    }
                })
            }
            Some(max) => {
                let extra = max - min;
                for _ in 0..extra {
                    let q = self.compile_question(child, greedy)?;
                    frag = Some(match frag {
                        None => q,
                        Some(prev) => {
                            self.patch(prev.out, q.start);
                            Frag { start: prev.start, out: q.out }
                        }
                    });
                }
                match frag {
                    Some(f) => Ok(f),
                    None => self.compile_node_empty(),
                }
            }
        }
    }
}

fn inst_id(pc: Pc) -> crate::arena::Id<Inst> {
    // `Id::new` is `pub(crate)`, so this conversion back from a raw `Pc` is
    // only reachable from within this crate, preserving the module
    // boundary `arena.rs` otherwise enforces with its opaque `Id<T>`.
    crate::arena::Id::new(pc)
}

/// Conservative check: does this AST force every match to start at byte
/// offset 0? Only looks through the spine of `Concat`/`Capture` nodes for a
/// leading `\A`/`^`; does not attempt to prove it for every branch of an
/// `Alternate` (a pattern like `^a|^b` is not detected, and is simply
/// searched unanchored, which is still correct, just not as fast).
fn starts_with_begin_text(ast: &TypedArena<Ast>, id: AstId) -> bool {
    match ast.get(id) {
        // `BeginLine` (`^`) only counts here because the caller already
        // requires `!multiline`, under which `^` and `\A` coincide.
        Ast::Anchor(AnchorKind::BeginText) | Ast::Anchor(AnchorKind::BeginLine) => true,
        Ast::Capture { child, .. } => starts_with_begin_text(ast, *child),
        Ast::Concat(children) => children.first().is_some_and(|&c| starts_with_begin_text(ast, c)),
        _ => false,
    }
}

/// All case variants of `c` worth trying under case-insensitive matching.
/// ASCII letters fold exactly to their one alternate case; everything else
/// only folds when `unicode` is enabled and the codepoint has a simple
/// (single-character) case mapping, keeping the cost of a literal
/// character's compiled form bounded regardless of `c`.
fn case_fold_variants(c: char) -> Vec<char> {
    if c.is_ascii_alphabetic() {
        let other = if c.is_ascii_uppercase() { c.to_ascii_lowercase() } else { c.to_ascii_uppercase() };
        return if other == c { vec![c] } else { vec![c, other] };
    }
    #[cfg(feature = "unicode")]
    {
        let mut variants = vec![c];
        let lower: Vec<char> = c.to_lowercase().collect();
        let upper: Vec<char> = c.to_uppercase().collect();
        if lower.len() == 1 && lower[0] != c {
            variants.push(lower[0]);
        }
        if upper.len() == 1 && upper[0] != c {
            variants.push(upper[0]);
        }
        return variants;
    }
    #[cfg(not(feature = "unicode"))]
    {
        vec![c]
    }
}

/// Expand every range in `ranges` to include each member's case-fold
/// variants, then renormalize. Large ranges (broad Unicode property
/// classes) are left unfolded rather than iterated codepoint-by-codepoint,
/// to keep compilation cost bounded regardless of class width.
fn fold_ranges(ranges_in: &[ClassRange]) -> Vec<ClassRange> {
    const FOLD_SCAN_LIMIT: u32 = 4096;
    let mut out = ranges_in.to_vec();
    for r in ranges_in {
        let span = r.hi as u32 - r.lo as u32 + 1;
        if span > FOLD_SCAN_LIMIT {
            continue;
        }
        let mut cp = r.lo as u32;
        while cp <= r.hi as u32 {
            if let Some(c) = char::from_u32(cp) {
                for v in case_fold_variants(c) {
                    out.push(ClassRange::new(v, v));
                }
            }
            cp += 1;
        }
    }
    ranges::normalize(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prog(pattern: &str) -> Program {
        compile(pattern, CompileOptions::default()).unwrap()
    }

    #[test]
    fn literal_compiles_to_chars_and_match() {
        let p = prog("ab");
        let chars: Vec<char> = p
            .insts
            .iter()
            .filter_map(|i| if let Inst::Char(c, _) = i { Some(*c) } else { None })
            .collect();
        assert_eq!(chars, alloc::vec!['a', 'b']);
        assert!(p.insts.iter().any(|i| matches!(i, Inst::Match)));
    }

    #[test]
    fn capture_emits_save_pair() {
        let p = prog("(a)");
        let saves: Vec<u32> = p
            .insts
            .iter()
            .filter_map(|i| if let Inst::Save(s, _) = i { Some(*s) } else { None })
            .collect();
        assert_eq!(saves, alloc::vec![2, 3]);
        assert_eq!(p.num_captures, 1);
    }

    #[test]
    fn star_produces_alt_loop() {
        let p = prog("a*");
        assert!(p.insts.iter().any(|i| matches!(i, Inst::Alt(_, _))));
    }

    #[test]
    fn anchored_start_detected_for_leading_begin_text() {
        let p = prog("\\Afoo");
        assert!(p.anchored_start);
        let p2 = prog("foo");
        assert!(!p2.anchored_start);
    }

    #[test]
    fn anchored_start_detected_for_leading_caret_outside_multiline() {
        let p = prog("^foo");
        assert!(p.anchored_start);
        let p2 = compile("^foo", CompileOptions { multiline: true, ..Default::default() }).unwrap();
        assert!(!p2.anchored_start);
    }

    #[test]
    fn case_insensitive_literal_uses_class_for_letters() {
        let p = compile("a", CompileOptions { case_insensitive: true, ..Default::default() }).unwrap();
        assert!(p.insts.iter().any(|i| matches!(i, Inst::Class(_, _))));
        assert_eq!(p.classes.len(), 1);
        assert_eq!(p.classes[0].ranges.len(), 2);
    }

    #[test]
    fn lookahead_compiles_into_separate_subprogram() {
        let p = prog("a(?=b)");
        assert_eq!(p.lookaheads.len(), 1);
        assert!(p.insts.iter().any(|i| matches!(i, Inst::Look(_, false, _))));
    }

    #[test]
    fn bounded_repeat_expands_copies() {
        let p = prog("a{2,4}");
        let chars = p.insts.iter().filter(|i| matches!(i, Inst::Char('a', _))).count();
        assert_eq!(chars, 4);
    }
}
