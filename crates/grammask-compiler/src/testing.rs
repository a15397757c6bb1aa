//! Test support: a reference recognizer over canonical grammars.
//!
//! A straightforward nondeterministic walk of the canonical AST, used by
//! tests to check that parsed grammars accept what they should. Not a
//! production matcher: no token masks, no look-ahead evaluation, just
//! byte-level membership.

use rustc_hash::FxHashSet;

use crate::grammar::{ExprType, Grammar};

const MAX_MATCH_DEPTH: u32 = 256;

/// Whether `input` is in the language of the grammar's root rule.
pub fn accepts(grammar: &Grammar, input: &str) -> bool {
    let bytes = input.as_bytes();
    rule_matches(grammar, grammar.root_rule_id(), bytes, 0, 0)
        .iter()
        .any(|&end| end == bytes.len())
}

/// All input positions reachable by matching `rule_id` starting at `pos`.
fn rule_matches(
    grammar: &Grammar,
    rule_id: i32,
    input: &[u8],
    pos: usize,
    depth: u32,
) -> FxHashSet<usize> {
    let mut out = FxHashSet::default();
    if depth > MAX_MATCH_DEPTH {
        return out;
    }
    let body = grammar.expr(grammar.rule(rule_id).body_expr_id);
    debug_assert_eq!(body.ty, ExprType::Choices);
    for &choice_id in body.data {
        let choice = grammar.expr(choice_id);
        match choice.ty {
            ExprType::EmptyStr => {
                out.insert(pos);
            }
            ExprType::Sequence => {
                let mut positions: FxHashSet<usize> = FxHashSet::default();
                positions.insert(pos);
                for &element_id in choice.data {
                    let mut next = FxHashSet::default();
                    for &p in &positions {
                        next.extend(element_matches(grammar, element_id, input, p, depth + 1));
                    }
                    positions = next;
                    if positions.is_empty() {
                        break;
                    }
                }
                out.extend(positions);
            }
            _ => unreachable!("canonical choice must be EmptyStr or Sequence"),
        }
    }
    out
}

fn element_matches(
    grammar: &Grammar,
    element_id: i32,
    input: &[u8],
    pos: usize,
    depth: u32,
) -> FxHashSet<usize> {
    let mut out = FxHashSet::default();
    if depth > MAX_MATCH_DEPTH {
        return out;
    }
    let element = grammar.expr(element_id);
    match element.ty {
        ExprType::ByteString => {
            let bytes: Vec<u8> = element.data.iter().map(|&w| w as u8).collect();
            if input[pos..].starts_with(&bytes) {
                out.insert(pos + bytes.len());
            }
        }
        ExprType::CharacterClass => {
            if let Some(end) = class_match_at(&element.class_parts(), input, pos) {
                out.insert(end);
            }
        }
        ExprType::CharacterClassStar => {
            let parts = element.class_parts();
            let mut cur = pos;
            out.insert(cur);
            while let Some(end) = class_match_at(&parts, input, cur) {
                cur = end;
                out.insert(cur);
            }
        }
        ExprType::RuleRef => {
            out = rule_matches(grammar, element.data[0], input, pos, depth + 1);
        }
        _ => unreachable!("canonical sequence element must be atomic"),
    }
    out
}

/// Match one codepoint of `input` at `pos` against a class; returns the
/// end position.
fn class_match_at(
    (negated, ranges): &(bool, Vec<(i32, i32)>),
    input: &[u8],
    pos: usize,
) -> Option<usize> {
    let (cp, len) = grammask_core::encoding::decode_utf8(&input[pos..]).ok()?;
    let inside = ranges.iter().any(|&(lo, hi)| lo <= cp && cp <= hi);
    (inside != *negated).then_some(pos + len)
}
