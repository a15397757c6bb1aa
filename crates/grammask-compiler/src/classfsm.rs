//! Compact FSM table for character-class expressions.
//!
//! The matcher consumes character classes (and starred classes) as compact
//! DFAs. Classes with identical payloads share one machine; per-expression
//! lookups resolve to indices into the distinct-machine table.

use grammask_fsm::{CompactFsmWithStartEnd, FsmWithStartEnd};
use rustc_hash::FxHashMap;

use crate::grammar::{ExprType, Grammar};
use crate::Result;

/// Compact machines for every `CharacterClass` / `CharacterClassStar`
/// expression of a grammar.
#[derive(Debug, Clone, Default)]
pub struct ClassFsmTable {
    /// Distinct machines, one per structurally distinct class.
    machines: Vec<CompactFsmWithStartEnd>,
    /// Expression id to machine index.
    by_expr: FxHashMap<i32, usize>,
}

impl ClassFsmTable {
    /// Compile the class FSMs of `grammar`. Structurally equal classes are
    /// compiled once and shared.
    pub fn build(grammar: &Grammar) -> Result<ClassFsmTable> {
        let mut by_payload: FxHashMap<Vec<i32>, usize> = FxHashMap::default();
        let mut table = ClassFsmTable::default();

        for expr_id in 0..grammar.expr_count() as i32 {
            let expr = grammar.expr(expr_id);
            let starred = match expr.ty {
                ExprType::CharacterClass => false,
                ExprType::CharacterClassStar => true,
                _ => continue,
            };
            let mut key = vec![expr.ty as i32];
            key.extend_from_slice(expr.data);
            let index = match by_payload.get(&key).copied() {
                Some(index) => index,
                None => {
                    let (negated, ranges) = expr.class_parts();
                    let nfa = FsmWithStartEnd::from_char_class(&ranges, negated)?;
                    let nfa = if starred { nfa.star() } else { nfa };
                    let machine = nfa.to_dfa().minimize_dfa().freeze();
                    let index = table.machines.len();
                    table.machines.push(machine);
                    by_payload.insert(key, index);
                    index
                }
            };
            table.by_expr.insert(expr_id, index);
        }
        Ok(table)
    }

    /// The machine for a class expression id, if that id is a class.
    pub fn get(&self, expr_id: i32) -> Option<&CompactFsmWithStartEnd> {
        self.by_expr
            .get(&expr_id)
            .map(|&index| &self.machines[index])
    }

    /// Number of expressions covered.
    pub fn len(&self) -> usize {
        self.by_expr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_expr.is_empty()
    }

    /// Number of structurally distinct machines.
    pub fn distinct_machines(&self) -> usize {
        self.machines.len()
    }

    /// Total heap footprint of the distinct machines, in bytes.
    pub fn memory_size(&self) -> usize {
        self.machines
            .iter()
            .map(|machine| machine.memory_size())
            .sum()
    }
}
