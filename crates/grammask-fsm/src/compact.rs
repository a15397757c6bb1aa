//! Frozen CSR form of an FSM.
//!
//! Rows are sorted by `(min, max, target)`, so epsilon and rule-reference
//! edges (negative `min`) sort before character ranges. Short rows are
//! scanned linearly; long rows use binary search on `min`.

use std::fmt;

use grammask_core::csr::CsrArray;
use rustc_hash::FxHashSet;

use crate::edge::FsmEdge;
use crate::fsm::{Fsm, FsmWithStartEnd};

/// Returned by [`CompactFsmWithStartEnd::transition`] when no edge covers
/// the input byte.
pub const NO_TRANSITION: i32 = -1;

/// Rows at or below this length are scanned linearly.
const LINEAR_SCAN_LIMIT: usize = 16;

/// Immutable FSM edge table. Cheap to clone: the buffers are shared.
#[derive(Debug, Clone)]
pub struct CompactFsm {
    edges: CsrArray<FsmEdge>,
}

impl CompactFsm {
    pub(crate) fn from_edges(edges: CsrArray<FsmEdge>) -> Self {
        Self { edges }
    }

    pub fn num_states(&self) -> i32 {
        self.edges.len() as i32
    }

    pub fn edges_from(&self, state: i32) -> &[FsmEdge] {
        self.edges.row(state as usize)
    }

    /// See [`Fsm::epsilon_closure`].
    pub fn epsilon_closure(&self, states: &mut Vec<i32>) {
        let mut seen: FxHashSet<i32> = states.iter().copied().collect();
        let mut index = 0;
        while index < states.len() {
            let state = states[index];
            index += 1;
            for edge in self.edges_from(state) {
                if edge.is_epsilon() && seen.insert(edge.target) {
                    states.push(edge.target);
                }
            }
        }
    }

    /// See [`Fsm::advance`].
    pub fn advance(&self, from: &[i32], value: i32, is_closure: bool, is_rule: bool) -> Vec<i32> {
        let mut current = from.to_vec();
        if !is_closure {
            self.epsilon_closure(&mut current);
        }
        let mut result = Vec::new();
        let mut seen = FxHashSet::default();
        for &state in &current {
            for edge in self.edges_from(state) {
                let matches = if is_rule {
                    edge.rule_id() == Some(value)
                } else {
                    edge.covers(value as i16)
                };
                if matches && seen.insert(edge.target) {
                    result.push(edge.target);
                }
            }
        }
        result
    }

    /// Rule ids on outgoing rule-reference edges of `state`.
    pub fn possible_rules(&self, state: i32) -> FxHashSet<i32> {
        self.edges_from(state)
            .iter()
            .filter_map(|edge| edge.rule_id())
            .collect()
    }

    /// Thaw back into a mutable FSM.
    pub fn thaw(&self) -> Fsm {
        let mut fsm = Fsm::with_states(self.num_states() as usize);
        for state in 0..self.num_states() {
            for edge in self.edges_from(state) {
                fsm.graph_mut().add_edge(state, edge.target, edge.label());
            }
        }
        fsm
    }

    /// Heap footprint of the edge table in bytes.
    pub fn memory_size(&self) -> usize {
        self.edges.memory_size()
    }
}

/// A compact FSM with its start state, accepting set, and DFA flag.
#[derive(Debug, Clone)]
pub struct CompactFsmWithStartEnd {
    fsm: CompactFsm,
    start: i32,
    accepts: FxHashSet<i32>,
    is_dfa: bool,
}

impl CompactFsmWithStartEnd {
    pub(crate) fn new(fsm: CompactFsm, start: i32, accepts: FxHashSet<i32>, is_dfa: bool) -> Self {
        Self {
            fsm,
            start,
            accepts,
            is_dfa,
        }
    }

    pub fn fsm(&self) -> &CompactFsm {
        &self.fsm
    }

    pub fn num_states(&self) -> i32 {
        self.fsm.num_states()
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn is_dfa(&self) -> bool {
        self.is_dfa
    }

    pub fn is_accept(&self, state: i32) -> bool {
        self.accepts.contains(&state)
    }

    pub fn accepts(&self) -> &FxHashSet<i32> {
        &self.accepts
    }

    pub fn possible_rules(&self, state: i32) -> FxHashSet<i32> {
        self.fsm.possible_rules(state)
    }

    /// Deterministic single-byte step: the target state, or
    /// [`NO_TRANSITION`]. Meaningful on DFA rows, where at most one range
    /// covers any byte.
    pub fn transition(&self, from: i32, ch: i16) -> i32 {
        let row = self.fsm.edges_from(from);
        if row.len() <= LINEAR_SCAN_LIMIT {
            for edge in row {
                if edge.min > ch {
                    return NO_TRANSITION;
                }
                if edge.is_char_range() && edge.max >= ch {
                    return edge.target;
                }
            }
            return NO_TRANSITION;
        }
        // First edge with min > ch; its predecessor is the only candidate.
        let idx = row.partition_point(|edge| edge.min <= ch);
        if idx > 0 {
            let edge = &row[idx - 1];
            if edge.is_char_range() && edge.max >= ch {
                return edge.target;
            }
        }
        NO_TRANSITION
    }

    /// NFA simulation over a byte string (closure + advance per byte).
    pub fn accepts_bytes(&self, input: &[u8]) -> bool {
        let mut current = vec![self.start];
        self.fsm.epsilon_closure(&mut current);
        for &byte in input {
            current = self.fsm.advance(&current, byte as i32, true, false);
            if current.is_empty() {
                return false;
            }
            self.fsm.epsilon_closure(&mut current);
        }
        current.iter().any(|state| self.accepts.contains(state))
    }

    /// Thaw into the mutable wrapper.
    pub fn thaw(&self) -> FsmWithStartEnd {
        let mut out = FsmWithStartEnd::new(self.fsm.thaw(), self.start);
        for &accept in &self.accepts {
            out.add_accept(accept);
        }
        out.set_dfa(self.is_dfa);
        out
    }

    /// Total heap footprint in bytes, for bookkeeping.
    pub fn memory_size(&self) -> usize {
        self.fsm.memory_size() + self.accepts.len() * std::mem::size_of::<i32>()
    }
}

impl fmt::Display for CompactFsmWithStartEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut accepts: Vec<i32> = self.accepts.iter().copied().collect();
        accepts.sort_unstable();
        writeln!(
            f,
            "compact_fsm(num_states={}, start={}, accepts={:?}, dfa={})",
            self.num_states(),
            self.start,
            accepts,
            self.is_dfa
        )?;
        for state in 0..self.num_states() {
            write!(f, "  {state}:")?;
            for edge in self.fsm.edges_from(state) {
                if edge.is_epsilon() {
                    write!(f, " --eps--> {}", edge.target)?;
                } else if let Some(rule) = edge.rule_id() {
                    write!(f, " --rule({rule})--> {}", edge.target)?;
                } else {
                    write!(f, " --[{}-{}]--> {}", edge.min, edge.max, edge.target)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
