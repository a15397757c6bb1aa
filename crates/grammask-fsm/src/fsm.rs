//! Mutable FSM and its start/accept wrapper.

use std::fmt;

use grammask_core::graph::Graph;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::compact::{CompactFsm, CompactFsmWithStartEnd};
use crate::edge::{FsmEdge, FsmLabel};

/// A mutable finite-state machine: a labeled multigraph over integer state
/// ids. Built incrementally, then frozen into a [`CompactFsm`].
#[derive(Debug, Clone, Default)]
pub struct Fsm {
    graph: Graph<FsmLabel>,
}

impl Fsm {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
        }
    }

    pub fn with_states(count: usize) -> Self {
        Self {
            graph: Graph::with_nodes(count),
        }
    }

    pub fn num_states(&self) -> i32 {
        self.graph.num_nodes() as i32
    }

    pub fn add_state(&mut self) -> i32 {
        self.graph.add_node()
    }

    /// Add a character-range transition.
    pub fn add_edge(&mut self, from: i32, to: i32, min: i16, max: i16) {
        self.graph.add_edge(from, to, FsmLabel::range(min, max));
    }

    pub fn add_epsilon(&mut self, from: i32, to: i32) {
        self.graph.add_edge(from, to, FsmLabel::epsilon());
    }

    pub fn add_rule_ref(&mut self, from: i32, to: i32, rule_id: i16) {
        self.graph.add_edge(from, to, FsmLabel::rule_ref(rule_id));
    }

    /// Outgoing edges of `state` in insertion order.
    pub fn edges_from(&self, state: i32) -> Vec<FsmEdge> {
        let mut edges: Vec<FsmEdge> = self
            .graph
            .out_edges(state)
            .map(|(_, e)| FsmEdge::new(e.label, e.dst))
            .collect();
        // The adjacency chain is most-recent-first.
        edges.reverse();
        edges
    }

    pub(crate) fn graph(&self) -> &Graph<FsmLabel> {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut Graph<FsmLabel> {
        &mut self.graph
    }

    /// Copy every state and edge of `other` into `self`, recording the
    /// state renumbering in `mapping`.
    pub fn absorb(&mut self, other: &Fsm, mapping: &mut FxHashMap<i32, i32>) {
        mapping.clear();
        for state in 0..other.num_states() {
            mapping.insert(state, self.add_state());
        }
        for state in 0..other.num_states() {
            for edge in other.edges_from(state) {
                self.graph
                    .add_edge(mapping[&state], mapping[&edge.target], edge.label());
            }
        }
    }

    /// Single-step deterministic lookup: the first outgoing range covering
    /// `ch` wins.
    pub fn get_next_state(&self, from: i32, ch: i16) -> Option<i32> {
        self.edges_from(from)
            .into_iter()
            .find(|edge| edge.covers(ch))
            .map(|edge| edge.target)
    }

    /// Extend `states` in place with everything reachable over epsilon
    /// edges. Existing entries are kept; discovery order is appended, so
    /// output is deterministic for a given input order.
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

    /// Successor states after consuming one symbol from `from`.
    ///
    /// `value` is a byte/codepoint unless `is_rule` is set, in which case it
    /// is a rule id matched against rule-reference edges. When `is_closure`
    /// is false the input is epsilon-closed first; the result is never
    /// closed, that is the caller's step.
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

    /// Rule ids appearing on outgoing rule-reference edges of `state`.
    pub fn possible_rules(&self, state: i32) -> FxHashSet<i32> {
        self.edges_from(state)
            .into_iter()
            .filter_map(|edge| edge.rule_id())
            .collect()
    }

    /// Build a fresh FSM under a state relabeling. States absent from the
    /// mapping are dropped along with their edges.
    pub fn rebuild_with_mapping(
        &self,
        mapping: &FxHashMap<i32, i32>,
        new_num_states: i32,
    ) -> Fsm {
        let mut out = Fsm::with_states(new_num_states as usize);
        for state in 0..self.num_states() {
            let Some(&new_src) = mapping.get(&state) else {
                continue;
            };
            for edge in self.edges_from(state) {
                if let Some(&new_dst) = mapping.get(&edge.target) {
                    out.graph.add_edge(new_src, new_dst, edge.label());
                }
            }
        }
        out
    }

    /// Freeze into the compact CSR form, consuming the machine. Rows are
    /// sorted by `(min, max, target)` and duplicate edges collapse.
    pub fn freeze(self) -> CompactFsm {
        let mut builder = grammask_core::csr::CsrBuilder::new();
        for state in 0..self.num_states() {
            let mut row = self.edges_from(state);
            row.sort_unstable();
            row.dedup();
            builder.push_row(row);
        }
        CompactFsm::from_edges(builder.freeze())
    }

    /// Debug check for the underlying graph representation.
    pub fn well_formed(&self) -> bool {
        self.graph.well_formed()
    }
}

/// An FSM coupled with a start state and a set of accepting states.
#[derive(Debug, Clone, Default)]
pub struct FsmWithStartEnd {
    fsm: Fsm,
    start: i32,
    accepts: FxHashSet<i32>,
    is_dfa: bool,
}

impl FsmWithStartEnd {
    pub fn new(fsm: Fsm, start: i32) -> Self {
        Self {
            fsm,
            start,
            accepts: FxHashSet::default(),
            is_dfa: false,
        }
    }

    pub fn fsm(&self) -> &Fsm {
        &self.fsm
    }

    pub fn fsm_mut(&mut self) -> &mut Fsm {
        &mut self.fsm
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn set_start(&mut self, state: i32) {
        debug_assert!(state < self.fsm.num_states());
        self.start = state;
    }

    pub fn accepts(&self) -> &FxHashSet<i32> {
        &self.accepts
    }

    pub fn add_accept(&mut self, state: i32) {
        debug_assert!(state < self.fsm.num_states());
        self.accepts.insert(state);
    }

    pub fn remove_accept(&mut self, state: i32) {
        self.accepts.remove(&state);
    }

    pub fn is_accept(&self, state: i32) -> bool {
        self.accepts.contains(&state)
    }

    pub fn num_states(&self) -> i32 {
        self.fsm.num_states()
    }

    pub fn is_dfa(&self) -> bool {
        self.is_dfa
    }

    pub(crate) fn set_dfa(&mut self, is_dfa: bool) {
        self.is_dfa = is_dfa;
    }

    /// Recompute the DFA flag from the invariant: no epsilon edges, and per
    /// state the outgoing byte ranges are pairwise disjoint.
    pub fn check_dfa(&mut self) -> bool {
        let mut is_dfa = true;
        'states: for state in 0..self.fsm.num_states() {
            let mut ranges: Vec<(i16, i16)> = Vec::new();
            for edge in self.fsm.edges_from(state) {
                if edge.is_epsilon() {
                    is_dfa = false;
                    break 'states;
                }
                if edge.is_char_range() {
                    ranges.push((edge.min, edge.max));
                }
            }
            ranges.sort_unstable();
            if ranges.windows(2).any(|w| w[0].1 >= w[1].0) {
                is_dfa = false;
                break;
            }
        }
        self.is_dfa = is_dfa;
        is_dfa
    }

    /// All states reachable from the start.
    pub fn reachable_states(&self) -> FxHashSet<i32> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![self.start];
        seen.insert(self.start);
        while let Some(state) = stack.pop() {
            for edge in self.fsm.edges_from(state) {
                if seen.insert(edge.target) {
                    stack.push(edge.target);
                }
            }
        }
        seen
    }

    /// NFA simulation over a byte string; rule-reference edges are treated
    /// as opaque and never followed.
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

    /// Relabel states; the mapping must cover the start state.
    pub fn rebuild_with_mapping(
        &self,
        mapping: &FxHashMap<i32, i32>,
        new_num_states: i32,
    ) -> FsmWithStartEnd {
        let fsm = self.fsm.rebuild_with_mapping(mapping, new_num_states);
        let mut out = FsmWithStartEnd::new(fsm, mapping[&self.start]);
        for accept in &self.accepts {
            if let Some(&new_accept) = mapping.get(accept) {
                out.accepts.insert(new_accept);
            }
        }
        out.is_dfa = self.is_dfa;
        out
    }

    /// Freeze into the compact form, consuming the builder-side machine.
    pub fn freeze(self) -> CompactFsmWithStartEnd {
        CompactFsmWithStartEnd::new(self.fsm.freeze(), self.start, self.accepts, self.is_dfa)
    }
}

impl fmt::Display for FsmWithStartEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut accepts: Vec<i32> = self.accepts.iter().copied().collect();
        accepts.sort_unstable();
        writeln!(
            f,
            "fsm(num_states={}, start={}, accepts={:?}, dfa={})",
            self.num_states(),
            self.start,
            accepts,
            self.is_dfa
        )?;
        for state in 0..self.num_states() {
            let mut edges = self.fsm.edges_from(state);
            edges.sort_unstable();
            write!(f, "  {state}:")?;
            for edge in edges {
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
