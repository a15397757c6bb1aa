//! NFA to DFA subset construction.
//!
//! DFA states are epsilon-closures of NFA state subsets, canonicalized as
//! sorted vectors and interned into dense ids. Character transitions are
//! computed per minimal sub-interval of the subset's range boundaries;
//! rule-reference edges carry over with one DFA edge per distinct rule id.

use rustc_hash::FxHashMap;

use crate::fsm::{Fsm, FsmWithStartEnd};

/// Interns sorted state subsets as dense DFA state ids.
struct SubsetArena {
    map: FxHashMap<Vec<i32>, i32>,
    subsets: Vec<Vec<i32>>,
}

impl SubsetArena {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            subsets: Vec::new(),
        }
    }

    /// Intern a sorted subset; returns `(id, newly_created)`.
    fn intern(&mut self, sorted: Vec<i32>) -> (i32, bool) {
        if let Some(&id) = self.map.get(&sorted) {
            return (id, false);
        }
        let id = self.subsets.len() as i32;
        self.subsets.push(sorted.clone());
        self.map.insert(sorted, id);
        (id, true)
    }
}

impl FsmWithStartEnd {
    /// Subset construction. The result has no epsilon edges, pairwise
    /// disjoint ranges per state, and one edge per distinct outgoing rule
    /// id; accepting states are subsets containing an NFA accept.
    pub fn to_dfa(&self) -> FsmWithStartEnd {
        let mut arena = SubsetArena::new();
        let mut dfa = Fsm::new();

        let mut start_subset = vec![self.start()];
        self.fsm().epsilon_closure(&mut start_subset);
        start_subset.sort_unstable();
        let (start_id, _) = arena.intern(start_subset);
        dfa.add_state();

        let mut out = FsmWithStartEnd::new(Fsm::new(), start_id);
        let mut worklist = vec![start_id];

        while let Some(dfa_state) = worklist.pop() {
            let subset = arena.subsets[dfa_state as usize].clone();

            // Range boundaries: every edge min, and one past every max.
            let mut boundaries: Vec<i32> = Vec::new();
            let mut rule_ids: Vec<i32> = Vec::new();
            for &state in &subset {
                for edge in self.fsm().edges_from(state) {
                    if edge.is_char_range() {
                        boundaries.push(edge.min as i32);
                        boundaries.push(edge.max as i32 + 1);
                    } else if let Some(rule) = edge.rule_id() {
                        rule_ids.push(rule);
                    }
                }
            }
            boundaries.sort_unstable();
            boundaries.dedup();
            rule_ids.sort_unstable();
            rule_ids.dedup();

            // One candidate edge per minimal interval; adjacent intervals
            // with the same target merge.
            let mut pending: Option<(i32, i32, i32)> = None;
            for window in boundaries.windows(2) {
                let (lo, hi) = (window[0], window[1] - 1);
                let mut targets: Vec<i32> = Vec::new();
                for &state in &subset {
                    for edge in self.fsm().edges_from(state) {
                        if edge.covers(lo as i16) {
                            targets.push(edge.target);
                        }
                    }
                }
                if targets.is_empty() {
                    continue;
                }
                self.fsm().epsilon_closure(&mut targets);
                targets.sort_unstable();
                targets.dedup();
                let (target_id, created) = arena.intern(targets);
                if created {
                    dfa.add_state();
                    worklist.push(target_id);
                }
                pending = match pending {
                    Some((plo, phi, ptarget)) if phi + 1 == lo && ptarget == target_id => {
                        Some((plo, hi, ptarget))
                    }
                    Some((plo, phi, ptarget)) => {
                        dfa.add_edge(dfa_state, ptarget, plo as i16, phi as i16);
                        Some((lo, hi, target_id))
                    }
                    None => Some((lo, hi, target_id)),
                };
            }
            if let Some((plo, phi, ptarget)) = pending {
                dfa.add_edge(dfa_state, ptarget, plo as i16, phi as i16);
            }

            for rule in rule_ids {
                let mut targets: Vec<i32> = Vec::new();
                for &state in &subset {
                    for edge in self.fsm().edges_from(state) {
                        if edge.rule_id() == Some(rule) {
                            targets.push(edge.target);
                        }
                    }
                }
                self.fsm().epsilon_closure(&mut targets);
                targets.sort_unstable();
                targets.dedup();
                let (target_id, created) = arena.intern(targets);
                if created {
                    dfa.add_state();
                    worklist.push(target_id);
                }
                dfa.add_rule_ref(dfa_state, target_id, rule as i16);
            }
        }

        *out.fsm_mut() = dfa;
        for (id, subset) in arena.subsets.iter().enumerate() {
            if subset.iter().any(|state| self.is_accept(*state)) {
                out.add_accept(id as i32);
            }
        }
        out.set_dfa(true);
        out
    }
}
