//! Structural simplifications on NFAs.
//!
//! Two passes, each run to a fixed point:
//! - epsilon merging: an epsilon edge `a -> b` collapses its endpoints when
//!   `b` has no other in-edges, or when the epsilon is `a`'s only out-edge
//! - equivalent-state merging: states that are sole targets of identical
//!   `(src, label)` edges and have no other in-edges merge
//!
//! Both passes leave disconnected states behind; `compact_states` rebuilds
//! the machine over the reachable subset.

use rustc_hash::FxHashMap;

use crate::fsm::FsmWithStartEnd;

impl FsmWithStartEnd {
    /// Merge states across removable epsilon edges until none remain.
    pub fn simplify_epsilon(&mut self) {
        loop {
            let Some((survivor, victim)) = self.find_epsilon_merge() else {
                break;
            };
            self.merge_states(survivor, victim);
        }
        self.compact_states();
    }

    /// One applicable epsilon merge, if any: `(survivor, victim)`.
    fn find_epsilon_merge(&self) -> Option<(i32, i32)> {
        let graph = self.fsm().graph();
        for state in 0..self.num_states() {
            for (_, edge) in graph.out_edges(state) {
                if !edge.label.is_epsilon() || edge.dst == edge.src {
                    continue;
                }
                let (a, b) = (edge.src, edge.dst);
                // Case 1: the epsilon is b's only in-edge. Everything
                // reaching b went through a, so the union state is exact.
                if graph.in_degree(b) == 1 && b != self.start() {
                    return Some((a, b));
                }
                // Case 2: the epsilon is a's only out-edge. Safe unless a
                // accepts strings that b does not.
                if graph.out_degree(a) == 1 && (!self.is_accept(a) || self.is_accept(b)) {
                    return Some((b, a));
                }
            }
        }
        None
    }

    /// Coalesce `victim` into `survivor`, fixing up start and accepts.
    fn merge_states(&mut self, survivor: i32, victim: i32) {
        if self.is_accept(victim) {
            self.remove_accept(victim);
            self.add_accept(survivor);
        }
        if self.start() == victim {
            self.set_start(survivor);
        }
        self.fsm_mut().graph_mut().coalesce(survivor, victim);
    }

    /// Merge sibling states produced by duplicated transitions: states
    /// whose single in-edges share source and label.
    pub fn simplify_equivalent_states(&mut self) {
        loop {
            let mut groups: FxHashMap<(i32, i16, i16), Vec<i32>> = FxHashMap::default();
            for state in 0..self.num_states() {
                if state == self.start() {
                    continue;
                }
                if self.fsm().graph().in_degree(state) != 1 {
                    continue;
                }
                let (_, edge) = self.fsm().graph().in_edges(state).next().expect("degree 1");
                groups
                    .entry((edge.src, edge.label.min, edge.label.max))
                    .or_default()
                    .push(state);
            }
            let mut merged_any = false;
            let mut merges: Vec<(i32, i32)> = Vec::new();
            for (_, mut members) in groups {
                if members.len() < 2 {
                    continue;
                }
                members.sort_unstable();
                let survivor = members[0];
                for &victim in &members[1..] {
                    merges.push((survivor, victim));
                }
            }
            // Apply one merge per round: coalescing invalidates the scan.
            if let Some((survivor, victim)) = merges.first().copied() {
                self.merge_states(survivor, victim);
                merged_any = true;
            }
            if !merged_any {
                break;
            }
        }
        self.compact_states();
    }

    /// Run both simplifications.
    pub fn simplify(&mut self) {
        self.simplify_epsilon();
        self.simplify_equivalent_states();
    }

    /// Rebuild over the states reachable from the start, relabeling
    /// densely in BFS order.
    pub fn compact_states(&mut self) {
        let (_, old_to_new, new_roots) = self.fsm().graph().simplify(&[self.start()]);
        let mut mapping = FxHashMap::default();
        let mut count = 0;
        for (old, &new) in old_to_new.iter().enumerate() {
            if new >= 0 {
                mapping.insert(old as i32, new);
                count = count.max(new + 1);
            }
        }
        let rebuilt = self.rebuild_with_mapping(&mapping, count);
        *self = rebuilt;
        debug_assert_eq!(new_roots[0], self.start());
    }
}
