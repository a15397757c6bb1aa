//! Complement and intersection.

use rustc_hash::FxHashMap;

use crate::fsm::{Fsm, FsmWithStartEnd};
use crate::{Error, Result, DEFAULT_STATE_LIMIT};

impl FsmWithStartEnd {
    /// Complement over the byte alphabet `0..=255`.
    ///
    /// The machine is determinized if needed, completed with a trap state
    /// for every uncovered byte range, and the accepting set is inverted.
    /// Rule-reference edges pass through untouched.
    pub fn complement(&self) -> FsmWithStartEnd {
        let dfa = if self.is_dfa() {
            self.clone()
        } else {
            self.to_dfa()
        };
        let mut out = dfa.clone();
        let trap = out.fsm_mut().add_state();
        for state in 0..out.num_states() {
            let mut covered: Vec<(i16, i16)> = if state == trap {
                Vec::new()
            } else {
                dfa.fsm()
                    .edges_from(state)
                    .into_iter()
                    .filter(|edge| edge.is_char_range())
                    .map(|edge| (edge.min, edge.max))
                    .collect()
            };
            covered.sort_unstable();
            let mut next: i16 = 0;
            for (lo, hi) in covered {
                if next < lo {
                    out.fsm_mut().add_edge(state, trap, next, lo - 1);
                }
                next = next.max(hi.saturating_add(1));
            }
            if next <= 255 {
                out.fsm_mut().add_edge(state, trap, next, 255);
            }
        }
        let accepts: Vec<i32> = (0..out.num_states())
            .filter(|&state| !dfa.is_accept(state) || state == trap)
            .collect();
        let old_accepts: Vec<i32> = out.accepts().iter().copied().collect();
        for accept in old_accepts {
            out.remove_accept(accept);
        }
        for accept in accepts {
            out.add_accept(accept);
        }
        out.set_dfa(true);
        out
    }

    /// Product intersection of two machines, determinizing as needed.
    ///
    /// Aborts with [`Error::StatesExceeded`] once the product would exceed
    /// `state_limit` states; pass [`DEFAULT_STATE_LIMIT`] unless tuned.
    pub fn intersect(
        lhs: &FsmWithStartEnd,
        rhs: &FsmWithStartEnd,
        state_limit: usize,
    ) -> Result<FsmWithStartEnd> {
        let lhs = if lhs.is_dfa() { lhs.clone() } else { lhs.to_dfa() };
        let rhs = if rhs.is_dfa() { rhs.clone() } else { rhs.to_dfa() };

        let mut pair_ids: FxHashMap<(i32, i32), i32> = FxHashMap::default();
        let mut pairs: Vec<(i32, i32)> = Vec::new();
        let mut product = Fsm::new();

        let start_pair = (lhs.start(), rhs.start());
        pair_ids.insert(start_pair, 0);
        pairs.push(start_pair);
        product.add_state();

        let mut worklist = vec![0i32];
        while let Some(pair_state) = worklist.pop() {
            let (p, q) = pairs[pair_state as usize];
            let p_edges = lhs.fsm().edges_from(p);
            let q_edges = rhs.fsm().edges_from(q);

            // Boundaries of both states' ranges; each minimal interval has
            // at most one target on each side.
            let mut boundaries: Vec<i32> = Vec::new();
            for edge in p_edges.iter().chain(q_edges.iter()) {
                if edge.is_char_range() {
                    boundaries.push(edge.min as i32);
                    boundaries.push(edge.max as i32 + 1);
                }
            }
            boundaries.sort_unstable();
            boundaries.dedup();

            let mut pending: Option<(i32, i32, i32)> = None;
            for window in boundaries.windows(2) {
                let (lo, hi) = (window[0], window[1] - 1);
                let p_target = p_edges
                    .iter()
                    .find(|edge| edge.covers(lo as i16))
                    .map(|edge| edge.target);
                let q_target = q_edges
                    .iter()
                    .find(|edge| edge.covers(lo as i16))
                    .map(|edge| edge.target);
                let (Some(pt), Some(qt)) = (p_target, q_target) else {
                    if let Some((plo, phi, ptarget)) = pending.take() {
                        product.add_edge(pair_state, ptarget, plo as i16, phi as i16);
                    }
                    continue;
                };
                let target_pair = (pt, qt);
                let target_id = match pair_ids.get(&target_pair).copied() {
                    Some(id) => id,
                    None => {
                        if pairs.len() >= state_limit {
                            return Err(Error::StatesExceeded { limit: state_limit });
                        }
                        let id = pairs.len() as i32;
                        pair_ids.insert(target_pair, id);
                        pairs.push(target_pair);
                        product.add_state();
                        worklist.push(id);
                        id
                    }
                };
                pending = match pending {
                    Some((plo, phi, ptarget)) if phi + 1 == lo && ptarget == target_id => {
                        Some((plo, hi, ptarget))
                    }
                    Some((plo, phi, ptarget)) => {
                        product.add_edge(pair_state, ptarget, plo as i16, phi as i16);
                        Some((lo, hi, target_id))
                    }
                    None => Some((lo, hi, target_id)),
                };
            }
            if let Some((plo, phi, ptarget)) = pending {
                product.add_edge(pair_state, ptarget, plo as i16, phi as i16);
            }

            // Rule references intersect on equal rule ids.
            for p_edge in p_edges.iter() {
                let Some(rule) = p_edge.rule_id() else {
                    continue;
                };
                for q_edge in q_edges.iter() {
                    if q_edge.rule_id() != Some(rule) {
                        continue;
                    }
                    let target_pair = (p_edge.target, q_edge.target);
                    let target_id = match pair_ids.get(&target_pair).copied() {
                        Some(id) => id,
                        None => {
                            if pairs.len() >= state_limit {
                                return Err(Error::StatesExceeded { limit: state_limit });
                            }
                            let id = pairs.len() as i32;
                            pair_ids.insert(target_pair, id);
                            pairs.push(target_pair);
                            product.add_state();
                            worklist.push(id);
                            id
                        }
                    };
                    product.add_rule_ref(pair_state, target_id, rule as i16);
                }
            }
        }

        let mut out = FsmWithStartEnd::new(product, 0);
        for (id, &(p, q)) in pairs.iter().enumerate() {
            if lhs.is_accept(p) && rhs.is_accept(q) {
                out.add_accept(id as i32);
            }
        }
        out.set_dfa(true);
        Ok(out)
    }
}

/// Convenience wrapper using the default budget.
pub fn intersect_default(lhs: &FsmWithStartEnd, rhs: &FsmWithStartEnd) -> Result<FsmWithStartEnd> {
    FsmWithStartEnd::intersect(lhs, rhs, DEFAULT_STATE_LIMIT)
}
