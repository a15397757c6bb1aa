//! Multi-pattern prefix automata.
//!
//! One state per unique prefix; each pattern's terminal state is marked
//! accepting and reported in input order. With `add_back_edges` the
//! automaton gains Aho-Corasick failure transitions computed by BFS over
//! increasing depth, turning it into a substring scanner: accepting states
//! are visited exactly when some pattern ends at the current input
//! position.

use rustc_hash::FxHashMap;

use crate::fsm::{Fsm, FsmWithStartEnd};

#[derive(Debug, Clone, Copy)]
pub struct TrieOptions {
    /// When false, reject pattern lists where one pattern is a prefix of
    /// another (or any pattern is empty).
    pub allow_overlap: bool,
    /// Add failure-link byte transitions (and a byte-absorbing root loop).
    pub add_back_edges: bool,
}

impl Default for TrieOptions {
    fn default() -> Self {
        Self {
            allow_overlap: true,
            add_back_edges: false,
        }
    }
}

/// Build a prefix automaton from `patterns`.
///
/// Returns the machine and each pattern's terminal state, in input order,
/// or `None` when overlap checks fail.
pub fn build_trie<S: AsRef<[u8]>>(
    patterns: &[S],
    options: TrieOptions,
) -> Option<(FsmWithStartEnd, Vec<i32>)> {
    const ROOT: i32 = 0;
    let mut goto: Vec<FxHashMap<u8, i32>> = vec![FxHashMap::default()];
    let mut depth: Vec<u32> = vec![0];
    let mut accepting: Vec<bool> = vec![false];
    let mut terminals = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        let bytes = pattern.as_ref();
        if bytes.is_empty() && !options.allow_overlap {
            return None;
        }
        let mut state = ROOT;
        for &byte in bytes {
            if accepting[state as usize] && !options.allow_overlap {
                // A shorter pattern is a proper prefix of this one.
                return None;
            }
            let existing = goto[state as usize].get(&byte).copied();
            state = match existing {
                Some(next) => next,
                None => {
                    let next = goto.len() as i32;
                    goto.push(FxHashMap::default());
                    depth.push(depth[state as usize] + 1);
                    accepting.push(false);
                    goto[state as usize].insert(byte, next);
                    next
                }
            };
        }
        if !options.allow_overlap && (accepting[state as usize] || !goto[state as usize].is_empty())
        {
            // Duplicate pattern, or this pattern is a prefix of another.
            return None;
        }
        accepting[state as usize] = true;
        terminals.push(state);
    }

    let num_states = goto.len();
    let mut fsm = Fsm::with_states(num_states);

    if options.add_back_edges {
        let fail = failure_links(&goto, &depth);
        // Accepting propagates along failure chains: a state is accepting
        // when any proper suffix of its prefix is a pattern.
        let mut order: Vec<i32> = (0..num_states as i32).collect();
        order.sort_unstable_by_key(|&s| depth[s as usize]);
        for &state in &order {
            if state != ROOT && accepting[fail[state as usize] as usize] {
                accepting[state as usize] = true;
            }
        }
        // Total transition function, merged into byte ranges per state.
        for state in 0..num_states as i32 {
            let mut pending: Option<(u8, u8, i32)> = None;
            for byte in 0..=255u8 {
                let target = delta(&goto, &fail, state, byte);
                pending = match pending {
                    Some((lo, hi, t)) if t == target && hi + 1 == byte => Some((lo, byte, t)),
                    Some((lo, hi, t)) => {
                        fsm.add_edge(state, t, lo as i16, hi as i16);
                        Some((byte, byte, target))
                    }
                    None => Some((byte, byte, target)),
                };
            }
            if let Some((lo, hi, t)) = pending {
                fsm.add_edge(state, t, lo as i16, hi as i16);
            }
        }
    } else {
        for (state, row) in goto.iter().enumerate() {
            let mut edges: Vec<(u8, i32)> = row.iter().map(|(&b, &t)| (b, t)).collect();
            edges.sort_unstable();
            for (byte, target) in edges {
                fsm.add_edge(state as i32, target, byte as i16, byte as i16);
            }
        }
    }

    let mut out = FsmWithStartEnd::new(fsm, ROOT);
    for (state, &is_accepting) in accepting.iter().enumerate() {
        if is_accepting {
            out.add_accept(state as i32);
        }
    }
    out.set_dfa(true);
    Some((out, terminals))
}

/// Failure links by BFS over states in increasing depth.
fn failure_links(goto: &[FxHashMap<u8, i32>], depth: &[u32]) -> Vec<i32> {
    const ROOT: i32 = 0;
    let mut fail = vec![ROOT; goto.len()];
    let mut order: Vec<i32> = (0..goto.len() as i32).collect();
    order.sort_unstable_by_key(|&s| depth[s as usize]);
    for &state in &order {
        for (&byte, &child) in &goto[state as usize] {
            if state == ROOT {
                fail[child as usize] = ROOT;
                continue;
            }
            let mut probe = fail[state as usize];
            loop {
                if let Some(&next) = goto[probe as usize].get(&byte) {
                    if next != child {
                        fail[child as usize] = next;
                    }
                    break;
                }
                if probe == ROOT {
                    break;
                }
                probe = fail[probe as usize];
            }
        }
    }
    fail
}

/// The total transition function of the failure automaton.
fn delta(goto: &[FxHashMap<u8, i32>], fail: &[i32], state: i32, byte: u8) -> i32 {
    const ROOT: i32 = 0;
    let mut probe = state;
    loop {
        if let Some(&next) = goto[probe as usize].get(&byte) {
            return next;
        }
        if probe == ROOT {
            return ROOT;
        }
        probe = fail[probe as usize];
    }
}
