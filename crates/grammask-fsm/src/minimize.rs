//! DFA minimization.
//!
//! Trim (forward- and co-reachability) followed by Hopcroft partition
//! refinement. The refinement alphabet is the set of global range
//! boundaries plus one symbol per referenced rule id, so rule-reference
//! edges act as opaque labels: states with differing rule-reference
//! behavior never merge.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::fsm::{Fsm, FsmWithStartEnd};

/// Refinement symbol: a representative byte or a rule id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Symbol {
    Char(i32),
    Rule(i32),
}

impl FsmWithStartEnd {
    /// Hopcroft minimization. Non-DFA inputs are determinized first. The
    /// result is the minimal partial DFA for the same language.
    pub fn minimize_dfa(&self) -> FsmWithStartEnd {
        let dfa = if self.is_dfa() {
            self.clone()
        } else {
            self.to_dfa()
        };

        let Some(trimmed) = trim(&dfa) else {
            // Empty language: a lone non-accepting start state.
            let mut fsm = Fsm::new();
            let start = fsm.add_state();
            let mut out = FsmWithStartEnd::new(fsm, start);
            out.set_dfa(true);
            return out;
        };
        if trimmed.num_states() <= 1 {
            return trimmed;
        }
        hopcroft_refine(&trimmed)
    }
}

/// Remove states unreachable from the start or with no path to an accept.
/// Returns `None` when the language is empty.
fn trim(dfa: &FsmWithStartEnd) -> Option<FsmWithStartEnd> {
    let n = dfa.num_states();

    let forward = dfa.reachable_states();

    // Backward reachability over reversed edges.
    let mut rev: Vec<Vec<i32>> = vec![Vec::new(); n as usize];
    for state in 0..n {
        for edge in dfa.fsm().edges_from(state) {
            rev[edge.target as usize].push(state);
        }
    }
    let mut backward = FxHashSet::default();
    let mut stack: Vec<i32> = dfa.accepts().iter().copied().collect();
    for &state in &stack {
        backward.insert(state);
    }
    while let Some(state) = stack.pop() {
        for &pred in &rev[state as usize] {
            if backward.insert(pred) {
                stack.push(pred);
            }
        }
    }

    let mut mapping = FxHashMap::default();
    let mut kept = 0;
    for state in 0..n {
        if forward.contains(&state) && backward.contains(&state) {
            mapping.insert(state, kept);
            kept += 1;
        }
    }
    if !mapping.contains_key(&dfa.start()) {
        return None;
    }
    Some(dfa.rebuild_with_mapping(&mapping, kept))
}

fn hopcroft_refine(dfa: &FsmWithStartEnd) -> FsmWithStartEnd {
    let n = dfa.num_states() as usize;

    // Global alphabet: one representative per minimal boundary interval,
    // plus every referenced rule id.
    let mut boundaries: Vec<i32> = Vec::new();
    let mut rule_ids: Vec<i32> = Vec::new();
    for state in 0..dfa.num_states() {
        for edge in dfa.fsm().edges_from(state) {
            if edge.is_char_range() {
                boundaries.push(edge.min as i32);
            } else if let Some(rule) = edge.rule_id() {
                rule_ids.push(rule);
            }
        }
    }
    boundaries.sort_unstable();
    boundaries.dedup();
    rule_ids.sort_unstable();
    rule_ids.dedup();
    let alphabet: Vec<Symbol> = boundaries
        .iter()
        .map(|&b| Symbol::Char(b))
        .chain(rule_ids.iter().map(|&r| Symbol::Rule(r)))
        .collect();
    let sym_index: FxHashMap<Symbol, usize> = alphabet
        .iter()
        .enumerate()
        .map(|(i, &s)| (s, i))
        .collect();
    let k = alphabet.len();
    if k == 0 {
        // No transitions after trim: all states collapse into the start.
        let mut fsm = Fsm::new();
        let start = fsm.add_state();
        let mut out = FsmWithStartEnd::new(fsm, start);
        if !dfa.accepts().is_empty() {
            out.add_accept(start);
        }
        out.set_dfa(true);
        return out;
    }

    // Preimage lists: inv[target * k + symbol] = sources.
    let mut inv: Vec<Vec<i32>> = vec![Vec::new(); n * k];
    for state in 0..dfa.num_states() {
        for edge in dfa.fsm().edges_from(state) {
            if edge.is_char_range() {
                // A DFA edge covers every boundary symbol inside its range.
                let lo = boundaries.partition_point(|&b| b < edge.min as i32);
                let hi = boundaries.partition_point(|&b| b <= edge.max as i32);
                for &boundary in &boundaries[lo..hi] {
                    let sym = sym_index[&Symbol::Char(boundary)];
                    inv[edge.target as usize * k + sym].push(state);
                }
            } else if let Some(rule) = edge.rule_id() {
                let sym = sym_index[&Symbol::Rule(rule)];
                inv[edge.target as usize * k + sym].push(state);
            }
        }
    }

    // Initial partition: accepting vs non-accepting.
    let mut blocks: Vec<Vec<i32>> = Vec::new();
    let mut find: Vec<u32> = vec![0; n];
    let mut in_worklist: Vec<bool> = Vec::new();
    let mut worklist: Vec<u32> = Vec::new();

    let mut accept_block = Vec::new();
    let mut reject_block = Vec::new();
    for state in 0..n as i32 {
        if dfa.is_accept(state) {
            accept_block.push(state);
        } else {
            reject_block.push(state);
        }
    }
    for &state in &accept_block {
        find[state as usize] = 0;
    }
    blocks.push(accept_block);
    in_worklist.push(true);
    worklist.push(0);
    if !reject_block.is_empty() {
        for &state in &reject_block {
            find[state as usize] = 1;
        }
        blocks.push(reject_block);
        in_worklist.push(true);
        worklist.push(1);
    }

    let mut grouped: FxHashMap<u32, Vec<i32>> = FxHashMap::default();
    while let Some(splitter) = worklist.pop() {
        in_worklist[splitter as usize] = false;
        let splitter_block = std::mem::take(&mut blocks[splitter as usize]);

        for sym in 0..k {
            // Group the splitter's preimages on this symbol by block.
            grouped.clear();
            for &target in &splitter_block {
                for &source in &inv[target as usize * k + sym] {
                    grouped
                        .entry(find[source as usize])
                        .or_default()
                        .push(source);
                }
            }

            let mut touched: Vec<(u32, Vec<i32>)> = grouped.drain().collect();
            touched.sort_unstable_by_key(|(block_id, _)| *block_id);
            for (block_id, sources) in touched {
                let block_len = blocks[block_id as usize].len();
                if block_len == 0 {
                    continue;
                }
                let mut inside: FxHashSet<i32> = FxHashSet::default();
                for &source in &sources {
                    if find[source as usize] == block_id {
                        inside.insert(source);
                    }
                }
                if inside.is_empty() || inside.len() == block_len {
                    continue;
                }

                // Split the block into (preimage, remainder).
                let old = std::mem::take(&mut blocks[block_id as usize]);
                let mut kept = Vec::with_capacity(inside.len());
                let mut moved = Vec::with_capacity(block_len - inside.len());
                for state in old {
                    if inside.contains(&state) {
                        kept.push(state);
                    } else {
                        moved.push(state);
                    }
                }
                blocks[block_id as usize] = kept;
                let new_id = blocks.len() as u32;
                for &state in &moved {
                    find[state as usize] = new_id;
                }
                blocks.push(moved);
                in_worklist.push(false);

                // Enqueue the smaller half (Hopcroft's trick).
                if in_worklist[block_id as usize] {
                    in_worklist[new_id as usize] = true;
                    worklist.push(new_id);
                } else if blocks[block_id as usize].len() <= blocks[new_id as usize].len() {
                    in_worklist[block_id as usize] = true;
                    worklist.push(block_id);
                } else {
                    in_worklist[new_id as usize] = true;
                    worklist.push(new_id);
                }
            }
        }

        blocks[splitter as usize] = splitter_block;
    }

    // Renumber surviving blocks densely, start's block first for a stable
    // start id of 0.
    let mut block_to_class: FxHashMap<u32, i32> = FxHashMap::default();
    let mut next_class = 0;
    block_to_class.insert(find[dfa.start() as usize], 0);
    next_class += 1;
    let mut mapping = FxHashMap::default();
    for state in 0..n {
        let block = find[state];
        let class = *block_to_class.entry(block).or_insert_with(|| {
            let id = next_class;
            next_class += 1;
            id
        });
        mapping.insert(state as i32, class);
    }

    // Rebuild and dedup merged edges via freeze-order normalization.
    let rebuilt = dfa.rebuild_with_mapping(&mapping, next_class);
    let mut fsm = Fsm::with_states(next_class as usize);
    for state in 0..next_class {
        let mut row = rebuilt.fsm().edges_from(state);
        row.sort_unstable();
        row.dedup();
        for edge in row {
            fsm.graph_mut().add_edge(state, edge.target, edge.label());
        }
    }
    let mut out = FsmWithStartEnd::new(fsm, 0);
    for &accept in rebuilt.accepts() {
        out.add_accept(accept);
    }
    out.set_dfa(true);
    out
}
