//! Thompson construction algebra.
//!
//! Every combinator returns a machine with a single start state and a set
//! of accepting states; composition wires fragments together with epsilon
//! edges. Bounded repetition unrolls state-renumbered clones, never
//! aliased sub-machines.

use rustc_hash::FxHashMap;

use crate::fsm::{Fsm, FsmWithStartEnd};
use crate::utf8::{class_to_byte_sequences, Codepoint};
use crate::{Error, Result};

impl FsmWithStartEnd {
    /// The machine accepting exactly the empty string.
    pub fn empty_string() -> Self {
        let mut fsm = Fsm::new();
        let start = fsm.add_state();
        let mut out = FsmWithStartEnd::new(fsm, start);
        out.add_accept(start);
        out.set_dfa(true);
        out
    }

    /// A machine accepting exactly one byte string.
    pub fn byte_string(bytes: &[u8]) -> Self {
        let mut fsm = Fsm::new();
        let start = fsm.add_state();
        let mut cur = start;
        for &byte in bytes {
            let next = fsm.add_state();
            fsm.add_edge(cur, next, byte as i16, byte as i16);
            cur = next;
        }
        let mut out = FsmWithStartEnd::new(fsm, start);
        out.add_accept(cur);
        out.set_dfa(true);
        out
    }

    /// A two-state machine over one inclusive byte range.
    pub fn byte_range(min: u8, max: u8) -> Self {
        let mut fsm = Fsm::new();
        let start = fsm.add_state();
        let accept = fsm.add_state();
        fsm.add_edge(start, accept, min as i16, max as i16);
        let mut out = FsmWithStartEnd::new(fsm, start);
        out.add_accept(accept);
        out.set_dfa(true);
        out
    }

    /// A machine accepting the UTF-8 encoding of any codepoint in the
    /// class. Multi-byte ranges expand through intermediate states.
    pub fn from_char_class(ranges: &[(Codepoint, Codepoint)], negated: bool) -> Result<Self> {
        let sequences = class_to_byte_sequences(ranges, negated);
        if sequences.is_empty() {
            return Err(Error::InvalidCharClass("class matches nothing".to_string()));
        }
        let mut fsm = Fsm::new();
        let start = fsm.add_state();
        let accept = fsm.add_state();
        for seq in &sequences {
            let mut cur = start;
            for (index, &(min, max)) in seq.iter().enumerate() {
                let next = if index + 1 == seq.len() {
                    accept
                } else {
                    fsm.add_state()
                };
                fsm.add_edge(cur, next, min as i16, max as i16);
                cur = next;
            }
        }
        let mut out = FsmWithStartEnd::new(fsm, start);
        out.add_accept(accept);
        Ok(out)
    }

    /// Copy `other` into `base`, returning its relabeled start and accepts.
    fn splice(base: &mut FsmWithStartEnd, other: &FsmWithStartEnd) -> (i32, Vec<i32>) {
        let mut mapping = FxHashMap::default();
        base.fsm_mut().absorb(other.fsm(), &mut mapping);
        let start = mapping[&other.start()];
        let mut accepts: Vec<i32> = other.accepts().iter().map(|s| mapping[s]).collect();
        accepts.sort_unstable();
        (start, accepts)
    }

    /// Concatenation: accepts of each part epsilon-connect to the next
    /// part's start; the final part's accepts survive.
    pub fn concat(parts: Vec<FsmWithStartEnd>) -> Self {
        let mut iter = parts.into_iter();
        let Some(mut out) = iter.next() else {
            return Self::empty_string();
        };
        out.set_dfa(false);
        for part in iter {
            let (part_start, part_accepts) = Self::splice(&mut out, &part);
            let old_accepts: Vec<i32> = out.accepts().iter().copied().collect();
            for accept in old_accepts {
                out.fsm_mut().add_epsilon(accept, part_start);
                out.remove_accept(accept);
            }
            for accept in part_accepts {
                out.add_accept(accept);
            }
        }
        out
    }

    /// Alternation: a fresh start with an epsilon to each sub-start;
    /// accepting set is the union.
    pub fn union(parts: Vec<FsmWithStartEnd>) -> Self {
        let mut fsm = Fsm::new();
        let start = fsm.add_state();
        let mut out = FsmWithStartEnd::new(fsm, start);
        for part in &parts {
            let (part_start, part_accepts) = Self::splice(&mut out, part);
            out.fsm_mut().add_epsilon(start, part_start);
            for accept in part_accepts {
                out.add_accept(accept);
            }
        }
        out
    }

    /// Kleene star: a fresh accepting start; accepts loop back to it.
    pub fn star(self) -> Self {
        let mut out = self;
        let old_start = out.start();
        let new_start = out.fsm_mut().add_state();
        out.fsm_mut().add_epsilon(new_start, old_start);
        let accepts: Vec<i32> = out.accepts().iter().copied().collect();
        for accept in accepts {
            out.fsm_mut().add_epsilon(accept, new_start);
        }
        out.set_start(new_start);
        out.add_accept(new_start);
        out.set_dfa(false);
        out
    }

    /// One-or-more: the star construction with a non-accepting start.
    pub fn plus(self) -> Self {
        let mut out = self;
        let old_start = out.start();
        let new_start = out.fsm_mut().add_state();
        out.fsm_mut().add_epsilon(new_start, old_start);
        let accepts: Vec<i32> = out.accepts().iter().copied().collect();
        for accept in accepts {
            out.fsm_mut().add_epsilon(accept, new_start);
        }
        out.set_start(new_start);
        out.set_dfa(false);
        out
    }

    /// Zero-or-one: a fresh start with epsilons to the inner start and to a
    /// fresh accept state; inner accepts stay accepting.
    pub fn question(self) -> Self {
        let mut out = self;
        let old_start = out.start();
        let new_start = out.fsm_mut().add_state();
        let new_accept = out.fsm_mut().add_state();
        out.fsm_mut().add_epsilon(new_start, old_start);
        out.fsm_mut().add_epsilon(new_start, new_accept);
        out.set_start(new_start);
        out.add_accept(new_accept);
        out.set_dfa(false);
        out
    }

    /// Bounded repetition `self{lower, upper}`; `upper == -1` means
    /// unbounded. Unrolls `lower` clones, then `upper - lower` optional
    /// clones (or a starred tail when unbounded).
    pub fn repeat(self, lower: u32, upper: i64) -> Result<Self> {
        if upper >= 0 && (lower as i64) > upper {
            return Err(Error::BadRepetitionBounds {
                lower: lower as i64,
                upper,
            });
        }
        let mut parts: Vec<FsmWithStartEnd> = Vec::new();
        for _ in 0..lower {
            parts.push(self.clone());
        }
        if upper < 0 {
            parts.push(self.star());
        } else {
            for _ in 0..(upper - lower as i64) {
                parts.push(self.clone().question());
            }
        }
        if parts.is_empty() {
            return Ok(Self::empty_string());
        }
        Ok(Self::concat(parts))
    }
}
