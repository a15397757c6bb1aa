//! Finite-state machines for grammar-constrained decoding.
//!
//! The machines here are directed multigraphs over integer state ids whose
//! edges carry one of three label kinds: a byte range, epsilon, or a
//! rule reference. This crate provides:
//! - `fsm` - the mutable machine and its start/accept wrapper
//! - `compact` - the frozen CSR form used on hot paths
//! - `construct` - the Thompson construction algebra
//! - `determinize` / `minimize` / `boolean` - subset construction,
//!   Hopcroft minimization, complement and budgeted intersection
//! - `simplify` - epsilon merging and equivalent-state merging
//! - `regex` - the regex IR and its compiler
//! - `trie` - multi-pattern prefix automata with optional failure links
//! - `utf8` - codepoint-range to byte-range expansion

pub mod boolean;
pub mod compact;
pub mod construct;
pub mod determinize;
pub mod edge;
pub mod fsm;
pub mod minimize;
pub mod regex;
pub mod simplify;
pub mod trie;
pub mod utf8;

#[cfg(test)]
mod fsm_tests;
#[cfg(test)]
mod minimize_tests;

pub use compact::{CompactFsm, CompactFsmWithStartEnd, NO_TRANSITION};
pub use edge::{FsmEdge, FsmLabel};
pub use fsm::{Fsm, FsmWithStartEnd};
pub use regex::{compile_regex, parse_regex, RegexIr};
pub use trie::{build_trie, TrieOptions};

/// Default state budget for product constructions.
pub const DEFAULT_STATE_LIMIT: usize = 1_000_000;

/// Errors surfaced by FSM construction and the regex front end.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid UTF-8 sequence in pattern")]
    InvalidUtf8,

    #[error("invalid escape sequence in pattern")]
    InvalidEscape,

    #[error("unbalanced bracket in pattern")]
    UnbalancedBracket,

    #[error("invalid character class: {0}")]
    InvalidCharClass(String),

    #[error("invalid repetition bounds: {{{lower},{upper}}}")]
    BadRepetitionBounds { lower: i64, upper: i64 },

    #[error("recursion limit of {limit} exceeded")]
    RecursionLimit { limit: u32 },

    #[error("state budget of {limit} states exceeded")]
    StatesExceeded { limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
