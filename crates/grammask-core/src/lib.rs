//! Support layer for the grammask workspace.
//!
//! Three building blocks shared by the automata engine and the grammar
//! compiler:
//! - `encoding` - codepoint decoding/encoding with escape handling
//! - `csr` - compressed-sparse-row storage with shared immutable buffers
//! - `graph` - doubly-linked labeled multigraph with O(1) edge insertion

pub mod csr;
pub mod encoding;
pub mod graph;

#[cfg(test)]
mod encoding_tests;
#[cfg(test)]
mod graph_tests;

pub use csr::{CsrArray, CsrBuilder};
pub use encoding::{CharError, Codepoint};
pub use graph::{Graph, GraphEdge, INVALID_EDGE};
