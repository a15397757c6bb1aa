//! EBNF front end for grammar-constrained decoding.
//!
//! The compilation pipeline:
//! - `lexer` - span-based tokens over the EBNF dialect
//! - `parser` - two-pass parse (rule names, then bodies) into the AST
//! - `grammar` / `builder` - the CSR-backed grammar AST and its builder
//! - `normalize` - rewrites into the canonical nested form
//! - `serialize` - JSON dump and reload for tests
//! - `classfsm` - shared compact FSMs for character-class expressions
//! - `json` - the built-in JSON grammar

pub mod builder;
pub mod classfsm;
pub mod grammar;
pub mod invariants;
pub mod json;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod serialize;

#[cfg(test)]
mod classfsm_tests;
#[cfg(test)]
mod json_tests;
#[cfg(test)]
mod serialize_tests;
#[cfg(test)]
pub mod testing;

pub use builder::GrammarBuilder;
pub use classfsm::ClassFsmTable;
pub use grammar::{ExprRef, ExprType, Grammar, Rule};
pub use json::{json_grammar, JSON_GRAMMAR};
pub use parser::parse_ebnf;

/// Errors from the EBNF front end. All user-visible failures are values;
/// nothing partial escapes a failed parse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("lex error at {line}:{column}: {message}")]
    Lex {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("invalid UTF-8 sequence at {line}:{column}")]
    InvalidUtf8 { line: u32, column: u32 },

    #[error("invalid escape sequence at {line}:{column}")]
    InvalidEscape { line: u32, column: u32 },

    #[error("invalid character class at {line}:{column}: {message}")]
    InvalidCharClass {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("invalid repetition bounds at {line}:{column}: {lower} > {upper}")]
    BadRepetitionBounds {
        line: u32,
        column: u32,
        lower: i64,
        upper: i64,
    },

    #[error("recursion limit of {limit} exceeded")]
    RecursionLimit { limit: u32 },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error(transparent)]
    Fsm(#[from] grammask_fsm::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
