//! The grammar AST.
//!
//! A grammar is an ordered rule table plus a flat expression store. Every
//! expression lives once in a CSR blob: the first word of a row is the
//! type tag, the rest is the payload. Ids are dense and append-only.
//! Frozen grammars are immutable and cheap to clone (shared buffers).

use std::fmt;

use grammask_core::csr::CsrArray;
use grammask_core::encoding::{escape_bytes, escape_codepoint};

use crate::normalize::normalize;
use crate::parser::parse_ebnf;
use crate::Result;

/// Expression type tags, stored as the first payload word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExprType {
    /// Payload: `[byte0, byte1, ...]`, each in `0..=255`.
    ByteString = 0,
    /// Payload: `[negated, lo0, hi0, lo1, hi1, ...]` over codepoints.
    CharacterClass = 1,
    /// Same payload as `CharacterClass`; a starred class kept atomic for
    /// matcher efficiency.
    CharacterClassStar = 2,
    /// Payload: empty.
    EmptyStr = 3,
    /// Payload: `[rule_id]`.
    RuleRef = 4,
    /// Payload: `[expr_id0, expr_id1, ...]`; concatenation.
    Sequence = 5,
    /// Payload: `[expr_id0, expr_id1, ...]`; disjunction.
    Choices = 6,
    /// Payload: `[expr_id]`.
    Star = 7,
    /// Payload: `[expr_id]`.
    Plus = 8,
    /// Payload: `[expr_id]`.
    Question = 9,
    /// Payload: `[expr_id, lower, upper]`; `upper == -1` is unbounded.
    QuantifierRange = 10,
}

impl ExprType {
    pub fn from_tag(tag: i32) -> Option<ExprType> {
        Some(match tag {
            0 => ExprType::ByteString,
            1 => ExprType::CharacterClass,
            2 => ExprType::CharacterClassStar,
            3 => ExprType::EmptyStr,
            4 => ExprType::RuleRef,
            5 => ExprType::Sequence,
            6 => ExprType::Choices,
            7 => ExprType::Star,
            8 => ExprType::Plus,
            9 => ExprType::Question,
            10 => ExprType::QuantifierRange,
            _ => return None,
        })
    }
}

/// A named production. `lookahead_id` is `-1` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub body_expr_id: i32,
    pub lookahead_id: i32,
}

/// Borrowed view of one expression: its tag and payload slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprRef<'a> {
    pub ty: ExprType,
    pub data: &'a [i32],
}

impl<'a> ExprRef<'a> {
    /// Child expression ids, for `Sequence`/`Choices`.
    pub fn child_ids(&self) -> &'a [i32] {
        debug_assert!(matches!(self.ty, ExprType::Sequence | ExprType::Choices));
        self.data
    }

    /// `(negated, ranges)` payload of a character class.
    pub fn class_parts(&self) -> (bool, Vec<(i32, i32)>) {
        debug_assert!(matches!(
            self.ty,
            ExprType::CharacterClass | ExprType::CharacterClassStar
        ));
        let negated = self.data[0] != 0;
        let ranges = self.data[1..]
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        (negated, ranges)
    }
}

/// A frozen grammar: rule table, expression store, root rule id.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) rules: Vec<Rule>,
    pub(crate) expr_data: CsrArray<i32>,
    pub(crate) root_rule_id: i32,
}

impl Grammar {
    /// Parse EBNF text and normalize into canonical form.
    pub fn from_ebnf(source: &str, root_rule: &str) -> Result<Grammar> {
        let raw = parse_ebnf(source, root_rule)?;
        normalize(&raw)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn root_rule_id(&self) -> i32 {
        self.root_rule_id
    }

    pub fn rule(&self, rule_id: i32) -> &Rule {
        &self.rules[rule_id as usize]
    }

    pub fn root_rule(&self) -> &Rule {
        self.rule(self.root_rule_id)
    }

    /// Linear name lookup; the table is small and this is off the hot path.
    pub fn rule_id(&self, name: &str) -> Option<i32> {
        self.rules
            .iter()
            .position(|rule| rule.name == name)
            .map(|index| index as i32)
    }

    pub fn expr_count(&self) -> usize {
        self.expr_data.len()
    }

    pub fn expr(&self, expr_id: i32) -> ExprRef<'_> {
        let row = self.expr_data.row(expr_id as usize);
        let ty = ExprType::from_tag(row[0]).expect("valid expression tag");
        ExprRef {
            ty,
            data: &row[1..],
        }
    }

    pub(crate) fn expr_data(&self) -> &CsrArray<i32> {
        &self.expr_data
    }

    fn needs_parens(&self, expr_id: i32) -> bool {
        matches!(
            self.expr(expr_id).ty,
            ExprType::Sequence | ExprType::Choices
        )
    }

    fn print_quantified(&self, f: &mut fmt::Formatter<'_>, inner: i32, suffix: &str) -> fmt::Result {
        if self.needs_parens(inner) {
            write!(f, "(")?;
            self.print_expr(f, inner)?;
            write!(f, ")")?;
        } else {
            self.print_expr(f, inner)?;
        }
        write!(f, "{suffix}")
    }

    /// Print one expression in round-trippable EBNF syntax.
    pub(crate) fn print_expr(&self, f: &mut fmt::Formatter<'_>, expr_id: i32) -> fmt::Result {
        let expr = self.expr(expr_id);
        match expr.ty {
            ExprType::ByteString => {
                let bytes: Vec<u8> = expr.data.iter().map(|&word| word as u8).collect();
                write!(f, "\"{}\"", escape_bytes(&bytes))
            }
            ExprType::CharacterClass | ExprType::CharacterClassStar => {
                let (negated, ranges) = expr.class_parts();
                write!(f, "[")?;
                if negated {
                    write!(f, "^")?;
                }
                let extra: [(i32, &str); 2] = [('-' as i32, "\\-"), (']' as i32, "\\]")];
                for (lo, hi) in ranges {
                    write!(f, "{}", escape_codepoint(lo, &extra))?;
                    if hi != lo {
                        write!(f, "-{}", escape_codepoint(hi, &extra))?;
                    }
                }
                write!(f, "]")?;
                if expr.ty == ExprType::CharacterClassStar {
                    write!(f, "*")?;
                }
                Ok(())
            }
            ExprType::EmptyStr => write!(f, "\"\""),
            ExprType::RuleRef => write!(f, "{}", self.rule(expr.data[0]).name),
            ExprType::Sequence => {
                for (index, &child) in expr.data.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    if self.needs_parens(child) {
                        write!(f, "(")?;
                        self.print_expr(f, child)?;
                        write!(f, ")")?;
                    } else {
                        self.print_expr(f, child)?;
                    }
                }
                Ok(())
            }
            ExprType::Choices => {
                for (index, &child) in expr.data.iter().enumerate() {
                    if index > 0 {
                        write!(f, " | ")?;
                    }
                    if self.expr(child).ty == ExprType::Choices {
                        write!(f, "(")?;
                        self.print_expr(f, child)?;
                        write!(f, ")")?;
                    } else {
                        self.print_expr(f, child)?;
                    }
                }
                Ok(())
            }
            ExprType::Star => self.print_quantified(f, expr.data[0], "*"),
            ExprType::Plus => self.print_quantified(f, expr.data[0], "+"),
            ExprType::Question => self.print_quantified(f, expr.data[0], "?"),
            ExprType::QuantifierRange => {
                let (inner, lower, upper) = (expr.data[0], expr.data[1], expr.data[2]);
                let suffix = if upper < 0 {
                    format!("{{{lower},}}")
                } else {
                    format!("{{{lower},{upper}}}")
                };
                self.print_quantified(f, inner, &suffix)
            }
        }
    }
}

impl fmt::Display for Grammar {
    /// Round-trippable EBNF text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            write!(f, "{} ::= ", rule.name)?;
            self.print_expr(f, rule.body_expr_id)?;
            if rule.lookahead_id >= 0 {
                write!(f, " (= ")?;
                self.print_expr(f, rule.lookahead_id)?;
                write!(f, ")")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
