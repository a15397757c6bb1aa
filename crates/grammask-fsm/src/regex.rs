//! Regex IR and compiler.
//!
//! A small POSIX-extended-like surface is parsed into a tagged IR and
//! lowered to an NFA through the construction algebra. Supported syntax:
//! character classes `[...]` with ranges and negation, escapes (including
//! `\xHH`, `\uHHHH`, `\UHHHHHHHH`, and `\-`/`\]` inside classes), the
//! metacharacters `. * + ? | ( )`, bounded quantifiers `{m,n}`, and
//! `(?=...)` / `(?!...)` look-ahead, which is parsed and stored but only a
//! trailing top-level assertion is tolerated by the compiler.

use grammask_core::encoding::{decode_utf8_or_escaped, Codepoint};

use crate::fsm::FsmWithStartEnd;
use crate::utf8::MAX_CODEPOINT;
use crate::{Error, Result};

const MAX_RECURSION_DEPTH: u32 = 200;

/// Regex intermediate representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexIr {
    /// A literal codepoint.
    Leaf(Codepoint),
    /// A bracket character class, or the `.` metacharacter.
    Class {
        negated: bool,
        ranges: Vec<(Codepoint, Codepoint)>,
    },
    /// A concatenation container produced by grouping.
    Bracket(Vec<RegexIr>),
    /// `* + ?` applied to a target.
    Symbol { op: RegexOp, target: Box<RegexIr> },
    /// Bounded repetition; `upper == -1` means unbounded.
    Repeat {
        target: Box<RegexIr>,
        lower: u32,
        upper: i64,
    },
    /// Alternation.
    Union(Vec<RegexIr>),
    /// `(?=...)` / `(?!...)`.
    LookAhead { positive: bool, target: Box<RegexIr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexOp {
    Star,
    Plus,
    Question,
}

/// Parse a regex into its IR.
pub fn parse_regex(pattern: &str) -> Result<RegexIr> {
    let mut parser = RegexParser {
        input: pattern.as_bytes(),
        pos: 0,
        depth: 0,
    };
    let ir = parser.parse_union()?;
    if parser.pos != parser.input.len() {
        // A stray `)` is the only way to stop early.
        return Err(Error::UnbalancedBracket);
    }
    Ok(ir)
}

/// Compile a regex into an NFA.
///
/// A trailing top-level look-ahead is stripped (its consumption belongs to
/// the matcher); look-aheads anywhere else are rejected.
pub fn compile_regex(pattern: &str) -> Result<FsmWithStartEnd> {
    let ir = parse_regex(pattern)?;
    let body = strip_trailing_lookahead(ir);
    build_fsm(&body)
}

fn strip_trailing_lookahead(ir: RegexIr) -> RegexIr {
    match ir {
        RegexIr::Bracket(mut items) => {
            if matches!(items.last(), Some(RegexIr::LookAhead { .. })) {
                items.pop();
            }
            RegexIr::Bracket(items)
        }
        RegexIr::LookAhead { .. } => RegexIr::Bracket(Vec::new()),
        other => other,
    }
}

struct RegexParser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: u32,
}

impl<'a> RegexParser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn with_depth<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(Error::RecursionLimit {
                limit: MAX_RECURSION_DEPTH,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_union(&mut self) -> Result<RegexIr> {
        self.with_depth(|this| {
            let mut alternatives = vec![this.parse_concat()?];
            while this.peek() == Some(b'|') {
                this.pos += 1;
                alternatives.push(this.parse_concat()?);
            }
            if alternatives.len() == 1 {
                Ok(alternatives.pop().expect("one alternative"))
            } else {
                Ok(RegexIr::Union(alternatives))
            }
        })
    }

    fn parse_concat(&mut self) -> Result<RegexIr> {
        let mut items: Vec<RegexIr> = Vec::new();
        loop {
            let Some(byte) = self.peek() else {
                break;
            };
            match byte {
                b'|' | b')' => break,
                b'*' | b'+' | b'?' => {
                    self.pos += 1;
                    let target = items.pop().ok_or(Error::UnbalancedBracket)?;
                    let op = match byte {
                        b'*' => RegexOp::Star,
                        b'+' => RegexOp::Plus,
                        _ => RegexOp::Question,
                    };
                    items.push(RegexIr::Symbol {
                        op,
                        target: Box::new(target),
                    });
                }
                b'{' => {
                    let (lower, upper) = self.parse_repeat_bounds()?;
                    let target = items.pop().ok_or(Error::UnbalancedBracket)?;
                    items.push(RegexIr::Repeat {
                        target: Box::new(target),
                        lower,
                        upper,
                    });
                }
                b'(' => items.push(self.parse_group()?),
                b'[' => items.push(self.parse_class()?),
                b'.' => {
                    self.pos += 1;
                    items.push(RegexIr::Class {
                        negated: true,
                        ranges: vec![('\n' as Codepoint, '\n' as Codepoint)],
                    });
                }
                _ => {
                    let (cp, len) = decode_utf8_or_escaped(&self.input[self.pos..], &[])
                        .map_err(char_error)?;
                    self.pos += len;
                    items.push(RegexIr::Leaf(cp));
                }
            }
        }
        if items.len() == 1 {
            Ok(items.pop().expect("one item"))
        } else {
            Ok(RegexIr::Bracket(items))
        }
    }

    fn parse_group(&mut self) -> Result<RegexIr> {
        self.pos += 1; // '('
        let lookahead = if self.peek() == Some(b'?') {
            match self.input.get(self.pos + 1) {
                Some(b'=') => {
                    self.pos += 2;
                    Some(true)
                }
                Some(b'!') => {
                    self.pos += 2;
                    Some(false)
                }
                _ => return Err(Error::InvalidEscape),
            }
        } else {
            None
        };
        let inner = self.parse_union()?;
        if self.peek() != Some(b')') {
            return Err(Error::UnbalancedBracket);
        }
        self.pos += 1;
        match lookahead {
            Some(positive) => Ok(RegexIr::LookAhead {
                positive,
                target: Box::new(inner),
            }),
            None => Ok(match inner {
                RegexIr::Bracket(items) => RegexIr::Bracket(items),
                other => RegexIr::Bracket(vec![other]),
            }),
        }
    }

    fn parse_class(&mut self) -> Result<RegexIr> {
        self.pos += 1; // '['
        let negated = if self.peek() == Some(b'^') {
            self.pos += 1;
            true
        } else {
            false
        };
        let extra = [(b'-', '-' as Codepoint), (b']', ']' as Codepoint)];
        let mut ranges: Vec<(Codepoint, Codepoint)> = Vec::new();
        let mut past_single = false;
        let mut past_hyphen = false;
        loop {
            match self.peek() {
                None => return Err(Error::UnbalancedBracket),
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(b'-')
                    if past_single
                        && !past_hyphen
                        && self.input.get(self.pos + 1) != Some(&b']') =>
                {
                    self.pos += 1;
                    past_hyphen = true;
                    past_single = false;
                }
                Some(_) => {
                    let (cp, len) = decode_utf8_or_escaped(&self.input[self.pos..], &extra)
                        .map_err(char_error)?;
                    self.pos += len;
                    if past_hyphen {
                        let last = ranges.last_mut().expect("range lower bound");
                        if last.0 > cp {
                            return Err(Error::InvalidCharClass(format!(
                                "reversed range {}-{}",
                                last.0, cp
                            )));
                        }
                        last.1 = cp;
                        past_hyphen = false;
                    } else {
                        ranges.push((cp, cp));
                        past_single = true;
                    }
                }
            }
        }
        if ranges.is_empty() {
            return Err(Error::InvalidCharClass("empty class".to_string()));
        }
        Ok(RegexIr::Class { negated, ranges })
    }

    fn parse_repeat_bounds(&mut self) -> Result<(u32, i64)> {
        self.pos += 1; // '{'
        let lower = self.parse_integer()?;
        let upper = match self.peek() {
            Some(b',') => {
                self.pos += 1;
                if self.peek() == Some(b'}') {
                    -1
                } else {
                    self.parse_integer()? as i64
                }
            }
            _ => lower as i64,
        };
        if self.peek() != Some(b'}') {
            return Err(Error::UnbalancedBracket);
        }
        self.pos += 1;
        if upper >= 0 && (lower as i64) > upper {
            return Err(Error::BadRepetitionBounds {
                lower: lower as i64,
                upper,
            });
        }
        Ok((lower, upper))
    }

    fn parse_integer(&mut self) -> Result<u32> {
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(byte) = self.peek() {
            if !byte.is_ascii_digit() {
                break;
            }
            value = value * 10 + (byte - b'0') as u64;
            if value > u32::MAX as u64 {
                return Err(Error::BadRepetitionBounds {
                    lower: value as i64,
                    upper: value as i64,
                });
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(Error::UnbalancedBracket);
        }
        Ok(value as u32)
    }
}

fn char_error(err: grammask_core::encoding::CharError) -> Error {
    match err {
        grammask_core::encoding::CharError::InvalidUtf8 => Error::InvalidUtf8,
        grammask_core::encoding::CharError::InvalidEscape => Error::InvalidEscape,
    }
}

/// Lower an IR node to an NFA.
pub fn build_fsm(ir: &RegexIr) -> Result<FsmWithStartEnd> {
    match ir {
        RegexIr::Leaf(cp) => {
            if *cp < 0 || *cp > MAX_CODEPOINT {
                return Err(Error::InvalidUtf8);
            }
            Ok(FsmWithStartEnd::byte_string(
                &grammask_core::encoding::encode_utf8(*cp),
            ))
        }
        RegexIr::Class { negated, ranges } => FsmWithStartEnd::from_char_class(ranges, *negated),
        RegexIr::Bracket(items) => {
            if items.is_empty() {
                return Ok(FsmWithStartEnd::empty_string());
            }
            let parts = items.iter().map(build_fsm).collect::<Result<Vec<_>>>()?;
            Ok(FsmWithStartEnd::concat(parts))
        }
        RegexIr::Symbol { op, target } => {
            let inner = build_fsm(target)?;
            Ok(match op {
                RegexOp::Star => inner.star(),
                RegexOp::Plus => inner.plus(),
                RegexOp::Question => inner.question(),
            })
        }
        RegexIr::Repeat {
            target,
            lower,
            upper,
        } => build_fsm(target)?.repeat(*lower, *upper),
        RegexIr::Union(alternatives) => {
            let parts = alternatives
                .iter()
                .map(build_fsm)
                .collect::<Result<Vec<_>>>()?;
            Ok(FsmWithStartEnd::union(parts))
        }
        RegexIr::LookAhead { .. } => Err(Error::UnbalancedBracket),
    }
}
