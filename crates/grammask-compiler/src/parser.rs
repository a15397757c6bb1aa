//! Two-pass EBNF parser.
//!
//! Pass one scans the token stream for top-level `name ::=` heads and
//! registers every rule name, so bodies can reference rules defined later.
//! Pass two parses each rule body with recursive descent:
//!
//! ```text
//! choices   := sequence ( '|' sequence )*
//! sequence  := quantifier+
//! quantifier:= element ( '*' | '+' | '?' | '{' m ',' n '}' )?
//! element   := '(' choices ')' | '[' class ']' | '"' string '"' | NAME
//! ```
//!
//! Newlines terminate sequences outside parentheses; inside parentheses
//! (and inside a look-ahead assertion) they are trivia. A `|` or a `(=`
//! after a newline continues the previous rule.

use grammask_core::encoding::{decode_utf8_or_escaped, push_utf8, CharError, Codepoint};

use crate::builder::GrammarBuilder;
use crate::grammar::Grammar;
use crate::lexer::{lex, line_col, token_text, Token, TokenKind};
use crate::{Error, Result};

/// Maximum recursion depth of the body parser.
pub const MAX_RECURSION_DEPTH: u32 = 200;

/// Largest accepted repetition bound.
const MAX_INTEGER: i64 = 1_000_000_000;

/// Parse EBNF text into a raw (non-normalized) grammar.
pub fn parse_ebnf(source: &str, root_rule: &str) -> Result<Grammar> {
    let tokens = lex(source);
    let mut parser = EbnfParser {
        source,
        tokens,
        pos: 0,
        builder: GrammarBuilder::new(),
        in_parens: false,
        depth: 0,
    };
    parser.check_garbage()?;
    parser.collect_rule_names()?;
    parser.parse_rules()?;
    let Some(root_id) = parser.builder.rule_id(root_rule) else {
        return Err(Error::Parse {
            line: 1,
            column: 1,
            message: format!("root rule \"{root_rule}\" is not found"),
        });
    };
    Ok(parser.builder.freeze(root_id))
}

struct EbnfParser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    builder: GrammarBuilder,
    in_parens: bool,
    depth: u32,
}

impl<'src> EbnfParser<'src> {
    // ─── Token stream helpers ────────────────────────────────────────────

    fn skip_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            let skippable =
                token.kind.is_trivia() || (self.in_parens && token.kind == TokenKind::Newline);
            if !skippable {
                break;
            }
            self.pos += 1;
        }
    }

    /// Current token kind after trivia, or `None` at end of input.
    fn current(&mut self) -> Option<TokenKind> {
        self.skip_trivia();
        self.tokens.get(self.pos).map(|token| token.kind)
    }

    fn current_token(&mut self) -> Option<Token> {
        self.skip_trivia();
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn at(&mut self, kind: TokenKind) -> bool {
        self.current() == Some(kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Index of the next non-trivia token, also skipping newlines; used to
    /// peek at rule continuations without consuming the newline.
    fn peek_past_newlines(&self) -> Option<TokenKind> {
        let mut pos = self.pos;
        while let Some(token) = self.tokens.get(pos) {
            if token.kind.is_trivia() || token.kind == TokenKind::Newline {
                pos += 1;
            } else {
                return Some(token.kind);
            }
        }
        None
    }

    fn consume_past_newlines(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if token.kind.is_trivia() || token.kind == TokenKind::Newline {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn error_here(&mut self, message: impl Into<String>) -> Error {
        let offset = self
            .current_token()
            .map(|token| token.start)
            .unwrap_or(self.source.len() as u32);
        let (line, column) = line_col(self.source, offset);
        Error::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    fn error_at(&self, token: Token, message: impl Into<String>) -> Error {
        let (line, column) = line_col(self.source, token.start);
        Error::Parse {
            line,
            column,
            message: message.into(),
        }
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

    // ─── Pass zero: reject lexer garbage ─────────────────────────────────

    fn check_garbage(&self) -> Result<()> {
        for token in &self.tokens {
            if token.kind != TokenKind::Garbage {
                continue;
            }
            let text = token_text(self.source, token);
            let (line, column) = line_col(self.source, token.start);
            let message = match text.as_bytes().first() {
                Some(b'"') => "unterminated string literal".to_string(),
                Some(b'[') => "unterminated character class".to_string(),
                Some(&byte) => format!("unexpected character: '{}'", byte as char),
                None => "unexpected character".to_string(),
            };
            return Err(Error::Lex {
                line,
                column,
                message,
            });
        }
        Ok(())
    }

    // ─── Pass one: collect rule names ────────────────────────────────────

    fn collect_rule_names(&mut self) -> Result<()> {
        let mut at_line_start = true;
        let mut index = 0;
        while index < self.tokens.len() {
            let token = self.tokens[index];
            match token.kind {
                TokenKind::Newline => {
                    at_line_start = true;
                    index += 1;
                }
                kind if kind.is_trivia() => {
                    index += 1;
                }
                TokenKind::Ident if at_line_start => {
                    // A rule head is `name ::=` at the start of a line.
                    let mut next = index + 1;
                    while next < self.tokens.len() && self.tokens[next].kind.is_trivia() {
                        next += 1;
                    }
                    if self
                        .tokens
                        .get(next)
                        .map(|t| t.kind == TokenKind::Assign)
                        .unwrap_or(false)
                    {
                        let name = token_text(self.source, &token);
                        if self.builder.rule_id(name).is_some() {
                            return Err(self.error_at(
                                token,
                                format!("rule \"{name}\" is defined multiple times"),
                            ));
                        }
                        self.builder.add_empty_rule(name);
                        index = next + 1;
                    } else {
                        index += 1;
                    }
                    at_line_start = false;
                }
                _ => {
                    at_line_start = false;
                    index += 1;
                }
            }
        }
        Ok(())
    }

    // ─── Pass two: parse rule bodies ─────────────────────────────────────

    fn parse_rules(&mut self) -> Result<()> {
        loop {
            self.consume_past_newlines();
            if self.current().is_none() {
                break;
            }
            self.parse_rule()?;
        }
        Ok(())
    }

    fn parse_rule(&mut self) -> Result<()> {
        let Some(head) = self.current_token() else {
            return Err(self.error_here("expected rule name"));
        };
        if head.kind != TokenKind::Ident {
            return Err(self.error_at(head, "expected rule name"));
        }
        self.bump();
        let name = token_text(self.source, &head).to_string();
        let rule_id = self
            .builder
            .rule_id(&name)
            .ok_or_else(|| self.error_at(head, "rule name must start its own line"))?;

        if !self.eat(TokenKind::Assign) {
            return Err(self.error_here("expected ::="));
        }
        self.consume_past_newlines();

        let body_id = self.parse_choices(&name)?;
        self.builder.update_rule_body(rule_id, body_id);

        // An optional look-ahead assertion, possibly on a continuation
        // line.
        if self.peek_past_newlines() == Some(TokenKind::LookaheadOpen) {
            self.consume_past_newlines();
            let lookahead_id = self.parse_lookahead(&name)?;
            self.builder.set_lookahead(rule_id, lookahead_id);
            if self.peek_past_newlines() == Some(TokenKind::LookaheadOpen) {
                return Err(self.error_here("multiple lookahead assertions"));
            }
        }

        // The rule ends at a newline or end of input.
        match self.current() {
            None => Ok(()),
            Some(TokenKind::Newline) => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.error_here("expected newline after rule")),
        }
    }

    fn parse_lookahead(&mut self, rule_name: &str) -> Result<i32> {
        let open = self.current_token().expect("lookahead open token");
        debug_assert_eq!(open.kind, TokenKind::LookaheadOpen);
        self.bump();
        let saved = self.in_parens;
        self.in_parens = true;
        let result = self.parse_sequence(rule_name)?;
        if !self.eat(TokenKind::ParenClose) {
            return Err(self.error_here("expected ) to close lookahead assertion"));
        }
        self.in_parens = saved;
        Ok(result)
    }

    fn parse_choices(&mut self, rule_name: &str) -> Result<i32> {
        self.with_depth(|this| {
            let mut choices = vec![this.parse_sequence(rule_name)?];
            while this.peek_past_newlines() == Some(TokenKind::Pipe) {
                this.consume_past_newlines();
                this.pos += 1; // '|'
                this.consume_past_newlines();
                choices.push(this.parse_sequence(rule_name)?);
            }
            Ok(this.builder.add_choices(&choices))
        })
    }

    fn parse_sequence(&mut self, rule_name: &str) -> Result<i32> {
        self.with_depth(|this| {
            let mut elements = Vec::new();
            loop {
                elements.push(this.parse_element_with_quantifier(rule_name)?);
                match this.current() {
                    None => break,
                    Some(TokenKind::Pipe)
                    | Some(TokenKind::ParenClose)
                    | Some(TokenKind::Newline)
                    | Some(TokenKind::LookaheadOpen) => break,
                    Some(_) => {}
                }
            }
            Ok(this.builder.add_sequence(&elements))
        })
    }

    fn parse_element_with_quantifier(&mut self, rule_name: &str) -> Result<i32> {
        let element = self.parse_element(rule_name)?;
        match self.current() {
            Some(TokenKind::Star) => {
                self.pos += 1;
                Ok(self.builder.add_star(element))
            }
            Some(TokenKind::Plus) => {
                self.pos += 1;
                Ok(self.builder.add_plus(element))
            }
            Some(TokenKind::Question) => {
                self.pos += 1;
                Ok(self.builder.add_question(element))
            }
            Some(TokenKind::BraceOpen) => {
                let (lower, upper) = self.parse_repetition_range()?;
                Ok(self
                    .builder
                    .add_quantifier_range(element, lower as i32, upper as i32))
            }
            _ => Ok(element),
        }
    }

    fn parse_element(&mut self, rule_name: &str) -> Result<i32> {
        self.with_depth(|this| {
            let Some(token) = this.current_token() else {
                return Err(this.error_here("expected element"));
            };
            match token.kind {
                TokenKind::ParenOpen => {
                    this.bump();
                    let saved = this.in_parens;
                    this.in_parens = true;
                    if this.eat(TokenKind::ParenClose) {
                        this.in_parens = saved;
                        return Ok(this.builder.add_empty_str());
                    }
                    let inner = this.parse_choices(rule_name)?;
                    if !this.eat(TokenKind::ParenClose) {
                        return Err(this.error_here("expected )"));
                    }
                    this.in_parens = saved;
                    Ok(inner)
                }
                TokenKind::CharClass => {
                    this.bump();
                    this.parse_character_class(token)
                }
                TokenKind::StringLiteral => {
                    this.bump();
                    this.parse_string_literal(token)
                }
                TokenKind::Ident => {
                    this.bump();
                    let name = token_text(this.source, &token);
                    match this.builder.rule_id(name) {
                        Some(rule_id) => Ok(this.builder.add_rule_ref(rule_id)),
                        None => {
                            Err(this.error_at(token, format!("rule \"{name}\" is not defined")))
                        }
                    }
                }
                _ => Err(this.error_at(token, "expected element")),
            }
        })
    }

    /// Decode the inside of a `"..."` token into a byte string expression,
    /// or an empty string expression.
    fn parse_string_literal(&mut self, token: Token) -> Result<i32> {
        let text = token_text(self.source, &token);
        let inner = &text.as_bytes()[1..text.len() - 1];
        let mut bytes: Vec<u8> = Vec::with_capacity(inner.len());
        let mut offset = 0;
        while offset < inner.len() {
            let (cp, len) = decode_utf8_or_escaped(&inner[offset..], &[])
                .map_err(|err| self.char_error(err, token, offset + 1))?;
            push_utf8(&mut bytes, cp);
            offset += len;
        }
        if bytes.is_empty() {
            Ok(self.builder.add_empty_str())
        } else {
            Ok(self.builder.add_byte_string(&bytes))
        }
    }

    /// Decode the inside of a `[...]` token into a character class
    /// expression.
    fn parse_character_class(&mut self, token: Token) -> Result<i32> {
        let text = token_text(self.source, &token);
        let mut inner = &text.as_bytes()[1..text.len() - 1];
        let mut base = 1;
        let negated = inner.first() == Some(&b'^');
        if negated {
            inner = &inner[1..];
            base += 1;
        }

        let extra = [(b'-', '-' as Codepoint), (b']', ']' as Codepoint)];
        let mut ranges: Vec<(Codepoint, Codepoint)> = Vec::new();
        let mut past_single = false;
        let mut past_hyphen = false;
        let mut offset = 0;
        while offset < inner.len() {
            if inner[offset] == b'-' && past_single && !past_hyphen && offset + 1 < inner.len() {
                offset += 1;
                past_hyphen = true;
                past_single = false;
                continue;
            }
            let (cp, len) = decode_utf8_or_escaped(&inner[offset..], &extra)
                .map_err(|err| self.char_error(err, token, base + offset))?;
            offset += len;
            if past_hyphen {
                let last = ranges.last_mut().expect("range lower bound");
                if last.0 > cp {
                    let (line, column) = line_col(self.source, token.start);
                    return Err(Error::InvalidCharClass {
                        line,
                        column,
                        message: format!("reversed range {}-{}", last.0, cp),
                    });
                }
                last.1 = cp;
                past_hyphen = false;
            } else {
                ranges.push((cp, cp));
                past_single = true;
            }
        }
        if ranges.is_empty() {
            let (line, column) = line_col(self.source, token.start);
            return Err(Error::InvalidCharClass {
                line,
                column,
                message: "empty class".to_string(),
            });
        }
        Ok(self.builder.add_character_class(&ranges, negated))
    }

    fn char_error(&self, err: CharError, token: Token, offset_in_token: usize) -> Error {
        let (line, column) = line_col(self.source, token.start + offset_in_token as u32);
        match err {
            CharError::InvalidUtf8 => Error::InvalidUtf8 { line, column },
            CharError::InvalidEscape => Error::InvalidEscape { line, column },
        }
    }

    /// `{m}`, `{m,}`, or `{m,n}`.
    fn parse_repetition_range(&mut self) -> Result<(i64, i64)> {
        let open = self.current_token().expect("brace open token");
        self.bump(); // '{'
        let lower = self.parse_integer()?;
        let result = if self.eat(TokenKind::Comma) {
            if self.at(TokenKind::BraceClose) {
                (lower, -1)
            } else {
                let upper = self.parse_integer()?;
                if upper < lower {
                    let (line, column) = line_col(self.source, open.start);
                    return Err(Error::BadRepetitionBounds {
                        line,
                        column,
                        lower,
                        upper,
                    });
                }
                (lower, upper)
            }
        } else {
            (lower, lower)
        };
        if !self.eat(TokenKind::BraceClose) {
            return Err(self.error_here("expected ',' or '}' in repetition range"));
        }
        Ok(result)
    }

    fn parse_integer(&mut self) -> Result<i64> {
        let Some(token) = self.current_token() else {
            return Err(self.error_here("expected integer"));
        };
        if token.kind != TokenKind::Integer {
            return Err(self.error_at(token, "expected integer"));
        }
        self.bump();
        let text = token_text(self.source, &token);
        let mut value: i64 = 0;
        for byte in text.bytes() {
            value = value * 10 + (byte - b'0') as i64;
            if value > MAX_INTEGER {
                return Err(self.error_at(
                    token,
                    format!("integer is too large, max allowed is {MAX_INTEGER}"),
                ));
            }
        }
        Ok(value)
    }
}
