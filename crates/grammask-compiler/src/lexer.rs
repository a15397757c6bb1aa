//! Lexer for the EBNF dialect.
//!
//! Produces span-based tokens without storing text; text is sliced from the
//! source when needed. Consecutive unrecognized characters coalesce into
//! single `Garbage` tokens so malformed input stays manageable.

use logos::Logos;

/// Token kinds. String literals and character classes lex as single tokens
/// whose escapes are decoded later by the parser.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[token("::=")]
    Assign,

    /// `(=` opening a look-ahead assertion.
    #[token("(=")]
    LookaheadOpen,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token("|")]
    Pipe,

    #[token(",")]
    Comma,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("?")]
    Question,

    #[token("=")]
    Equals,

    #[regex(r#""(?:[^"\\\n\r]|\\.)*""#)]
    StringLiteral,

    #[regex(r"\[\^?(?:[^\]\\\n\r]|\\.)*\]")]
    CharClass,

    /// Rule names: letters, digits, `_`, `-`, `.`; no leading digit.
    #[regex(r"[a-zA-Z_.\-][a-zA-Z0-9_.\-]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[ \t]+")]
    Whitespace,

    /// Newlines terminate rules outside parentheses, so they are not
    /// trivia.
    #[regex(r"\r\n|\n|\r")]
    Newline,

    #[regex(r"#[^\n\r]*")]
    Comment,

    /// Coalesced unrecognized characters.
    Garbage,
}

impl TokenKind {
    /// Trivia is skippable everywhere; newlines are significant.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// Zero-copy token: kind plus byte span into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub end: u32,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            start: start as u32,
            end: end as u32,
        }
    }
}

/// Tokenize the source, coalescing lexer errors into `Garbage` tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut garbage_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = garbage_start.take() {
                    tokens.push(Token::new(TokenKind::Garbage, start, lexer.span().start));
                }
                let span = lexer.span();
                tokens.push(Token::new(kind, span.start, span.end));
            }
            Some(Err(())) => {
                if garbage_start.is_none() {
                    garbage_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = garbage_start.take() {
                    tokens.push(Token::new(TokenKind::Garbage, start, source.len()));
                }
                break;
            }
        }
    }

    tokens
}

/// The text slice of a token. O(1).
pub fn token_text<'src>(source: &'src str, token: &Token) -> &'src str {
    &source[token.start as usize..token.end as usize]
}

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: u32) -> (u32, u32) {
    let offset = (offset as usize).min(source.len());
    let mut line = 1;
    let mut col = 1;
    for byte in source.as_bytes()[..offset].iter() {
        if *byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
