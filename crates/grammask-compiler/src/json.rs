//! Built-in JSON grammar.

use std::sync::OnceLock;

use crate::grammar::Grammar;

/// A canonical JSON grammar in the EBNF dialect.
pub const JSON_GRAMMAR: &str = r#"root ::= ws value ws
value ::= object | array | string | number | boolean | null
object ::= "{" ws (member (ws "," ws member)*)? ws "}"
member ::= string ws ":" ws value
array ::= "[" ws (value (ws "," ws value)*)? ws "]"
string ::= "\"" char* "\""
char ::= [^"\\\x00-\x1f] | "\\" escape
escape ::= ["\\/bfnrt] | "u" hex hex hex hex
hex ::= [0-9a-fA-F]
number ::= "-"? int frac? exp?
int ::= "0" | [1-9] [0-9]*
frac ::= "." [0-9]+
exp ::= [eE] [+\-]? [0-9]+
boolean ::= "true" | "false"
null ::= "null"
ws ::= [ \n\t\r]*
"#;

/// The compiled built-in JSON grammar, normalized, compiled lazily on
/// first use.
pub fn json_grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Grammar::from_ebnf(JSON_GRAMMAR, "root").expect("built-in JSON grammar must compile")
    })
}
