use crate::grammar::Grammar;
use crate::invariants::check_canonical;
use crate::json::{json_grammar, JSON_GRAMMAR};
use crate::testing::accepts;

#[test]
fn builtin_compiles_and_is_canonical() {
    let grammar = json_grammar();
    assert!(grammar.rule_count() > 10);
    assert_eq!(grammar.rule(grammar.root_rule_id()).name, "root");
    check_canonical(grammar).unwrap();
}

#[test]
fn accepts_valid_json() {
    let grammar = json_grammar();
    for input in [
        "{}",
        "[]",
        "[1,2,3]",
        r#"{"a":null}"#,
        r#"{"a": [1, 2], "b": {"c": "d"}}"#,
        "-12.5e3",
        "true",
        "false",
        "null",
        r#""escaped \" quote""#,
        r#""©""#,
        "  [ true , false ]  ",
    ] {
        assert!(accepts(grammar, input), "should accept {input:?}");
    }
}

#[test]
fn rejects_invalid_json() {
    let grammar = json_grammar();
    for input in [
        "{,}",
        "[1,]",
        "\"unterminated",
        "01",
        "tru",
        "[1 2]",
        "{\"a\" 1}",
        "+1",
        "",
    ] {
        assert!(!accepts(grammar, input), "should reject {input:?}");
    }
}

#[test]
fn round_trips_through_json_dump() {
    let grammar = json_grammar();
    let dump = grammar.to_json().unwrap();
    let reloaded = Grammar::from_json(&dump).unwrap();
    for input in ["{}", "[1,2,3]", r#"{"a":null}"#] {
        assert!(accepts(&reloaded, input), "should accept {input:?}");
    }
    for input in ["{,}", "[1,]", "\"unterminated"] {
        assert!(!accepts(&reloaded, input), "should reject {input:?}");
    }
}

#[test]
fn round_trips_through_ebnf_print() {
    let grammar = json_grammar();
    let printed = grammar.to_string();
    let reparsed = Grammar::from_ebnf(&printed, "root").unwrap();
    for input in ["{}", r#"{"a":[null,true]}"#] {
        assert!(accepts(&reparsed, input), "should accept {input:?}");
    }
    assert!(!accepts(&reparsed, "{,}"));
}

#[test]
fn grammar_text_is_stable() {
    // The constant itself round-trips through parse + print + parse.
    let first = Grammar::from_ebnf(JSON_GRAMMAR, "root").unwrap();
    let second = Grammar::from_ebnf(&first.to_string(), "root").unwrap();
    assert_eq!(first.to_string(), second.to_string());
}
