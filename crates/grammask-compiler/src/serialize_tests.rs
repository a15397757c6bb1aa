use indoc::indoc;

use crate::grammar::Grammar;
use crate::Error;

const SOURCE: &str = indoc! {r#"
    root ::= "a" value | ""
    value ::= [0-9]+ (= "!")
"#};

#[test]
fn json_round_trip_is_exact() {
    let grammar = Grammar::from_ebnf(SOURCE, "root").unwrap();
    let dump = grammar.to_json().unwrap();
    let reloaded = Grammar::from_json(&dump).unwrap();

    assert_eq!(grammar.rule_count(), reloaded.rule_count());
    assert_eq!(grammar.root_rule_id(), reloaded.root_rule_id());
    for index in 0..grammar.rule_count() as i32 {
        assert_eq!(grammar.rule(index), reloaded.rule(index));
    }
    assert_eq!(
        grammar.expr_data().data(),
        reloaded.expr_data().data()
    );
    assert_eq!(
        grammar.expr_data().indptr(),
        reloaded.expr_data().indptr()
    );
    // The reloaded grammar prints identically.
    assert_eq!(grammar.to_string(), reloaded.to_string());
}

#[test]
fn dump_has_documented_keys() {
    let grammar = Grammar::from_ebnf(SOURCE, "root").unwrap();
    let dump = grammar.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&dump).unwrap();
    assert!(value.get("rules").is_some());
    assert!(value.get("grammar_expr_data").is_some());
    assert!(value["grammar_expr_data"].get("data").is_some());
    assert!(value["grammar_expr_data"].get("indptr").is_some());
    assert!(value.get("root_rule_id").is_some());
    assert_eq!(value["rules"][0]["name"], "root");
}

#[test]
fn reload_rejects_bad_tags() {
    let text = r#"{
        "rules": [{"name": "root", "body_expr_id": 0}],
        "grammar_expr_data": {"data": [99], "indptr": [0, 1]},
        "root_rule_id": 0
    }"#;
    let err = Grammar::from_json(text).unwrap_err();
    assert!(matches!(err, Error::Serialize(_)));
}

#[test]
fn reload_rejects_malformed_csr() {
    let text = r#"{
        "rules": [{"name": "root", "body_expr_id": 0}],
        "grammar_expr_data": {"data": [3], "indptr": [0, 2]},
        "root_rule_id": 0
    }"#;
    let err = Grammar::from_json(text).unwrap_err();
    assert!(matches!(err, Error::Serialize(_)));
}

#[test]
fn reload_rejects_out_of_range_ids() {
    let text = r#"{
        "rules": [{"name": "root", "body_expr_id": 5}],
        "grammar_expr_data": {"data": [3], "indptr": [0, 1]},
        "root_rule_id": 0
    }"#;
    assert!(Grammar::from_json(text).is_err());

    let text = r#"{
        "rules": [{"name": "root", "body_expr_id": 0}],
        "grammar_expr_data": {"data": [3], "indptr": [0, 1]},
        "root_rule_id": 7
    }"#;
    assert!(Grammar::from_json(text).is_err());
}

#[test]
fn lookahead_defaults_to_absent() {
    let text = r#"{
        "rules": [{"name": "root", "body_expr_id": 0}],
        "grammar_expr_data": {"data": [3], "indptr": [0, 1]},
        "root_rule_id": 0
    }"#;
    let grammar = Grammar::from_json(text).unwrap();
    assert_eq!(grammar.rule(0).lookahead_id, -1);
}
