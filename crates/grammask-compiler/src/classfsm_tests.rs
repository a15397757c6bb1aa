use indoc::indoc;

use crate::classfsm::ClassFsmTable;
use crate::grammar::{ExprType, Grammar};

#[test]
fn builds_machines_for_classes_and_starred_classes() {
    let grammar = Grammar::from_ebnf(
        indoc! {r#"
            root ::= ws word ws
            word ::= [a-z]+
            ws ::= [ \t]*
        "#},
        "root",
    )
    .unwrap();
    let table = ClassFsmTable::build(&grammar).unwrap();
    assert!(!table.is_empty());

    // Every class expression has a machine; non-class expressions do not.
    for expr_id in 0..grammar.expr_count() as i32 {
        let is_class = matches!(
            grammar.expr(expr_id).ty,
            ExprType::CharacterClass | ExprType::CharacterClassStar
        );
        assert_eq!(table.get(expr_id).is_some(), is_class, "expr {expr_id}");
    }
}

#[test]
fn class_machine_accepts_class_members() {
    let grammar = Grammar::from_ebnf("root ::= [a-z]", "root").unwrap();
    let table = ClassFsmTable::build(&grammar).unwrap();
    let expr_id = (0..grammar.expr_count() as i32)
        .find(|&id| grammar.expr(id).ty == ExprType::CharacterClass)
        .unwrap();
    let machine = table.get(expr_id).unwrap();

    assert!(machine.is_dfa());
    assert!(machine.accepts_bytes(b"q"));
    assert!(!machine.accepts_bytes(b"Q"));
    assert!(!machine.accepts_bytes(b"qq"));
}

#[test]
fn starred_class_machine_loops() {
    let grammar = Grammar::from_ebnf("root ::= [ab]*", "root").unwrap();
    let table = ClassFsmTable::build(&grammar).unwrap();
    let expr_id = (0..grammar.expr_count() as i32)
        .find(|&id| grammar.expr(id).ty == ExprType::CharacterClassStar)
        .unwrap();
    let machine = table.get(expr_id).unwrap();

    assert!(machine.accepts_bytes(b""));
    assert!(machine.accepts_bytes(b"abba"));
    assert!(!machine.accepts_bytes(b"abc"));
    // A starred single-byte class minimizes to one looping state.
    assert_eq!(machine.num_states(), 1);
}

#[test]
fn identical_classes_share_one_machine() {
    let grammar = Grammar::from_ebnf(
        indoc! {r#"
            root ::= a b
            a ::= [0-9] x
            b ::= [0-9] y
            x ::= [0-9a-f]
            y ::= "!"
        "#},
        "root",
    )
    .unwrap();
    let table = ClassFsmTable::build(&grammar).unwrap();
    // Three class expressions, two distinct payloads.
    assert_eq!(table.len(), 3);
    assert_eq!(table.distinct_machines(), 2);
}

#[test]
fn multibyte_class_machine_matches_utf8() {
    let grammar = Grammar::from_ebnf("root ::= [α-ω]", "root").unwrap();
    let table = ClassFsmTable::build(&grammar).unwrap();
    let expr_id = (0..grammar.expr_count() as i32)
        .find(|&id| grammar.expr(id).ty == ExprType::CharacterClass)
        .unwrap();
    let machine = table.get(expr_id).unwrap();

    assert!(machine.accepts_bytes("β".as_bytes()));
    assert!(!machine.accepts_bytes(b"b"));
    assert!(!machine.accepts_bytes("Δ".as_bytes()));
}
