//! Canonical-AST invariant checks.
//!
//! Violations here are bugs in the normalizer, not user errors, so the
//! checks are debug assertions rather than `Result`s.

use crate::grammar::{ExprType, Grammar};

/// Whether an expression may appear as a sequence element after
/// normalization.
fn is_atomic(grammar: &Grammar, expr_id: i32) -> bool {
    matches!(
        grammar.expr(expr_id).ty,
        ExprType::ByteString
            | ExprType::CharacterClass
            | ExprType::CharacterClassStar
            | ExprType::RuleRef
    )
}

/// Check every canonical-AST invariant; returns the first violation as a
/// message, for assertion output.
pub fn check_canonical(grammar: &Grammar) -> Result<(), String> {
    let expr_count = grammar.expr_count() as i32;
    let rule_count = grammar.rule_count() as i32;

    for rule_id in 0..rule_count {
        let rule = grammar.rule(rule_id);
        if rule.body_expr_id < 0 || rule.body_expr_id >= expr_count {
            return Err(format!("rule {:?} has a dangling body id", rule.name));
        }
        let body = grammar.expr(rule.body_expr_id);
        if body.ty != ExprType::Choices {
            return Err(format!("rule {:?} body is not a Choices", rule.name));
        }
        for (index, &choice_id) in body.data.iter().enumerate() {
            if choice_id < 0 || choice_id >= expr_count {
                return Err(format!("rule {:?} has a dangling choice id", rule.name));
            }
            let choice = grammar.expr(choice_id);
            match choice.ty {
                ExprType::EmptyStr if index == 0 => continue,
                ExprType::Sequence => {}
                _ => {
                    return Err(format!(
                        "rule {:?} choice {index} is neither a leading EmptyStr nor a Sequence",
                        rule.name
                    ));
                }
            }
            if choice.data.is_empty() {
                return Err(format!("rule {:?} has an empty sequence", rule.name));
            }
            for &element_id in choice.data {
                if element_id < 0 || element_id >= expr_count {
                    return Err(format!("rule {:?} has a dangling element id", rule.name));
                }
                if !is_atomic(grammar, element_id) {
                    return Err(format!(
                        "rule {:?} sequence element is not atomic",
                        rule.name
                    ));
                }
                if grammar.expr(element_id).ty == ExprType::RuleRef {
                    let target = grammar.expr(element_id).data[0];
                    if target < 0 || target >= rule_count {
                        return Err(format!(
                            "rule {:?} references out-of-range rule {target}",
                            rule.name
                        ));
                    }
                }
            }
        }
        if rule.lookahead_id >= 0 {
            if rule.lookahead_id >= expr_count {
                return Err(format!("rule {:?} has a dangling lookahead id", rule.name));
            }
            if grammar.expr(rule.lookahead_id).ty != ExprType::Sequence {
                return Err(format!(
                    "rule {:?} lookahead is not a Sequence",
                    rule.name
                ));
            }
        }
    }

    // Character class payloads are ordered pairs.
    for expr_id in 0..expr_count {
        let expr = grammar.expr(expr_id);
        if matches!(
            expr.ty,
            ExprType::CharacterClass | ExprType::CharacterClassStar
        ) {
            let (_, ranges) = expr.class_parts();
            if ranges.iter().any(|&(lo, hi)| lo > hi) {
                return Err(format!("expression {expr_id} has a reversed class range"));
            }
        }
    }

    if grammar.root_rule_id() < 0 || grammar.root_rule_id() >= rule_count {
        return Err("root rule id out of range".to_string());
    }
    Ok(())
}

/// Debug-only assertion wrapper around [`check_canonical`].
pub fn debug_assert_canonical(grammar: &Grammar) {
    if cfg!(debug_assertions) {
        if let Err(message) = check_canonical(grammar) {
            panic!("canonical grammar invariant violated: {message}");
        }
    }
}
