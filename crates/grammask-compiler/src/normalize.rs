//! Normalization passes.
//!
//! Three rewrites run in order, each producing a fresh grammar:
//!
//! 1. **Single-element elimination**: `Choices([e])` and `Sequence([e])`
//!    collapse to `e`; a non-negated single-codepoint class becomes a byte
//!    string. The look-ahead position keeps its `Sequence` wrapper.
//! 2. **Quantifier materialization**: `a*`, `a+`, `a?`, and `a{m,n}`
//!    rewrite into fresh right-recursive rules; a starred character class
//!    stays atomic as `CharacterClassStar`.
//! 3. **Nested-rule unwrapping**: every rule body becomes a `Choices` of
//!    `Sequence`s, with an `EmptyStr` hoisted first when the rule can be
//!    empty, and multi-alternative choices nested in sequences extracted
//!    into fresh `<rule>_choice_<k>` rules.
//!
//! After the pipeline every rule body satisfies the canonical-AST
//! invariants.

use grammask_core::encoding::push_utf8;

use crate::builder::GrammarBuilder;
use crate::grammar::{ExprType, Grammar};
use crate::invariants::debug_assert_canonical;
use crate::{Error, Result};

/// Depth guard for expression rewriting.
const MAX_RECURSION_DEPTH: u32 = 200;

/// Run the full pipeline.
pub fn normalize(grammar: &Grammar) -> Result<Grammar> {
    let grammar = SingleElementEliminator::apply(grammar)?;
    let grammar = QuantifierMaterializer::apply(&grammar)?;
    let grammar = NestedRuleUnwrapper::apply(&grammar)?;
    debug_assert_canonical(&grammar);
    Ok(grammar)
}

/// Shared pass state: old grammar, new builder, depth counter.
struct PassState<'g> {
    grammar: &'g Grammar,
    builder: GrammarBuilder,
    depth: u32,
}

impl<'g> PassState<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let mut builder = GrammarBuilder::new();
        for index in 0..grammar.rule_count() {
            builder.add_empty_rule(&grammar.rule(index as i32).name);
        }
        Self {
            grammar,
            builder,
            depth: 0,
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

    fn copy_expr(&mut self, expr_id: i32) -> i32 {
        self.builder.add_expr_from(self.grammar.expr(expr_id))
    }
}

// ─── Pass 1: single-element elimination ─────────────────────────────────

struct SingleElementEliminator;

impl SingleElementEliminator {
    fn apply(grammar: &Grammar) -> Result<Grammar> {
        let mut state = PassState::new(grammar);
        for index in 0..grammar.rule_count() {
            let rule = grammar.rule(index as i32);
            let body = Self::visit(&mut state, rule.body_expr_id)?;
            state.builder.update_rule_body(index as i32, body);
            if rule.lookahead_id >= 0 {
                let lookahead = Self::visit_lookahead(&mut state, rule.lookahead_id)?;
                state.builder.set_lookahead(index as i32, lookahead);
            }
        }
        Ok(state.builder.freeze(grammar.root_rule_id()))
    }

    /// The look-ahead must stay a `Sequence`, so the wrapper survives even
    /// with a single child.
    fn visit_lookahead(state: &mut PassState<'_>, expr_id: i32) -> Result<i32> {
        let expr = state.grammar.expr(expr_id);
        debug_assert_eq!(expr.ty, ExprType::Sequence);
        let children = expr.data.to_vec();
        let mut new_children = Vec::with_capacity(children.len());
        for child in children {
            new_children.push(Self::visit(state, child)?);
        }
        Ok(state.builder.add_sequence(&new_children))
    }

    fn visit(state: &mut PassState<'_>, expr_id: i32) -> Result<i32> {
        state.with_depth(|state| {
            let expr = state.grammar.expr(expr_id);
            match expr.ty {
                ExprType::Sequence | ExprType::Choices => {
                    let ty = expr.ty;
                    let children = expr.data.to_vec();
                    let mut new_children = Vec::with_capacity(children.len());
                    for child in children {
                        new_children.push(Self::visit(state, child)?);
                    }
                    if new_children.len() == 1 {
                        return Ok(new_children[0]);
                    }
                    Ok(match ty {
                        ExprType::Sequence => state.builder.add_sequence(&new_children),
                        _ => state.builder.add_choices(&new_children),
                    })
                }
                ExprType::CharacterClass => {
                    let (negated, ranges) = expr.class_parts();
                    if !negated && ranges.len() == 1 && ranges[0].0 == ranges[0].1 {
                        let mut bytes = Vec::new();
                        push_utf8(&mut bytes, ranges[0].0);
                        return Ok(state.builder.add_byte_string(&bytes));
                    }
                    Ok(state.copy_expr(expr_id))
                }
                ExprType::Star | ExprType::Plus | ExprType::Question => {
                    let ty = expr.ty;
                    let inner = Self::visit(state, expr.data[0])?;
                    Ok(match ty {
                        ExprType::Star => state.builder.add_star(inner),
                        ExprType::Plus => state.builder.add_plus(inner),
                        _ => state.builder.add_question(inner),
                    })
                }
                ExprType::QuantifierRange => {
                    let (lower, upper) = (expr.data[1], expr.data[2]);
                    let inner = Self::visit(state, expr.data[0])?;
                    Ok(state.builder.add_quantifier_range(inner, lower, upper))
                }
                _ => Ok(state.copy_expr(expr_id)),
            }
        })
    }
}

// ─── Pass 2: quantifier materialization ─────────────────────────────────

struct QuantifierMaterializer;

impl QuantifierMaterializer {
    fn apply(grammar: &Grammar) -> Result<Grammar> {
        let mut state = PassState::new(grammar);
        for index in 0..grammar.rule_count() {
            let rule = grammar.rule(index as i32);
            let rule_name = rule.name.clone();
            let body = Self::visit(&mut state, rule.body_expr_id, &rule_name)?;
            state.builder.update_rule_body(index as i32, body);
            if rule.lookahead_id >= 0 {
                let lookahead = Self::visit(&mut state, rule.lookahead_id, &rule_name)?;
                state.builder.set_lookahead(index as i32, lookahead);
            }
        }
        Ok(state.builder.freeze(grammar.root_rule_id()))
    }

    fn visit(state: &mut PassState<'_>, expr_id: i32, rule_name: &str) -> Result<i32> {
        state.with_depth(|state| {
            let expr = state.grammar.expr(expr_id);
            match expr.ty {
                ExprType::Sequence | ExprType::Choices => {
                    let ty = expr.ty;
                    let children = expr.data.to_vec();
                    let mut new_children = Vec::with_capacity(children.len());
                    for child in children {
                        new_children.push(Self::visit(state, child, rule_name)?);
                    }
                    Ok(match ty {
                        ExprType::Sequence => state.builder.add_sequence(&new_children),
                        _ => state.builder.add_choices(&new_children),
                    })
                }
                ExprType::Star => {
                    let inner = Self::visit(state, expr.data[0], rule_name)?;
                    Ok(Self::materialize_star(state, inner, rule_name))
                }
                ExprType::Plus => {
                    let inner = Self::visit(state, expr.data[0], rule_name)?;
                    Ok(Self::materialize_plus(state, inner, rule_name))
                }
                ExprType::Question => {
                    let inner = Self::visit(state, expr.data[0], rule_name)?;
                    Ok(Self::materialize_question(state, inner, rule_name))
                }
                ExprType::QuantifierRange => {
                    let (lower, upper) = (expr.data[1], expr.data[2]);
                    let inner = Self::visit(state, expr.data[0], rule_name)?;
                    Ok(Self::materialize_range(state, inner, lower, upper, rule_name))
                }
                _ => Ok(state.copy_expr(expr_id)),
            }
        })
    }

    /// `a*` with a class operand stays atomic; anything else becomes
    /// `R ::= "" | a R`.
    fn materialize_star(state: &mut PassState<'_>, inner: i32, rule_name: &str) -> i32 {
        let inner_expr = state.builder.expr(inner);
        if inner_expr.ty == ExprType::CharacterClass {
            let (negated, ranges) = inner_expr.class_parts();
            return state.builder.add_character_class_star(&ranges, negated);
        }
        let builder = &mut state.builder;
        let empty = builder.add_empty_str();
        let rule_id = builder.add_rule_with_hint(&format!("{rule_name}_star"), -1);
        let self_ref = builder.add_rule_ref(rule_id);
        let seq = builder.add_sequence(&[inner, self_ref]);
        let body = builder.add_choices(&[empty, seq]);
        builder.update_rule_body(rule_id, body);
        builder.add_rule_ref(rule_id)
    }

    /// `a+` becomes `R ::= a R | a`.
    fn materialize_plus(state: &mut PassState<'_>, inner: i32, rule_name: &str) -> i32 {
        let builder = &mut state.builder;
        let rule_id = builder.add_rule_with_hint(&format!("{rule_name}_plus"), -1);
        let self_ref = builder.add_rule_ref(rule_id);
        let seq = builder.add_sequence(&[inner, self_ref]);
        let body = builder.add_choices(&[seq, inner]);
        builder.update_rule_body(rule_id, body);
        builder.add_rule_ref(rule_id)
    }

    /// `a?` becomes `R ::= "" | a`.
    fn materialize_question(state: &mut PassState<'_>, inner: i32, rule_name: &str) -> i32 {
        let builder = &mut state.builder;
        let empty = builder.add_empty_str();
        let body = builder.add_choices(&[empty, inner]);
        let rule_id = builder.add_rule_with_hint(&format!("{rule_name}_opt"), body);
        builder.add_rule_ref(rule_id)
    }

    /// `a{m,n}`: `m` copies in sequence, then a right-recursive tail for
    /// the unbounded case or a chain of optional rest rules.
    fn materialize_range(
        state: &mut PassState<'_>,
        inner: i32,
        lower: i32,
        upper: i32,
        rule_name: &str,
    ) -> i32 {
        let builder = &mut state.builder;
        let mut elements = vec![inner; lower as usize];

        if upper == lower {
            return builder.add_sequence(&elements);
        }

        if upper < 0 {
            // Unbounded tail: rest ::= "" | a rest
            let rule_id = builder.add_rule_with_hint(&format!("{rule_name}_rep"), -1);
            let empty = builder.add_empty_str();
            let self_ref = builder.add_rule_ref(rule_id);
            let seq = builder.add_sequence(&[inner, self_ref]);
            let body = builder.add_choices(&[empty, seq]);
            builder.update_rule_body(rule_id, body);
            elements.push(builder.add_rule_ref(rule_id));
            return builder.add_sequence(&elements);
        }

        // rest_1 ::= "" | a rest_2, ..., rest_(n-m) ::= "" | a
        let extra = (upper - lower) as usize;
        let mut rest_ids = Vec::with_capacity(extra);
        for _ in 0..extra {
            rest_ids.push(builder.add_rule_with_hint(&format!("{rule_name}_rep"), -1));
        }
        for index in 0..extra.saturating_sub(1) {
            let next_ref = builder.add_rule_ref(rest_ids[index + 1]);
            let empty = builder.add_empty_str();
            let seq = builder.add_sequence(&[inner, next_ref]);
            let body = builder.add_choices(&[empty, seq]);
            builder.update_rule_body(rest_ids[index], body);
        }
        let empty = builder.add_empty_str();
        let last_body = builder.add_choices(&[empty, inner]);
        builder.update_rule_body(*rest_ids.last().expect("extra > 0"), last_body);

        elements.push(builder.add_rule_ref(rest_ids[0]));
        builder.add_sequence(&elements)
    }
}

// ─── Pass 3: nested-rule unwrapping ─────────────────────────────────────

struct NestedRuleUnwrapper;

impl NestedRuleUnwrapper {
    fn apply(grammar: &Grammar) -> Result<Grammar> {
        let mut state = PassState::new(grammar);
        for index in 0..grammar.rule_count() {
            let rule = grammar.rule(index as i32);
            let rule_name = rule.name.clone();
            let body = Self::visit_rule_body(&mut state, rule.body_expr_id, &rule_name)?;
            state.builder.update_rule_body(index as i32, body);
            if rule.lookahead_id >= 0 {
                let children =
                    Self::visit_sequence(&mut state, rule.lookahead_id, &rule_name)?;
                let lookahead = state.builder.add_sequence(&children);
                state.builder.set_lookahead(index as i32, lookahead);
            }
        }
        Ok(state.builder.freeze(grammar.root_rule_id()))
    }

    fn visit_rule_body(state: &mut PassState<'_>, expr_id: i32, rule_name: &str) -> Result<i32> {
        let expr = state.grammar.expr(expr_id);
        match expr.ty {
            ExprType::Sequence => {
                let children = Self::visit_sequence(state, expr_id, rule_name)?;
                if children.is_empty() {
                    let empty = state.builder.add_empty_str();
                    return Ok(state.builder.add_choices(&[empty]));
                }
                let seq = state.builder.add_sequence(&children);
                Ok(state.builder.add_choices(&[seq]))
            }
            ExprType::Choices => {
                let choices = Self::visit_choices(state, expr_id, rule_name)?;
                Ok(state.builder.add_choices(&choices))
            }
            ExprType::EmptyStr => {
                let empty = state.builder.add_empty_str();
                Ok(state.builder.add_choices(&[empty]))
            }
            _ => {
                let element = state.copy_expr(expr_id);
                let seq = state.builder.add_sequence(&[element]);
                Ok(state.builder.add_choices(&[seq]))
            }
        }
    }

    /// Flatten a `Choices` into a list of sequence ids, with an `EmptyStr`
    /// hoisted to the front when any alternative is empty.
    fn visit_choices(
        state: &mut PassState<'_>,
        expr_id: i32,
        rule_name: &str,
    ) -> Result<Vec<i32>> {
        state.with_depth(|state| {
            let children = state.grammar.expr(expr_id).data.to_vec();
            let mut new_choices = Vec::new();
            let mut found_empty = false;
            for child in children {
                match state.grammar.expr(child).ty {
                    ExprType::Sequence => {
                        let elements = Self::visit_sequence(state, child, rule_name)?;
                        if elements.is_empty() {
                            found_empty = true;
                        } else {
                            new_choices.push(state.builder.add_sequence(&elements));
                        }
                    }
                    ExprType::Choices => {
                        let nested = Self::visit_choices(state, child, rule_name)?;
                        // A leading EmptyStr marks a nullable nested
                        // choice; hoist it into this level.
                        let mut rest = nested.as_slice();
                        if let Some(&first) = nested.first() {
                            if state.builder.expr(first).ty == ExprType::EmptyStr {
                                found_empty = true;
                                rest = &nested[1..];
                            }
                        }
                        new_choices.extend_from_slice(rest);
                    }
                    ExprType::EmptyStr => found_empty = true,
                    _ => {
                        let element = state.copy_expr(child);
                        new_choices.push(state.builder.add_sequence(&[element]));
                    }
                }
            }
            if found_empty {
                let empty = state.builder.add_empty_str();
                new_choices.insert(0, empty);
            }
            Ok(new_choices)
        })
    }

    /// Flatten a `Sequence` into atomic element ids; nested sequences
    /// splice in, single-alternative nested choices inline, and
    /// multi-alternative nested choices extract into a fresh rule.
    fn visit_sequence(
        state: &mut PassState<'_>,
        expr_id: i32,
        rule_name: &str,
    ) -> Result<Vec<i32>> {
        state.with_depth(|state| {
            let children = state.grammar.expr(expr_id).data.to_vec();
            let mut elements = Vec::new();
            for child in children {
                match state.grammar.expr(child).ty {
                    ExprType::Sequence => {
                        elements.extend(Self::visit_sequence(state, child, rule_name)?);
                    }
                    ExprType::Choices => {
                        let choices = Self::visit_choices(state, child, rule_name)?;
                        if choices.len() == 1 {
                            let only = state.builder.expr(choices[0]);
                            if only.ty != ExprType::EmptyStr {
                                let inner = only.data.to_vec();
                                elements.extend(inner);
                            }
                        } else {
                            let nested = state.builder.add_choices(&choices);
                            let rule_id = state
                                .builder
                                .add_rule_with_hint(&format!("{rule_name}_choice"), nested);
                            elements.push(state.builder.add_rule_ref(rule_id));
                        }
                    }
                    ExprType::EmptyStr => {}
                    _ => elements.push(state.copy_expr(child)),
                }
            }
            Ok(elements)
        })
    }
}
