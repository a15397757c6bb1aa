//! Grammar builder.
//!
//! The only way to obtain a [`Grammar`] is through `freeze()`, which
//! consumes the builder. Rules are registered first (possibly with empty
//! bodies) so references can resolve during parsing; bodies are filled in
//! afterwards.

use grammask_core::csr::CsrBuilder;
use indexmap::IndexMap;

use crate::grammar::{ExprRef, ExprType, Grammar, Rule};

/// Mutable builder for the CSR-backed grammar AST.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    exprs: CsrBuilder<i32>,
    rules: Vec<Rule>,
    rule_ids: IndexMap<String, i32>,
    /// Counters per fresh-name hint, so generated names are stable.
    hint_counters: IndexMap<String, u32>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Expressions ─────────────────────────────────────────────────────

    fn add_row(&mut self, ty: ExprType, payload: impl IntoIterator<Item = i32>) -> i32 {
        let row = std::iter::once(ty as i32).chain(payload);
        self.exprs.push_row(row) as i32
    }

    pub fn add_byte_string(&mut self, bytes: &[u8]) -> i32 {
        self.add_row(ExprType::ByteString, bytes.iter().map(|&b| b as i32))
    }

    pub fn add_character_class(&mut self, ranges: &[(i32, i32)], negated: bool) -> i32 {
        let payload = std::iter::once(negated as i32)
            .chain(ranges.iter().flat_map(|&(lo, hi)| [lo, hi]));
        self.add_row(ExprType::CharacterClass, payload)
    }

    pub fn add_character_class_star(&mut self, ranges: &[(i32, i32)], negated: bool) -> i32 {
        let payload = std::iter::once(negated as i32)
            .chain(ranges.iter().flat_map(|&(lo, hi)| [lo, hi]));
        self.add_row(ExprType::CharacterClassStar, payload)
    }

    pub fn add_empty_str(&mut self) -> i32 {
        self.add_row(ExprType::EmptyStr, [])
    }

    pub fn add_rule_ref(&mut self, rule_id: i32) -> i32 {
        self.add_row(ExprType::RuleRef, [rule_id])
    }

    pub fn add_sequence(&mut self, children: &[i32]) -> i32 {
        self.add_row(ExprType::Sequence, children.iter().copied())
    }

    pub fn add_choices(&mut self, children: &[i32]) -> i32 {
        self.add_row(ExprType::Choices, children.iter().copied())
    }

    pub fn add_star(&mut self, inner: i32) -> i32 {
        self.add_row(ExprType::Star, [inner])
    }

    pub fn add_plus(&mut self, inner: i32) -> i32 {
        self.add_row(ExprType::Plus, [inner])
    }

    pub fn add_question(&mut self, inner: i32) -> i32 {
        self.add_row(ExprType::Question, [inner])
    }

    pub fn add_quantifier_range(&mut self, inner: i32, lower: i32, upper: i32) -> i32 {
        self.add_row(ExprType::QuantifierRange, [inner, lower, upper])
    }

    /// Copy an expression (typically from another grammar) into this
    /// builder verbatim.
    pub fn add_expr_from(&mut self, expr: ExprRef<'_>) -> i32 {
        let payload: Vec<i32> = expr.data.to_vec();
        self.add_row(expr.ty, payload)
    }

    /// Number of expressions added so far.
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// View an expression already in the builder.
    pub fn expr(&self, expr_id: i32) -> ExprRef<'_> {
        let row = self.exprs.row(expr_id as usize);
        let ty = ExprType::from_tag(row[0]).expect("valid expression tag");
        ExprRef {
            ty,
            data: &row[1..],
        }
    }

    // ─── Rules ───────────────────────────────────────────────────────────

    /// Register a rule with an empty body (`-1`), to be filled in later.
    /// Names must be unique; the caller checks for duplicates first.
    pub fn add_empty_rule(&mut self, name: &str) -> i32 {
        debug_assert!(
            !self.rule_ids.contains_key(name),
            "duplicate rule name {name:?}"
        );
        let id = self.rules.len() as i32;
        self.rules.push(Rule {
            name: name.to_string(),
            body_expr_id: -1,
            lookahead_id: -1,
        });
        self.rule_ids.insert(name.to_string(), id);
        id
    }

    /// Register a rule under a generated fresh name `{hint}_{n}` with the
    /// given body.
    pub fn add_rule_with_hint(&mut self, hint: &str, body_expr_id: i32) -> i32 {
        let name = loop {
            let counter = self.hint_counters.entry(hint.to_string()).or_insert(0);
            let candidate = format!("{hint}_{}", *counter);
            *counter += 1;
            if !self.rule_ids.contains_key(&candidate) {
                break candidate;
            }
        };
        let id = self.add_empty_rule(&name);
        self.update_rule_body(id, body_expr_id);
        id
    }

    pub fn update_rule_body(&mut self, rule_id: i32, body_expr_id: i32) {
        self.rules[rule_id as usize].body_expr_id = body_expr_id;
    }

    pub fn set_lookahead(&mut self, rule_id: i32, lookahead_id: i32) {
        self.rules[rule_id as usize].lookahead_id = lookahead_id;
    }

    pub fn rule_id(&self, name: &str) -> Option<i32> {
        self.rule_ids.get(name).copied()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule(&self, rule_id: i32) -> &Rule {
        &self.rules[rule_id as usize]
    }

    /// Freeze into an immutable grammar. One-way; every rule must have a
    /// body by now.
    pub fn freeze(self, root_rule_id: i32) -> Grammar {
        debug_assert!((root_rule_id as usize) < self.rules.len());
        debug_assert!(
            self.rules.iter().all(|rule| rule.body_expr_id >= 0),
            "rule with unset body"
        );
        Grammar {
            rules: self.rules,
            expr_data: self.exprs.freeze(),
            root_rule_id,
        }
    }
}
