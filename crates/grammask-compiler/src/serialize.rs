//! JSON serialization of grammars, for tests and tooling.
//!
//! The dump is a single object: `rules` (name/body/lookahead triples),
//! `grammar_expr_data` (the CSR payload as two integer arrays), and
//! `root_rule_id`. Reloading validates ids and tags, so a corrupted dump
//! fails loudly instead of producing a broken grammar.

use grammask_core::csr::CsrArray;
use serde::{Deserialize, Serialize};

use crate::grammar::{ExprType, Grammar, Rule};
use crate::{Error, Result};

fn default_lookahead() -> i32 {
    -1
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    name: String,
    body_expr_id: i32,
    #[serde(default = "default_lookahead")]
    lookahead_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedCsr {
    data: Vec<i32>,
    indptr: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedGrammar {
    rules: Vec<SerializedRule>,
    grammar_expr_data: SerializedCsr,
    root_rule_id: i32,
}

impl Grammar {
    pub fn to_json(&self) -> Result<String> {
        let dump = SerializedGrammar {
            rules: self
                .rules
                .iter()
                .map(|rule| SerializedRule {
                    name: rule.name.clone(),
                    body_expr_id: rule.body_expr_id,
                    lookahead_id: rule.lookahead_id,
                })
                .collect(),
            grammar_expr_data: SerializedCsr {
                data: self.expr_data().data().to_vec(),
                indptr: self.expr_data().indptr().to_vec(),
            },
            root_rule_id: self.root_rule_id,
        };
        serde_json::to_string(&dump).map_err(|err| Error::Serialize(err.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Grammar> {
        let dump: SerializedGrammar =
            serde_json::from_str(text).map_err(|err| Error::Serialize(err.to_string()))?;

        let expr_data = CsrArray::from_parts(dump.grammar_expr_data.data, dump.grammar_expr_data.indptr)
            .ok_or_else(|| Error::Serialize("malformed expression CSR".to_string()))?;

        // Validate tags and rule ids before handing out a grammar.
        let expr_count = expr_data.len() as i32;
        for index in 0..expr_data.len() {
            let row = expr_data.row(index);
            if row.is_empty() || ExprType::from_tag(row[0]).is_none() {
                return Err(Error::Serialize(format!(
                    "expression {index} has an invalid tag"
                )));
            }
        }
        let rule_count = dump.rules.len() as i32;
        for rule in &dump.rules {
            if rule.body_expr_id < 0 || rule.body_expr_id >= expr_count {
                return Err(Error::Serialize(format!(
                    "rule {:?} body id out of range",
                    rule.name
                )));
            }
            if rule.lookahead_id >= expr_count {
                return Err(Error::Serialize(format!(
                    "rule {:?} lookahead id out of range",
                    rule.name
                )));
            }
        }
        if dump.root_rule_id < 0 || dump.root_rule_id >= rule_count {
            return Err(Error::Serialize("root rule id out of range".to_string()));
        }

        Ok(Grammar {
            rules: dump
                .rules
                .into_iter()
                .map(|rule| Rule {
                    name: rule.name,
                    body_expr_id: rule.body_expr_id,
                    lookahead_id: rule.lookahead_id,
                })
                .collect(),
            expr_data,
            root_rule_id: dump.root_rule_id,
        })
    }
}
