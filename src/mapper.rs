use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{MigrateError, Result};
use crate::models::{MappingRule, Transaction};

/// Destination assigned to every transfer leg.
pub const TRANSFER_DESTINATION: (&str, &str) = ("Transfers", "Transfer");
/// Destination assigned to starting-balance and reconciliation rows.
pub const ADJUSTMENT_DESTINATION: (&str, &str) = ("Transfers", "Balance Adjustments");
/// Sentinel destination for rows no rule matched.
pub const DEFAULT_DESTINATION: (&str, &str) = ("Other", "Uncategorized");

/// Running tally of (source_group, source_category) pairs that hit the
/// default rule. BTreeMap keeps the report deterministically sorted.
pub type UnmappedTally = BTreeMap<(String, String), u64>;

#[derive(Debug, Clone)]
struct RuleTarget {
    group: String,
    category: String,
    tags: Vec<String>,
}

#[derive(Debug, Clone)]
struct MemoRule {
    /// Lowercased filter, matched as a substring of the lowercased memo.
    filter: String,
    /// The filter as written in the mapping file; overrides the memo on match.
    memo: String,
    target: RuleTarget,
}

#[derive(Debug)]
pub struct Resolution {
    pub group: String,
    pub category: String,
    pub tags: Vec<String>,
    pub memo_override: Option<String>,
    pub mapped: bool,
}

/// Index over the mapping table. Resolution order, first match wins:
/// memo rule, exact (group, category), category-only fallback, default.
/// Memo filters match case-insensitively as substrings.
#[derive(Debug, Default)]
pub struct CategoryMapper {
    exact: HashMap<(String, String), RuleTarget>,
    category_only: HashMap<String, RuleTarget>,
    memo_rules: HashMap<(String, String), Vec<MemoRule>>,
}

impl CategoryMapper {
    pub fn load(path: &Path) -> Result<CategoryMapper> {
        let content = std::fs::read_to_string(path)?;
        let rules: Vec<MappingRule> =
            serde_json::from_str(&content).map_err(|e| MigrateError::MappingLoad(e.to_string()))?;
        Ok(Self::from_rules(rules))
    }

    pub fn from_rules(rules: Vec<MappingRule>) -> CategoryMapper {
        let mut mapper = CategoryMapper::default();
        for rule in rules {
            let key = (
                rule.source_group.trim().to_string(),
                rule.source_category.trim().to_string(),
            );
            let target = RuleTarget {
                group: rule.monarch_group.trim().to_string(),
                category: rule.monarch_category.trim().to_string(),
                tags: rule
                    .tags
                    .iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
            };
            let memo = rule.memo.trim().to_string();
            if !memo.is_empty() {
                mapper.memo_rules.entry(key).or_default().push(MemoRule {
                    filter: memo.to_lowercase(),
                    memo,
                    target,
                });
            } else {
                // first rule seen for a bare category wins the fallback slot
                mapper
                    .category_only
                    .entry(key.1.clone())
                    .or_insert_with(|| target.clone());
                mapper.exact.insert(key, target);
            }
        }
        mapper
    }

    /// Resolve a source (group, category, memo) into a destination.
    /// Never fails; rows nothing matched get the default sentinel pair.
    pub fn resolve(&self, source_group: &str, source_category: &str, memo: &str) -> Resolution {
        let key = (
            source_group.trim().to_string(),
            source_category.trim().to_string(),
        );
        let memo_lower = memo.trim().to_lowercase();

        if let Some(rules) = self.memo_rules.get(&key) {
            for rule in rules {
                if memo_lower.contains(rule.filter.as_str()) {
                    return Resolution {
                        group: rule.target.group.clone(),
                        category: rule.target.category.clone(),
                        tags: rule.target.tags.clone(),
                        memo_override: Some(rule.memo.clone()),
                        mapped: true,
                    };
                }
            }
        }

        if let Some(target) = self.exact.get(&key) {
            return Resolution {
                group: target.group.clone(),
                category: target.category.clone(),
                tags: target.tags.clone(),
                memo_override: None,
                mapped: true,
            };
        }

        if let Some(target) = self.category_only.get(&key.1) {
            return Resolution {
                group: target.group.clone(),
                category: target.category.clone(),
                tags: target.tags.clone(),
                memo_override: None,
                mapped: true,
            };
        }

        Resolution {
            group: DEFAULT_DESTINATION.0.to_string(),
            category: DEFAULT_DESTINATION.1.to_string(),
            tags: Vec::new(),
            memo_override: None,
            mapped: false,
        }
    }

    /// Assign a destination to one transaction. Transfers and reconciliation
    /// adjustments get fixed destinations and never touch the rule index or
    /// the unmapped tally.
    pub fn apply(&self, txn: &mut Transaction, unmapped: &mut UnmappedTally) {
        if txn.is_transfer {
            txn.destination_group = TRANSFER_DESTINATION.0.to_string();
            txn.destination_category = TRANSFER_DESTINATION.1.to_string();
            txn.mapped = true;
            return;
        }
        if txn.is_adjustment {
            txn.destination_group = ADJUSTMENT_DESTINATION.0.to_string();
            txn.destination_category = ADJUSTMENT_DESTINATION.1.to_string();
            txn.mapped = true;
            return;
        }

        let resolution = self.resolve(&txn.source_group, &txn.source_category, &txn.memo);
        txn.destination_group = resolution.group;
        txn.destination_category = resolution.category;
        // union, not replace: tags from any earlier pass survive
        for tag in resolution.tags {
            if !txn.tags.contains(&tag) {
                txn.tags.push(tag);
            }
        }
        if let Some(memo) = resolution.memo_override {
            txn.resolved_memo = memo;
        }
        txn.mapped = resolution.mapped;
        if !resolution.mapped {
            *unmapped
                .entry((txn.source_group.clone(), txn.source_category.clone()))
                .or_insert(0) += 1;
        }
    }
}
