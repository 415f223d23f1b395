use chrono::NaiveDate;
use serde::Deserialize;

/// One literal line of the YNAB register export, before normalization.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub date: String,
    pub account: String,
    pub payee: String,
    pub memo: String,
    pub category_group: String,
    pub category: String,
    pub outflow: String,
    pub inflow: String,
}

/// A normalized register row, enriched in place as it moves through the
/// pipeline (mapping, split detection, transfer pairing).
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Sanitized account key: spaces and colons replaced with underscores.
    pub account: String,
    pub payee: String,
    pub memo: String,
    pub source_group: String,
    pub source_category: String,
    /// Signed amount: outflow negative, inflow positive.
    pub amount: f64,
    pub is_transfer: bool,
    /// Sanitized key of the account on the other side of a transfer.
    pub counter_account: Option<String>,
    pub transfer_matched: bool,
    /// Starting balance or reconciliation adjustment row.
    pub is_adjustment: bool,
    pub split_group_id: Option<String>,
    pub destination_group: String,
    pub destination_category: String,
    /// Insertion order preserved for output.
    pub tags: Vec<String>,
    pub resolved_memo: String,
    /// False only when the row fell through to the default mapping.
    pub mapped: bool,
}

fn default_group() -> String {
    "Other".to_string()
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

/// One entry of the category-mapping JSON. `source_group` and
/// `source_category` are required; everything else has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingRule {
    pub source_group: String,
    pub source_category: String,
    #[serde(default = "default_group")]
    pub monarch_group: String,
    #[serde(default = "default_category")]
    pub monarch_category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Memo filter; when it matches it also becomes the resolved memo.
    #[serde(default)]
    pub memo: String,
}

/// Closing balance of one account on one date with activity.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSnapshot {
    pub account: String,
    pub date: NaiveDate,
    pub balance: f64,
}

/// A (group, category) pair that hit the default mapping, with how often.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmappedEntry {
    pub source_group: String,
    pub source_category: String,
    pub count: u64,
}
