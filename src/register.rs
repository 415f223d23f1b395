use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{MigrateError, Result};
use crate::models::{RawRow, Transaction};

pub const TRANSFER_PREFIX: &str = "Transfer :";

const RECONCILIATION_MARKERS: [&str; 2] = ["Starting Balance", "Reconciliation Balance Adjustment"];

const REGISTER_COLUMNS: [&str; 8] = [
    "Date",
    "Account",
    "Payee",
    "Memo",
    "Category Group",
    "Category",
    "Outflow",
    "Inflow",
];

// ---------------------------------------------------------------------------
// Field-level helpers
// ---------------------------------------------------------------------------

/// Parse a YNAB money string: strips `$` and `,`, treats `(…)` as negative.
/// Empty or blank input is 0.0. Returns None for anything unparseable.
pub fn parse_money(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_matches('"');
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    let (s, neg) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (s, false),
    };
    let cleaned = s.replace('$', "").replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    let amount: f64 = cleaned.parse().ok()?;
    Some(if neg { -amount } else { amount })
}

/// Normalize a register date into a calendar date.
/// Accepts MM/DD/YYYY, YYYY-MM-DD, and MM/DD/YY.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%m/%d/%Y", "%Y-%m-%d", "%m/%d/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    None
}

/// Canonical account key: every space and colon becomes an underscore,
/// nothing else is altered. Idempotent.
pub fn sanitize_account(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' || c == ':' { '_' } else { c })
        .collect()
}

/// Extract the counter-account name from a `Transfer : <Account>` field.
pub fn transfer_counter_account(field: &str) -> Option<String> {
    field
        .trim()
        .strip_prefix(TRANSFER_PREFIX)
        .map(|rest| rest.trim().to_string())
}

fn is_reconciliation(payee: &str) -> bool {
    RECONCILIATION_MARKERS.iter().any(|m| payee.contains(m))
}

// ---------------------------------------------------------------------------
// Row normalization
// ---------------------------------------------------------------------------

/// Turn one raw register row into a Transaction, or fail on a date that
/// does not parse or amount columns that contradict each other.
pub fn normalize_row(row: &RawRow, line: usize) -> Result<Transaction> {
    let malformed = |reason: String| MigrateError::MalformedRow { line, reason };

    let date = normalize_date(&row.date)
        .ok_or_else(|| malformed(format!("unparseable date '{}'", row.date.trim())))?;

    if row.outflow.trim().is_empty() && row.inflow.trim().is_empty() {
        return Err(malformed("neither outflow nor inflow present".to_string()));
    }
    let outflow = parse_money(&row.outflow)
        .ok_or_else(|| malformed(format!("unparseable outflow '{}'", row.outflow.trim())))?;
    let inflow = parse_money(&row.inflow)
        .ok_or_else(|| malformed(format!("unparseable inflow '{}'", row.inflow.trim())))?;
    if outflow != 0.0 && inflow != 0.0 {
        return Err(malformed("both outflow and inflow are non-zero".to_string()));
    }
    let amount = inflow - outflow;

    let mut payee = row.payee.trim().to_string();
    let memo = row.memo.trim().to_string();
    let source_group = row.category_group.trim().to_string();
    let source_category = row.category.trim().to_string();

    // YNAB marks transfers in the payee; some exports carry the marker in the
    // category column instead. Either form flags the row.
    let counter_account = transfer_counter_account(&payee)
        .or_else(|| transfer_counter_account(&row.category))
        .map(|name| sanitize_account(&name));
    let is_transfer = counter_account.is_some();
    if is_transfer {
        payee = payee.replacen(TRANSFER_PREFIX, "Transfer:", 1);
    }

    Ok(Transaction {
        date,
        account: sanitize_account(row.account.trim()),
        resolved_memo: memo.clone(),
        memo,
        source_group,
        source_category,
        amount,
        is_transfer,
        counter_account,
        transfer_matched: false,
        is_adjustment: is_reconciliation(&payee),
        split_group_id: None,
        destination_group: String::new(),
        destination_category: String::new(),
        tags: Vec::new(),
        payee,
        mapped: false,
    })
}

// ---------------------------------------------------------------------------
// Register file
// ---------------------------------------------------------------------------

/// Read and normalize a whole register export. Any malformed row aborts the
/// run; silently dropping financial rows is not acceptable.
pub fn parse_register(path: &Path) -> Result<Vec<Transaction>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
            .ok_or_else(|| MigrateError::Other(format!("register is missing column '{name}'")))
    };
    let idx: Vec<usize> = REGISTER_COLUMNS
        .iter()
        .map(|&name| column(name))
        .collect::<Result<_>>()?;

    let mut transactions = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let field = |col: usize| record.get(idx[col]).unwrap_or("").to_string();
        let raw = RawRow {
            date: field(0),
            account: field(1),
            payee: field(2),
            memo: field(3),
            category_group: field(4),
            category: field(5),
            outflow: field(6),
            inflow: field(7),
        };
        // header is line 1
        transactions.push(normalize_row(&raw, i + 2)?);
    }
    Ok(transactions)
}
