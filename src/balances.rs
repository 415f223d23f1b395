use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{BalanceSnapshot, Transaction};

/// Reconstruct per-account running balances: one snapshot per (account, date)
/// with activity, holding the post-full-day total. The running total starts
/// at zero; a starting-balance adjustment is just the first signed amount.
/// Dates without transactions emit nothing.
pub fn derive_balances(txns: &[Transaction]) -> Vec<BalanceSnapshot> {
    let mut daily: BTreeMap<&str, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for t in txns {
        *daily
            .entry(t.account.as_str())
            .or_default()
            .entry(t.date)
            .or_insert(0.0) += t.amount;
    }

    let mut snapshots = Vec::new();
    for (account, days) in daily {
        let mut balance = 0.0;
        for (date, delta) in days {
            balance += delta;
            snapshots.push(BalanceSnapshot {
                account: account.to_string(),
                date,
                balance,
            });
        }
    }
    snapshots
}
