use std::collections::{BTreeMap, HashSet};

use crate::mapper::UnmappedTally;
use crate::models::{BalanceSnapshot, Transaction, UnmappedEntry};

/// Counts reported at the end of a run; in dry-run mode this is the whole
/// observable output.
pub struct RunSummary {
    pub transactions: usize,
    pub unmapped_hits: u64,
    pub unmapped: Vec<UnmappedEntry>,
    pub split_groups: usize,
    pub transfers_matched: usize,
    pub transfers_unmatched: usize,
    pub account_snapshots: Vec<(String, usize)>,
}

/// Merge per-account streams into one consolidated sequence: stable sort by
/// date, then account, keeping input order within equal keys.
pub fn consolidate_transactions(txns: &mut [Transaction]) {
    txns.sort_by(|a, b| (a.date, &a.account).cmp(&(b.date, &b.account)));
}

pub fn consolidate_balances(snapshots: &mut [BalanceSnapshot]) {
    snapshots.sort_by(|a, b| (a.date, &a.account).cmp(&(b.date, &b.account)));
}

/// Flatten the unmapped tally into sorted report rows.
pub fn unmapped_entries(tally: &UnmappedTally) -> Vec<UnmappedEntry> {
    tally
        .iter()
        .map(|((group, category), count)| UnmappedEntry {
            source_group: group.clone(),
            source_category: category.clone(),
            count: *count,
        })
        .collect()
}

pub fn summarize(
    txns: &[Transaction],
    snapshots: &[BalanceSnapshot],
    unmapped: &[UnmappedEntry],
) -> RunSummary {
    let split_groups = txns
        .iter()
        .filter_map(|t| t.split_group_id.as_deref())
        .collect::<HashSet<_>>()
        .len();

    let transfers_matched = txns.iter().filter(|t| t.is_transfer && t.transfer_matched).count();
    let transfers_unmatched = txns.iter().filter(|t| t.is_transfer && !t.transfer_matched).count();
    let unmapped_hits = txns.iter().filter(|t| !t.mapped).count() as u64;

    let mut per_account: BTreeMap<&str, usize> = BTreeMap::new();
    for snapshot in snapshots {
        *per_account.entry(snapshot.account.as_str()).or_insert(0) += 1;
    }

    RunSummary {
        transactions: txns.len(),
        unmapped_hits,
        unmapped: unmapped.to_vec(),
        split_groups,
        transfers_matched,
        transfers_unmatched,
        account_snapshots: per_account
            .into_iter()
            .map(|(account, count)| (account.to_string(), count))
            .collect(),
    }
}
