use std::collections::HashMap;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::models::Transaction;

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())[..8].to_string()
}

/// Identifier shared by every line of one split transaction. Derived from the
/// cluster's content only, so identical input always yields identical ids.
fn split_group_id(date: NaiveDate, account: &str, payee: &str, total: f64, lines: usize) -> String {
    let base = format!("{date}|{account}|{payee}|{total:.2}|{lines}");
    format!("SPLIT-{}-{}", date.format("%Y%m%d"), short_hash(&base))
}

/// Detect YNAB split transactions: multiple rows on one date, in one account,
/// to one payee, whose categories differ and none of which is a transfer.
/// Every row of a cluster gets the same split-group id.
///
/// Known limitation: distinct same-day purchases at the same payee can
/// over-group into one cluster.
pub fn assign_split_ids(txns: &mut [Transaction]) {
    let mut clusters: HashMap<(String, NaiveDate, String), Vec<usize>> = HashMap::new();
    for (i, t) in txns.iter().enumerate() {
        clusters
            .entry((t.account.clone(), t.date, t.payee.clone()))
            .or_default()
            .push(i);
    }

    for ((account, date, payee), members) in clusters {
        if members.len() < 2 {
            continue;
        }
        if members.iter().any(|&i| txns[i].is_transfer) {
            continue;
        }
        // rows all carrying one category are repeat purchases, not a split
        let uniform = {
            let first = &txns[members[0]].source_category;
            members.iter().all(|&i| txns[i].source_category == *first)
        };
        if uniform {
            continue;
        }
        let total: f64 = members.iter().map(|&i| txns[i].amount).sum();
        let id = split_group_id(date, &account, &payee, total, members.len());
        for &i in &members {
            txns[i].split_group_id = Some(id.clone());
        }
    }
}

/// Pair each transfer leg with its counterpart: same date, opposite signed
/// amount, booked in the counter account and pointing back here. Legs without
/// a counterpart (the other account was not exported) stay flagged as
/// transfers but unmatched; that is a soft signal, not an error.
pub fn pair_transfers(txns: &mut [Transaction]) {
    // key: (from account, to account, date, amount in cents)
    let mut open: HashMap<(String, String, NaiveDate, i64), Vec<usize>> = HashMap::new();

    for i in 0..txns.len() {
        if !txns[i].is_transfer {
            continue;
        }
        let Some(counter) = txns[i].counter_account.clone() else {
            continue;
        };
        let cents = (txns[i].amount * 100.0).round() as i64;
        let want = (counter.clone(), txns[i].account.clone(), txns[i].date, -cents);
        if let Some(candidates) = open.get_mut(&want) {
            if let Some(j) = candidates.pop() {
                txns[i].transfer_matched = true;
                txns[j].transfer_matched = true;
                if candidates.is_empty() {
                    open.remove(&want);
                }
                continue;
            }
        }
        open.entry((txns[i].account.clone(), counter, txns[i].date, cents))
            .or_default()
            .push(i);
    }
}
