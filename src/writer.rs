use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Result;
use crate::models::{BalanceSnapshot, Transaction, UnmappedEntry};

const TX_HEADER: [&str; 10] = [
    "Date",
    "Description",
    "Original Description",
    "Amount",
    "Transaction Type",
    "Category",
    "Account Name",
    "Labels",
    "Notes",
    "Split Group ID",
];

const PER_ACCOUNT_TX_HEADER: [&str; 8] = [
    "Date",
    "Merchant",
    "Category",
    "Account",
    "Original Statement",
    "Notes",
    "Amount",
    "Tags",
];

fn txn_type(amount: f64) -> &'static str {
    if amount >= 0.0 {
        "credit"
    } else {
        "debit"
    }
}

fn date_str(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Write every output of a run: the consolidated CSVs, the unmapped-category
/// report (only when non-empty), and one subdirectory per sanitized account
/// key. Called only after the whole pipeline succeeded.
pub fn write_outputs(
    out_dir: &Path,
    txns: &[Transaction],
    snapshots: &[BalanceSnapshot],
    unmapped: &[UnmappedEntry],
) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;

    write_consolidated_transactions(&out_dir.join("transactions_mapped.csv"), txns)?;
    write_consolidated_balances(&out_dir.join("balances_mapped.csv"), snapshots)?;
    if !unmapped.is_empty() {
        write_unmapped(&out_dir.join("unmapped_categories.csv"), unmapped)?;
    }

    let accounts: BTreeSet<&str> = txns.iter().map(|t| t.account.as_str()).collect();
    for account in accounts {
        let dir = out_dir.join(account);
        std::fs::create_dir_all(&dir)?;
        write_account_transactions(&dir.join("transactions.csv"), txns, account)?;
        write_account_balances(&dir.join("balances.csv"), snapshots, account)?;
    }
    Ok(())
}

fn write_consolidated_transactions(path: &Path, txns: &[Transaction]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(TX_HEADER)?;
    for t in txns {
        let date = date_str(t.date);
        let amount = format!("{:.2}", t.amount);
        let labels = t.tags.join(",");
        w.write_record([
            date.as_str(),
            t.payee.as_str(),
            t.payee.as_str(),
            amount.as_str(),
            txn_type(t.amount),
            t.destination_category.as_str(),
            t.account.as_str(),
            labels.as_str(),
            t.resolved_memo.as_str(),
            t.split_group_id.as_deref().unwrap_or(""),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_consolidated_balances(path: &Path, snapshots: &[BalanceSnapshot]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["Date", "Account", "Balance"])?;
    for s in snapshots {
        let date = date_str(s.date);
        let balance = format!("{:.2}", s.balance);
        w.write_record([date.as_str(), s.account.as_str(), balance.as_str()])?;
    }
    w.flush()?;
    Ok(())
}

fn write_unmapped(path: &Path, unmapped: &[UnmappedEntry]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["Category Group", "Category", "Count"])?;
    for entry in unmapped {
        let count = entry.count.to_string();
        w.write_record([
            entry.source_group.as_str(),
            entry.source_category.as_str(),
            count.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_account_transactions(path: &Path, txns: &[Transaction], account: &str) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(PER_ACCOUNT_TX_HEADER)?;
    for t in txns.iter().filter(|t| t.account == account) {
        let date = date_str(t.date);
        let amount = format!("{:.2}", t.amount);
        let tags = t.tags.join(",");
        w.write_record([
            date.as_str(),
            t.payee.as_str(),
            t.destination_category.as_str(),
            t.account.as_str(),
            t.payee.as_str(),
            t.resolved_memo.as_str(),
            amount.as_str(),
            tags.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_account_balances(path: &Path, snapshots: &[BalanceSnapshot], account: &str) -> Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["Date", "Balance"])?;
    for s in snapshots.iter().filter(|s| s.account == account) {
        let date = date_str(s.date);
        let balance = format!("{:.2}", s.balance);
        w.write_record([date.as_str(), balance.as_str()])?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(account: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            account: account.to_string(),
            payee: "Grocer".to_string(),
            memo: "weekly run".to_string(),
            source_group: "Everyday".to_string(),
            source_category: "Groceries".to_string(),
            amount,
            is_transfer: false,
            counter_account: None,
            transfer_matched: false,
            is_adjustment: false,
            split_group_id: None,
            destination_group: "Food".to_string(),
            destination_category: "Groceries".to_string(),
            tags: vec!["household".to_string(), "weekly".to_string()],
            resolved_memo: "weekly run".to_string(),
            mapped: true,
        }
    }

    #[test]
    fn test_write_outputs_layout() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let txns = vec![txn("Checking", -12.5), txn("Joint_Savings", 40.0)];
        let snapshots = vec![BalanceSnapshot {
            account: "Checking".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            balance: -12.5,
        }];
        let unmapped = vec![UnmappedEntry {
            source_group: "Mystery".to_string(),
            source_category: "Unknown".to_string(),
            count: 2,
        }];

        write_outputs(&out, &txns, &snapshots, &unmapped).unwrap();

        assert!(out.join("transactions_mapped.csv").exists());
        assert!(out.join("balances_mapped.csv").exists());
        assert!(out.join("unmapped_categories.csv").exists());
        assert!(out.join("Checking/transactions.csv").exists());
        assert!(out.join("Checking/balances.csv").exists());
        assert!(out.join("Joint_Savings/transactions.csv").exists());

        let consolidated = std::fs::read_to_string(out.join("transactions_mapped.csv")).unwrap();
        let mut lines = consolidated.lines();
        assert_eq!(lines.next().unwrap(), TX_HEADER.join(","));
        let first = lines.next().unwrap();
        assert!(first.contains("-12.50"));
        assert!(first.contains("debit"));
        assert!(first.contains("\"household,weekly\""));

        let unmapped_csv = std::fs::read_to_string(out.join("unmapped_categories.csv")).unwrap();
        assert!(unmapped_csv.contains("Mystery,Unknown,2"));
    }

    #[test]
    fn test_unmapped_report_skipped_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        write_outputs(&out, &[txn("Checking", 1.0)], &[], &[]).unwrap();
        assert!(!out.join("unmapped_categories.csv").exists());
    }
}
