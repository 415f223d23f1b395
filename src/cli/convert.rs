use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::mapper::{CategoryMapper, UnmappedTally};
use crate::reporter::{self, RunSummary};
use crate::{balances, classifier, register, writer};

pub fn run(ynab_register: &str, category_mapping: &str, out_dir: &str, dry_run: bool) -> Result<()> {
    let mapper = CategoryMapper::load(Path::new(category_mapping))?;
    let mut txns = register::parse_register(Path::new(ynab_register))?;

    let mut unmapped = UnmappedTally::new();
    for txn in &mut txns {
        mapper.apply(txn, &mut unmapped);
    }

    classifier::assign_split_ids(&mut txns);
    classifier::pair_transfers(&mut txns);

    let mut snapshots = balances::derive_balances(&txns);

    reporter::consolidate_transactions(&mut txns);
    reporter::consolidate_balances(&mut snapshots);

    let unmapped_entries = reporter::unmapped_entries(&unmapped);
    let summary = reporter::summarize(&txns, &snapshots, &unmapped_entries);

    if dry_run {
        println!("{}", "DRY RUN: no CSVs written".yellow().bold());
        print_summary(&summary);
        return Ok(());
    }

    writer::write_outputs(Path::new(out_dir), &txns, &snapshots, &unmapped_entries)?;
    print_summary(&summary);
    println!("Consolidated and per-account CSVs written to {out_dir}");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Count"]);
    table.add_row(vec![
        Cell::new("Transactions processed"),
        Cell::new(summary.transactions),
    ]);
    table.add_row(vec![
        Cell::new("Split groups detected"),
        Cell::new(summary.split_groups),
    ]);
    table.add_row(vec![
        Cell::new("Transfer legs paired"),
        Cell::new(summary.transfers_matched),
    ]);
    table.add_row(vec![
        Cell::new("Transfer legs without counterpart"),
        Cell::new(summary.transfers_unmatched),
    ]);
    table.add_row(vec![
        Cell::new("Unmapped category hits"),
        Cell::new(summary.unmapped_hits),
    ]);
    println!("{table}");

    if !summary.account_snapshots.is_empty() {
        let mut btable = Table::new();
        btable.set_header(vec!["Account", "Balance snapshots"]);
        for (account, count) in &summary.account_snapshots {
            btable.add_row(vec![Cell::new(account), Cell::new(count)]);
        }
        println!("\nBalances\n{btable}");
    }

    if !summary.unmapped.is_empty() {
        let mut utable = Table::new();
        utable.set_header(vec!["Category Group", "Category", "Count"]);
        for entry in &summary.unmapped {
            utable.add_row(vec![
                Cell::new(&entry.source_group),
                Cell::new(&entry.source_category),
                Cell::new(entry.count),
            ]);
        }
        let heading = format!("{} unmapped categories", summary.unmapped.len());
        println!("\n{}\n{utable}", heading.red().bold());
    }
}
