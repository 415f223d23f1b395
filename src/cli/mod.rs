pub mod convert;
pub mod split;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ynab2monarch",
    about = "Convert a YNAB register export into Monarch import CSVs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a YNAB register CSV into Monarch transactions and balances.
    Convert {
        /// Path to the YNAB register CSV export (all accounts to migrate)
        #[arg(long = "ynab-register")]
        ynab_register: String,
        /// Path to the JSON file defining YNAB → Monarch category mappings
        #[arg(long = "category-mapping")]
        category_mapping: String,
        /// Directory where output CSVs will be written
        #[arg(long = "out-dir")]
        out_dir: String,
        /// Validate mappings and splits without writing CSV outputs
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Split a large CSV into chunks, repeating the header in each.
    Split {
        /// Path to the CSV file
        #[arg(long)]
        input: String,
        /// Maximum rows per chunk (excluding the header)
        #[arg(long = "max-rows", default_value = "3000")]
        max_rows: usize,
    },
}
