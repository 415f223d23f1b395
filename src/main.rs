mod balances;
mod classifier;
mod cli;
mod error;
mod mapper;
mod models;
mod register;
mod reporter;
mod writer;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            ynab_register,
            category_mapping,
            out_dir,
            dry_run,
        } => cli::convert::run(&ynab_register, &category_mapping, &out_dir, dry_run),
        Commands::Split { input, max_rows } => cli::split::run(&input, max_rows),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
