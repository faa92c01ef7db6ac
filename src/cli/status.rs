use colored::Colorize;

use crate::error::Result;
use crate::settings::{self, load_settings};
use crate::store::Store;

pub fn run() -> Result<()> {
    let cfg = load_settings();
    let db = settings::db_path();

    println!("{}", "khata".bold());
    println!("  Data dir:  {}", cfg.data_dir);
    println!("  Database:  {}", db.display());
    println!("  Currency:  {}", cfg.default_currency);
    println!(
        "  Reprocess skipped: {}",
        if cfg.reprocess_skipped_transactions { "yes" } else { "no" }
    );

    if !db.exists() {
        println!("\nDatabase not initialized yet. Run 'khata init' first.");
        return Ok(());
    }

    let store = Store::open(&db)?;
    println!();
    println!("  Transactions:     {}", store.count("transactions")?);
    println!("  Skipped:          {}", store.count("skipped_transactions")?);
    println!("  Enums:            {}", store.count("transaction_enums")?);
    println!("  Categories:       {}", store.count("categories")?);
    println!("  Files processed:  {}", store.count("processed_files")?);
    println!("  Split rows:       {}", store.count("transaction_splits")?);
    Ok(())
}
