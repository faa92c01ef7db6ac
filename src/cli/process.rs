use std::path::PathBuf;

use colored::Colorize;

use crate::cli::prompt::TerminalPrompt;
use crate::error::{KhataError, Result};
use crate::extractor;
use crate::pipeline;
use crate::settings::{self, load_settings};
use crate::store::Store;

pub fn run(file: &str, processor_key: Option<&str>, reprocess_flag: bool) -> Result<()> {
    let path = PathBuf::from(file);
    if !path.is_file() {
        return Err(KhataError::Validation(format!("file not found: {file}")));
    }

    // Resolve the processor before touching the database so a bad key
    // fails fast.
    let processor = match processor_key {
        Some(key) => extractor::get_by_key(key)?,
        None => extractor::detect_for_file(&path).ok_or_else(|| {
            KhataError::UnknownProcessor(
                "could not detect a processor for this file; pass --processor".to_string(),
            )
        })?,
    };

    let cfg = load_settings();
    std::fs::create_dir_all(settings::get_data_dir())?;
    let store = Store::open(&settings::db_path())?;
    let reprocess = reprocess_flag || cfg.reprocess_skipped_transactions;

    println!(
        "Processing {} as {}",
        path.display().to_string().bold(),
        processor.name()
    );
    if reprocess {
        println!("{}", "Previously skipped transactions will be re-prompted.".dimmed());
    }

    let mut prompt = TerminalPrompt::default();
    let summary = pipeline::process_file(&store, &mut prompt, processor, &path, reprocess)?;

    println!();
    if summary.aborted {
        println!("{}", "Run aborted.".yellow().bold());
    } else {
        println!("{}", "Done.".green().bold());
    }
    println!("  Total rows:       {}", summary.total);
    println!("  Processed:        {}", summary.processed.to_string().green());
    println!("  Skipped:          {}", summary.skipped);
    println!("  Duplicates:       {}", summary.duplicates);
    println!("  Auto-skipped:     {}", summary.auto_skipped);
    Ok(())
}
