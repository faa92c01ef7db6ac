use std::path::Path;
use std::time::Instant;

use crate::dedup::{self, DedupStatus};
use crate::error::{KhataError, Result};
use crate::extractor::ProcessorKind;
use crate::fingerprint::fingerprint;
use crate::models::{RawRow, SkippedTransaction, Transaction};
use crate::resolver::{self, Prompt, Resolution};
use crate::store::Store;

#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    /// Rows whose fingerprint already exists as a processed transaction.
    pub duplicates: usize,
    /// Rows previously skipped and auto-skipped again this run.
    pub auto_skipped: usize,
    pub aborted: bool,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        !self.aborted
            && self.processed + self.skipped + self.duplicates + self.auto_skipped == self.total
    }
}

/// Process one statement file end to end: extract, dedup, classify, persist,
/// and record a processing log. Storage failures mark the file failed and
/// propagate.
pub fn process_file(
    store: &Store,
    prompt: &mut dyn Prompt,
    processor: ProcessorKind,
    file_path: &Path,
    reprocess_skipped: bool,
) -> Result<RunSummary> {
    let institution = store.get_or_create_institution(processor.name(), "bank")?;
    let file_name = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("statement");
    let file_size = std::fs::metadata(file_path).map(|m| m.len() as i64).ok();
    let processed_file_id = store.create_processed_file(
        institution.id,
        &file_path.to_string_lossy(),
        file_name,
        file_size,
        processor.key(),
    )?;

    let rows = match processor.parse(file_path) {
        Ok(rows) => rows,
        Err(e) => {
            store.update_processed_file_status(processed_file_id, "failed")?;
            return Err(e);
        }
    };

    let started = Instant::now();
    let result = run_rows(
        store,
        prompt,
        processor,
        institution.id,
        processed_file_id,
        &rows,
        reprocess_skipped,
    );

    match &result {
        Ok(summary) => {
            let status = if summary.is_complete() { "completed" } else { "partially_processed" };
            store.update_processed_file_status(processed_file_id, status)?;
            store.create_processing_log(
                processed_file_id,
                summary.total,
                summary.processed,
                summary.skipped,
                summary.duplicates,
                summary.auto_skipped,
                started.elapsed().as_secs_f64(),
            )?;
        }
        Err(_) => {
            store.update_processed_file_status(processed_file_id, "failed")?;
        }
    }
    result
}

/// Classify rows strictly in file order, each fully resolved and committed
/// before the next begins. The dedup gate runs before any prompt, so a row
/// committed earlier in the same batch already rejects its twin.
pub fn run_rows(
    store: &Store,
    prompt: &mut dyn Prompt,
    processor: ProcessorKind,
    institution_id: i64,
    processed_file_id: i64,
    rows: &[RawRow],
    reprocess_skipped: bool,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        total: rows.len(),
        ..RunSummary::default()
    };

    for (i, row) in rows.iter().enumerate() {
        let fp = fingerprint(
            institution_id,
            &row.date,
            &row.description,
            row.debit_amount,
            row.credit_amount,
            row.balance,
            row.reference_number.as_deref(),
        );

        match dedup::check(store, institution_id, &fp, reprocess_skipped)? {
            DedupStatus::AlreadyProcessed => {
                summary.duplicates += 1;
                prompt.notify("already processed - skipping duplicate");
                continue;
            }
            DedupStatus::AlreadySkipped => {
                summary.auto_skipped += 1;
                prompt.notify("previously skipped - auto-skipping");
                continue;
            }
            DedupStatus::New => {}
        }

        let mut txn = Transaction {
            id: None,
            fingerprint: fp.clone(),
            institution_id,
            processed_file_id,
            date: row.date.clone(),
            description: row.description.clone(),
            debit_amount: row.debit_amount,
            credit_amount: row.credit_amount,
            balance: row.balance,
            reference_number: row.reference_number.clone(),
            currency: processor.currency().to_string(),
            enum_id: None,
            enum_category: None,
            category: None,
            reason: None,
            is_settled: false,
            splits: vec![],
        };

        prompt.begin_transaction(&txn, i + 1, rows.len());

        match resolver::resolve(store, prompt, processor.key(), &txn)? {
            Resolution::Classified(c) => {
                txn.enum_id = Some(c.enum_id);
                txn.enum_category = Some(c.enum_category);
                txn.category = Some(c.transaction_category);
                txn.reason = c.reason;
                txn.splits = c.splits;
                match store.save_transaction(&txn) {
                    Ok(_) => {
                        summary.processed += 1;
                        let note = if c.auto_confirmed { "auto-classified" } else { "saved" };
                        prompt.notify(note);
                    }
                    // Race or logic bug: report, never overwrite.
                    Err(KhataError::DuplicateFingerprint(fp)) => {
                        summary.duplicates += 1;
                        prompt.notify(&format!("duplicate fingerprint {fp} - not overwritten"));
                    }
                    Err(e) => return Err(e),
                }
            }
            Resolution::Skipped { reason } => {
                store.save_skipped(&SkippedTransaction {
                    id: None,
                    fingerprint: fp,
                    institution_id,
                    processed_file_id,
                    raw_data: serde_json::to_string(row)?,
                    row_number: Some(i as i64 + 1),
                    skip_reason: reason,
                })?;
                summary.skipped += 1;
                prompt.notify("skipped");
            }
            Resolution::Aborted => {
                summary.aborted = true;
                prompt.notify("run aborted - nothing written for this row");
                break;
            }
        }
    }

    Ok(summary)
}
