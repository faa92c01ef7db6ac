use std::path::Path;

use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::error::{KhataError, Result};
use crate::models::{Institution, SkippedTransaction, Transaction, TransactionEnum};

/// What an existing fingerprint was previously recorded as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FingerprintHit {
    Processed,
    Skipped,
}

/// Persistence interface over SQLite. All engine reads and writes go
/// through here; fingerprint uniqueness is also enforced at this layer.
pub struct Store {
    conn: Connection,
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // -- institutions and processed files ----------------------------------

    pub fn get_or_create_institution(&self, name: &str, institution_type: &str) -> Result<Institution> {
        self.conn.execute(
            "INSERT OR IGNORE INTO institutions (name, institution_type) VALUES (?1, ?2)",
            rusqlite::params![name, institution_type],
        )?;
        let inst = self.conn.query_row(
            "SELECT id, name, institution_type FROM institutions WHERE name = ?1",
            [name],
            |row| {
                Ok(Institution {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    institution_type: row.get(2)?,
                })
            },
        )?;
        Ok(inst)
    }

    pub fn create_processed_file(
        &self,
        institution_id: i64,
        file_path: &str,
        file_name: &str,
        file_size: Option<i64>,
        processor_type: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO processed_files (institution_id, file_path, file_name, file_size, processor_type) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![institution_id, file_path, file_name, file_size, processor_type],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_processed_file_status(&self, processed_file_id: i64, status: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE processed_files SET processing_status = ?1 WHERE id = ?2",
            rusqlite::params![status, processed_file_id],
        )?;
        Ok(())
    }

    // -- fingerprint lookups -----------------------------------------------

    pub fn find_by_fingerprint(&self, institution_id: i64, fingerprint: &str) -> Result<Option<FingerprintHit>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT 1 FROM transactions WHERE institution_id = ?1 AND fingerprint = ?2",
        )?;
        if stmt.exists(rusqlite::params![institution_id, fingerprint])? {
            return Ok(Some(FingerprintHit::Processed));
        }
        let mut stmt = self.conn.prepare_cached(
            "SELECT 1 FROM skipped_transactions WHERE institution_id = ?1 AND fingerprint = ?2",
        )?;
        if stmt.exists(rusqlite::params![institution_id, fingerprint])? {
            return Ok(Some(FingerprintHit::Skipped));
        }
        Ok(None)
    }

    // -- transactions ------------------------------------------------------

    /// Insert a classified transaction and its splits atomically.
    /// A fingerprint collision surfaces as `DuplicateFingerprint`, never an
    /// overwrite.
    pub fn save_transaction(&self, txn: &Transaction) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT INTO transactions (fingerprint, institution_id, processed_file_id, transaction_date, \
             description, debit_amount, credit_amount, balance, reference_number, currency, enum_id, \
             enum_category, category, reason, is_settled) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                txn.fingerprint,
                txn.institution_id,
                txn.processed_file_id,
                txn.date,
                txn.description,
                txn.debit_amount,
                txn.credit_amount,
                txn.balance,
                txn.reference_number,
                txn.currency,
                txn.enum_id,
                txn.enum_category,
                txn.category,
                txn.reason,
                txn.is_settled,
            ],
        );
        let txn_id = match inserted {
            Ok(_) => tx.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(KhataError::DuplicateFingerprint(txn.fingerprint.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let total = txn.amount().abs();
        for split in &txn.splits {
            tx.execute(
                "INSERT INTO transaction_splits (transaction_id, person_name, percentage, amount) \
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![txn_id, split.person, split.percentage, total * split.percentage / 100.0],
            )?;
        }
        tx.commit()?;
        Ok(txn_id)
    }

    /// Record a skip. Re-skipping a known fingerprint (a re-prompted row
    /// skipped again) refreshes the existing record instead of failing.
    pub fn save_skipped(&self, skipped: &SkippedTransaction) -> Result<()> {
        self.conn.execute(
            "INSERT INTO skipped_transactions (fingerprint, institution_id, processed_file_id, raw_data, \
             row_number, skip_reason) VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT (institution_id, fingerprint) \
             DO UPDATE SET processed_file_id = ?3, raw_data = ?4, row_number = ?5, skip_reason = ?6",
            rusqlite::params![
                skipped.fingerprint,
                skipped.institution_id,
                skipped.processed_file_id,
                skipped.raw_data,
                skipped.row_number,
                skipped.skip_reason,
            ],
        )?;
        Ok(())
    }

    // -- enums -------------------------------------------------------------

    pub fn list_enums(&self, processor_type: &str) -> Result<Vec<TransactionEnum>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, enum_name, patterns, category, processor_type, is_active \
             FROM transaction_enums WHERE processor_type = ?1 AND is_active = 1 ORDER BY enum_name",
        )?;
        let rows = stmt.query_map([processor_type], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })?;
        let mut enums = Vec::new();
        for row in rows {
            let (id, name, patterns_json, category, processor_type, is_active) = row?;
            enums.push(TransactionEnum {
                id: Some(id),
                name,
                patterns: serde_json::from_str(&patterns_json)?,
                category,
                processor_type,
                is_active,
            });
        }
        Ok(enums)
    }

    pub fn find_enum(&self, name: &str, processor_type: &str) -> Result<Option<TransactionEnum>> {
        Ok(self
            .list_enums(processor_type)?
            .into_iter()
            .find(|e| e.name.eq_ignore_ascii_case(name)))
    }

    /// Upsert keyed by (name, processor_type). Name matching is
    /// case-insensitive and an existing row keeps its spelling, so a
    /// case-variant name never creates a second row. New patterns are
    /// lower-cased, deduplicated, and merged into the existing set; the set
    /// never shrinks. The category is replaced on update.
    pub fn save_enum(&self, name: &str, patterns: &[String], category: &str, processor_type: &str) -> Result<TransactionEnum> {
        let existing = self.find_enum(name, processor_type)?;
        let name = existing.as_ref().map_or(name, |e| e.name.as_str());
        let mut merged: Vec<String> = existing
            .as_ref()
            .map(|e| e.patterns.clone())
            .unwrap_or_default();
        for pattern in patterns {
            let p = pattern.trim().to_lowercase();
            if !p.is_empty() && !merged.contains(&p) {
                merged.push(p);
            }
        }
        if merged.is_empty() {
            return Err(KhataError::Validation(format!(
                "enum '{name}' needs at least one non-empty pattern"
            )));
        }
        let patterns_json = serde_json::to_string(&merged)?;
        self.conn.execute(
            "INSERT INTO transaction_enums (enum_name, patterns, category, processor_type) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (enum_name, processor_type) \
             DO UPDATE SET patterns = ?2, category = ?3, updated_at = datetime('now')",
            rusqlite::params![name, patterns_json, category, processor_type],
        )?;
        self.find_enum(name, processor_type)?
            .ok_or_else(|| KhataError::Other(format!("enum '{name}' vanished after upsert")))
    }

    // -- categories --------------------------------------------------------

    pub fn list_categories(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached("SELECT name FROM categories ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    /// Upsert keyed by name; names are stored lower-cased.
    pub fn save_category(&self, name: &str) -> Result<()> {
        let name = name.trim().to_lowercase();
        if name.len() < 2 {
            return Err(KhataError::Validation(format!(
                "category name '{name}' must be at least 2 characters"
            )));
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
            [name],
        )?;
        Ok(())
    }

    // -- logs and summaries ------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn create_processing_log(
        &self,
        processed_file_id: i64,
        total: usize,
        processed: usize,
        skipped: usize,
        duplicates: usize,
        duplicate_skipped: usize,
        processing_time: f64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO processing_logs (processed_file_id, total_transactions, processed_transactions, \
             skipped_transactions, duplicate_transactions, duplicate_skipped, processing_time) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                processed_file_id,
                total as i64,
                processed as i64,
                skipped as i64,
                duplicates as i64,
                duplicate_skipped as i64,
                processing_time,
            ],
        )?;
        Ok(())
    }

    /// Per-person unsettled split totals, largest debt first.
    pub fn unsettled_splits_by_person(&self) -> Result<Vec<(String, f64, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT person_name, sum(amount), count(*) FROM transaction_splits \
             WHERE is_settled = 0 GROUP BY person_name ORDER BY sum(amount) DESC",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self, table: &str) -> Result<i64> {
        // Table names come from a fixed internal set, never user input.
        let sql = format!("SELECT count(*) FROM {table}");
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}
