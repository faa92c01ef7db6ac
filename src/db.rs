use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS institutions (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    institution_type TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS processed_files (
    id INTEGER PRIMARY KEY,
    institution_id INTEGER NOT NULL,
    file_path TEXT NOT NULL,
    file_name TEXT NOT NULL,
    file_size INTEGER,
    processor_type TEXT NOT NULL,
    processing_status TEXT DEFAULT 'processing',
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (institution_id) REFERENCES institutions(id)
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS transaction_enums (
    id INTEGER PRIMARY KEY,
    enum_name TEXT NOT NULL,
    patterns TEXT NOT NULL,
    category TEXT NOT NULL,
    processor_type TEXT NOT NULL,
    is_active INTEGER DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    UNIQUE (enum_name, processor_type)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    fingerprint TEXT NOT NULL,
    institution_id INTEGER NOT NULL,
    processed_file_id INTEGER NOT NULL,
    transaction_date TEXT NOT NULL,
    description TEXT NOT NULL,
    debit_amount REAL,
    credit_amount REAL,
    balance REAL,
    reference_number TEXT,
    currency TEXT NOT NULL DEFAULT 'INR',
    enum_id INTEGER,
    enum_category TEXT,
    category TEXT,
    reason TEXT,
    is_settled INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (institution_id) REFERENCES institutions(id),
    FOREIGN KEY (processed_file_id) REFERENCES processed_files(id),
    FOREIGN KEY (enum_id) REFERENCES transaction_enums(id),
    UNIQUE (institution_id, fingerprint)
);

CREATE TABLE IF NOT EXISTS transaction_splits (
    id INTEGER PRIMARY KEY,
    transaction_id INTEGER NOT NULL,
    person_name TEXT NOT NULL,
    percentage REAL NOT NULL,
    amount REAL NOT NULL,
    is_settled INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (transaction_id) REFERENCES transactions(id)
);

CREATE TABLE IF NOT EXISTS skipped_transactions (
    id INTEGER PRIMARY KEY,
    fingerprint TEXT NOT NULL,
    institution_id INTEGER NOT NULL,
    processed_file_id INTEGER NOT NULL,
    raw_data TEXT NOT NULL,
    row_number INTEGER,
    skip_reason TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (institution_id) REFERENCES institutions(id),
    FOREIGN KEY (processed_file_id) REFERENCES processed_files(id),
    UNIQUE (institution_id, fingerprint)
);

CREATE TABLE IF NOT EXISTS processing_logs (
    id INTEGER PRIMARY KEY,
    processed_file_id INTEGER NOT NULL,
    total_transactions INTEGER DEFAULT 0,
    processed_transactions INTEGER DEFAULT 0,
    skipped_transactions INTEGER DEFAULT 0,
    duplicate_transactions INTEGER DEFAULT 0,
    duplicate_skipped INTEGER DEFAULT 0,
    processing_time REAL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (processed_file_id) REFERENCES processed_files(id)
);
";

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("income", "Salary, interest, refunds"),
    ("food", "Groceries, restaurants, delivery"),
    ("transport", "Fuel, cabs, metro, tolls"),
    ("shopping", "Retail and online purchases"),
    ("entertainment", "Streaming, movies, outings"),
    ("utilities", "Electricity, internet, phone, rent"),
    ("healthcare", "Pharmacy, doctors, insurance"),
    ("transfer", "Transfers between own accounts"),
    ("investment", "Mutual funds, stocks, deposits"),
    ("other", "Anything else"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for (name, description) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, description) VALUES (?1, ?2)",
                rusqlite::params![name, description],
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &[
            "institutions",
            "processed_files",
            "categories",
            "transaction_enums",
            "transactions",
            "transaction_splits",
            "skipped_transactions",
            "processing_logs",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 10);
    }

    #[test]
    fn test_fingerprint_unique_per_institution() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO institutions (name, institution_type) VALUES ('Icici Bank', 'bank')", [],
        ).unwrap();
        conn.execute(
            "INSERT INTO processed_files (institution_id, file_path, file_name, processor_type) \
             VALUES (1, '/tmp/a.csv', 'a.csv', 'icici_bank')", [],
        ).unwrap();
        let insert = "INSERT INTO transactions (fingerprint, institution_id, processed_file_id, \
                      transaction_date, description, currency) VALUES ('abc', 1, 1, '2025-01-01', 'x', 'INR')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
