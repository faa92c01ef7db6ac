use std::path::Path;

use crate::error::{KhataError, Result};
use crate::models::RawRow;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace(',', "").replace('"', "").replace('\u{20b9}', "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Parse a day-first date (`15-01-2025`, `15/01/2025`, or `15/01/25`) into
/// ISO `YYYY-MM-DD`.
pub fn parse_date_dmy(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split(['-', '/']).collect();
    if parts.len() != 3 {
        return None;
    }
    let d: u32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    let mut y: i32 = parts[2].parse().ok()?;
    if parts[2].len() == 2 {
        y += 2000;
    }
    chrono::NaiveDate::from_ymd_opt(y, m, d).map(|dt| dt.format("%Y-%m-%d").to_string())
}

fn non_empty(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Processor registry — enum dispatch, resolved once at startup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessorKind {
    IciciBank,
    HdfcBank,
}

impl ProcessorKind {
    /// Scope key for enums and configuration.
    pub fn key(&self) -> &'static str {
        match self {
            Self::IciciBank => "icici_bank",
            Self::HdfcBank => "hdfc_bank",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::IciciBank => "Icici Bank",
            Self::HdfcBank => "Hdfc Bank",
        }
    }

    pub fn currency(&self) -> &'static str {
        "INR"
    }

    pub fn detect(&self, file_path: &Path) -> bool {
        let Ok(content) = std::fs::read_to_string(file_path) else {
            return false;
        };
        match self {
            Self::IciciBank => content.contains("Transaction Remarks"),
            Self::HdfcBank => content.contains("Narration"),
        }
    }

    /// Extract raw rows in file order. The engine treats the result as a
    /// finite, forward-only sequence.
    pub fn parse(&self, file_path: &Path) -> Result<Vec<RawRow>> {
        #[cfg(feature = "xlsx")]
        if file_path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("xls") || e.eq_ignore_ascii_case("xlsx"))
        {
            return self.parse_workbook(file_path);
        }
        match self {
            Self::IciciBank => parse_statement_csv(file_path, &ICICI_COLUMNS),
            Self::HdfcBank => parse_statement_csv(file_path, &HDFC_COLUMNS),
        }
    }

    #[cfg(feature = "xlsx")]
    fn parse_workbook(&self, file_path: &Path) -> Result<Vec<RawRow>> {
        let columns = match self {
            Self::IciciBank => &ICICI_COLUMNS,
            Self::HdfcBank => &HDFC_COLUMNS,
        };
        parse_statement_xlsx(file_path, columns)
    }
}

pub const ALL_PROCESSORS: &[ProcessorKind] = &[ProcessorKind::IciciBank, ProcessorKind::HdfcBank];

pub fn get_by_key(key: &str) -> Result<ProcessorKind> {
    ALL_PROCESSORS
        .iter()
        .find(|p| p.key() == key)
        .copied()
        .ok_or_else(|| KhataError::UnknownProcessor(key.to_string()))
}

pub fn detect_for_file(file_path: &Path) -> Option<ProcessorKind> {
    ALL_PROCESSORS.iter().find(|p| p.detect(file_path)).copied()
}

// ---------------------------------------------------------------------------
// Statement parsing — header names per export format
// ---------------------------------------------------------------------------

struct StatementColumns {
    date: &'static str,
    description: &'static str,
    withdrawal: &'static str,
    deposit: &'static str,
    balance: &'static str,
    reference: &'static str,
}

const ICICI_COLUMNS: StatementColumns = StatementColumns {
    date: "Transaction Date",
    description: "Transaction Remarks",
    withdrawal: "Withdrawal Amount (INR )",
    deposit: "Deposit Amount (INR )",
    balance: "Balance (INR )",
    reference: "S No.",
};

const HDFC_COLUMNS: StatementColumns = StatementColumns {
    date: "Date",
    description: "Narration",
    withdrawal: "Withdrawal Amt.",
    deposit: "Deposit Amt.",
    balance: "Closing Balance",
    reference: "Chq./Ref.No.",
};

struct ColumnIndexes {
    date: usize,
    description: usize,
    withdrawal: usize,
    deposit: usize,
    balance: Option<usize>,
    reference: Option<usize>,
}

fn find_indexes(header: &csv::StringRecord, columns: &StatementColumns) -> Option<ColumnIndexes> {
    let find = |name: &str| header.iter().position(|f| f.trim() == name);
    Some(ColumnIndexes {
        date: find(columns.date)?,
        description: find(columns.description)?,
        withdrawal: find(columns.withdrawal)?,
        deposit: find(columns.deposit)?,
        balance: find(columns.balance),
        reference: find(columns.reference),
    })
}

/// Bank exports put preamble lines above the real header row, so scan for
/// the header instead of trusting the first record.
fn parse_statement_csv(file_path: &Path, columns: &StatementColumns) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let mut rows = Vec::new();
    let mut indexes: Option<ColumnIndexes> = None;

    for result in rdr.records() {
        let Ok(record) = result else { continue };
        let Some(idx) = &indexes else {
            indexes = find_indexes(&record, columns);
            continue;
        };
        let needed = [idx.date, idx.description, idx.withdrawal, idx.deposit]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1;
        if record.len() < needed {
            continue;
        }
        let Some(date) = parse_date_dmy(&record[idx.date]) else {
            continue;
        };
        let description = record[idx.description].trim().to_string();
        if description.is_empty() {
            continue;
        }
        rows.push(RawRow {
            date,
            description,
            debit_amount: parse_amount(&record[idx.withdrawal]),
            credit_amount: parse_amount(&record[idx.deposit]),
            balance: idx.balance.and_then(|i| record.get(i)).and_then(parse_amount),
            reference_number: idx.reference.and_then(|i| record.get(i)).and_then(non_empty),
        });
    }

    if indexes.is_none() {
        return Err(KhataError::Other(format!(
            "no statement header found in {}",
            file_path.display()
        )));
    }
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn parse_statement_xlsx(file_path: &Path, columns: &StatementColumns) -> Result<Vec<RawRow>> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| KhataError::Other(format!("failed to open workbook: {e}")))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| KhataError::Other("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| KhataError::Other(format!("failed to read sheet: {e}")))?;

    let cell_text = |cell: &Data| -> String {
        match cell {
            Data::String(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            _ => String::new(),
        }
    };

    let mut rows = Vec::new();
    let mut indexes: Option<ColumnIndexes> = None;
    for row in range.rows() {
        let fields: Vec<String> = row.iter().map(&cell_text).collect();
        let record = csv::StringRecord::from(fields);
        let Some(idx) = &indexes else {
            indexes = find_indexes(&record, columns);
            continue;
        };
        if record.len() <= idx.description {
            continue;
        }
        let Some(date) = parse_date_dmy(&record[idx.date]) else {
            continue;
        };
        let description = record[idx.description].trim().to_string();
        if description.is_empty() {
            continue;
        }
        rows.push(RawRow {
            date,
            description,
            debit_amount: record.get(idx.withdrawal).and_then(parse_amount),
            credit_amount: record.get(idx.deposit).and_then(parse_amount),
            balance: idx.balance.and_then(|i| record.get(i)).and_then(parse_amount),
            reference_number: idx.reference.and_then(|i| record.get(i)).and_then(non_empty),
        });
    }

    if indexes.is_none() {
        return Err(KhataError::Other(format!(
            "no statement header found in {}",
            file_path.display()
        )));
    }
    Ok(rows)
}
