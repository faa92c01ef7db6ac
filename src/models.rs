use serde::{Deserialize, Serialize};

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Institution {
    pub id: i64,
    pub name: String,
    pub institution_type: String,
}

/// One statement line after normalization, before classification.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub fingerprint: String,
    pub institution_id: i64,
    pub processed_file_id: i64,
    pub date: String,
    pub description: String,
    pub debit_amount: Option<f64>,
    pub credit_amount: Option<f64>,
    pub balance: Option<f64>,
    pub reference_number: Option<String>,
    pub currency: String,
    pub enum_id: Option<i64>,
    pub enum_category: Option<String>,
    pub category: Option<String>,
    pub reason: Option<String>,
    pub is_settled: bool,
    pub splits: Vec<SplitAllocation>,
}

impl Transaction {
    /// Signed amount: credits positive, debits negative.
    pub fn amount(&self) -> f64 {
        self.credit_amount.unwrap_or(0.0) - self.debit_amount.unwrap_or(0.0)
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SkippedTransaction {
    pub id: Option<i64>,
    pub fingerprint: String,
    pub institution_id: i64,
    pub processed_file_id: i64,
    pub raw_data: String,
    pub row_number: Option<i64>,
    pub skip_reason: String,
}

/// A named, user-taught classification rule. Patterns are lower-cased
/// case-insensitive substrings; the set only ever grows.
#[derive(Debug, Clone)]
pub struct TransactionEnum {
    pub id: Option<i64>,
    pub name: String,
    pub patterns: Vec<String>,
    pub category: String,
    pub processor_type: String,
    pub is_active: bool,
}

/// One person's share of a transaction. The unallocated remainder belongs
/// to the primary owner and is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitAllocation {
    pub person: String,
    pub percentage: f64,
}

/// Raw row tuple from the extraction adapter, in file order.
#[derive(Debug, Clone, Serialize)]
pub struct RawRow {
    pub date: String,
    pub description: String,
    pub debit_amount: Option<f64>,
    pub credit_amount: Option<f64>,
    pub balance: Option<f64>,
    pub reference_number: Option<String>,
}
