use sha2::{Digest, Sha256};

/// Trim, collapse internal whitespace, and lower-case a description so
/// cosmetic formatting differences between export runs hash identically.
pub fn normalize_description(description: &str) -> String {
    description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn amount_field(amount: Option<f64>) -> String {
    match amount {
        Some(v) => format!("{v:.2}"),
        None => String::new(),
    }
}

/// Deterministic identity hash of a transaction, used as the dedup key.
/// Scoped by institution; stable across reprocessing runs of the same file.
pub fn fingerprint(
    institution_id: i64,
    date: &str,
    description: &str,
    debit_amount: Option<f64>,
    credit_amount: Option<f64>,
    balance: Option<f64>,
    reference_number: Option<&str>,
) -> String {
    let input = format!(
        "{}|{}|{}|{}|{}|{}|{}",
        institution_id,
        date.trim(),
        normalize_description(description),
        amount_field(debit_amount),
        amount_field(credit_amount),
        amount_field(balance),
        reference_number.unwrap_or("").trim().to_lowercase(),
    );
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(desc: &str, debit: Option<f64>, credit: Option<f64>) -> String {
        fingerprint(1, "2025-01-15", desc, debit, credit, Some(1000.0), Some("REF1"))
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(fp("UPI/SWIGGY/1234", Some(250.0), None), fp("UPI/SWIGGY/1234", Some(250.0), None));
    }

    #[test]
    fn test_whitespace_and_case_normalized() {
        assert_eq!(
            fp("  UPI/SWIGGY   order ", Some(250.0), None),
            fp("upi/swiggy order", Some(250.0), None)
        );
    }

    #[test]
    fn test_every_field_changes_hash() {
        let base = fp("UPI/SWIGGY", Some(250.0), None);
        assert_ne!(base, fp("UPI/ZOMATO", Some(250.0), None));
        assert_ne!(base, fp("UPI/SWIGGY", Some(251.0), None));
        assert_ne!(base, fp("UPI/SWIGGY", None, Some(250.0)));
        assert_ne!(
            base,
            fingerprint(1, "2025-01-16", "UPI/SWIGGY", Some(250.0), None, Some(1000.0), Some("REF1"))
        );
        assert_ne!(
            base,
            fingerprint(1, "2025-01-15", "UPI/SWIGGY", Some(250.0), None, Some(999.0), Some("REF1"))
        );
        assert_ne!(
            base,
            fingerprint(1, "2025-01-15", "UPI/SWIGGY", Some(250.0), None, Some(1000.0), Some("REF2"))
        );
    }

    #[test]
    fn test_scoped_by_institution() {
        let a = fingerprint(1, "2025-01-15", "x", None, Some(10.0), None, None);
        let b = fingerprint(2, "2025-01-15", "x", None, Some(10.0), None, None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_length_hex() {
        let h = fp("anything", None, None);
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_no_collisions_in_corpus() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..500 {
            let h = fp(&format!("UPI/VENDOR{i}/ref"), Some(i as f64 + 0.5), None);
            assert!(seen.insert(h), "collision at {i}");
        }
    }
}
