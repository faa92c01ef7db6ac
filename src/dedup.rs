use crate::error::Result;
use crate::store::{FingerprintHit, Store};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DedupStatus {
    New,
    AlreadyProcessed,
    AlreadySkipped,
}

/// Check a fingerprint against processed and skipped records before any
/// prompt is shown. A lookup failure propagates; it is never treated as
/// `New`, since that would risk a duplicate insert.
pub fn check(
    store: &Store,
    institution_id: i64,
    fingerprint: &str,
    reprocess_skipped: bool,
) -> Result<DedupStatus> {
    match store.find_by_fingerprint(institution_id, fingerprint)? {
        Some(FingerprintHit::Processed) => Ok(DedupStatus::AlreadyProcessed),
        Some(FingerprintHit::Skipped) if reprocess_skipped => Ok(DedupStatus::New),
        Some(FingerprintHit::Skipped) => Ok(DedupStatus::AlreadySkipped),
        None => Ok(DedupStatus::New),
    }
}
