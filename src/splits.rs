use crate::error::{KhataError, Result};
use crate::models::SplitAllocation;

/// Parse a split directive: comma-separated `"name percentage"` pairs,
/// e.g. `"yugam 50, chintu 25"`. An empty directive means no split.
/// The unallocated remainder stays with the primary owner implicitly.
pub fn parse(directive: &str) -> Result<Vec<SplitAllocation>> {
    let directive = directive.trim();
    if directive.is_empty() {
        return Ok(Vec::new());
    }

    let mut allocations: Vec<SplitAllocation> = Vec::new();
    for segment in directive.split(',') {
        let parts: Vec<&str> = segment.split_whitespace().collect();
        let [person, percentage] = parts[..] else {
            return Err(KhataError::Validation(format!(
                "bad split segment '{}': expected 'name percentage'",
                segment.trim()
            )));
        };
        let percentage: f64 = percentage.parse().map_err(|_| {
            KhataError::Validation(format!(
                "bad split segment '{}': '{percentage}' is not a number",
                segment.trim()
            ))
        })?;
        if !(0.0..=100.0).contains(&percentage) {
            return Err(KhataError::Validation(format!(
                "bad split segment '{}': percentage must be between 0 and 100",
                segment.trim()
            )));
        }
        if allocations.iter().any(|a| a.person.eq_ignore_ascii_case(person)) {
            return Err(KhataError::Validation(format!(
                "bad split segment '{}': '{person}' appears more than once",
                segment.trim()
            )));
        }
        allocations.push(SplitAllocation {
            person: person.to_string(),
            percentage,
        });
    }
    Ok(allocations)
}

/// Percentage left to the primary owner, floored at zero.
pub fn remainder(allocations: &[SplitAllocation]) -> f64 {
    (100.0 - allocations.iter().map(|a| a.percentage).sum::<f64>()).max(0.0)
}
