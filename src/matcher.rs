use crate::fingerprint::normalize_description;
use crate::models::TransactionEnum;

/// One enum that matched a description, with the patterns that hit.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub enum_rule: TransactionEnum,
    pub matched_patterns: Vec<String>,
}

impl Candidate {
    fn rank(&self) -> (usize, usize) {
        let longest = self.matched_patterns.iter().map(|p| p.len()).max().unwrap_or(0);
        (self.matched_patterns.len(), longest)
    }
}

/// Case-insensitive substring search of every active enum's patterns
/// against the normalized description. Candidates are ordered by matched
/// pattern count desc, longest matched pattern desc, then enum name asc,
/// so the most specific match comes first.
pub fn find_candidates(description: &str, enums: &[TransactionEnum]) -> Vec<Candidate> {
    let haystack = normalize_description(description);
    let mut candidates: Vec<Candidate> = enums
        .iter()
        .filter(|e| e.is_active)
        .filter_map(|e| {
            let matched: Vec<String> = e
                .patterns
                .iter()
                .filter(|p| !p.is_empty() && haystack.contains(p.as_str()))
                .cloned()
                .collect();
            if matched.is_empty() {
                None
            } else {
                Some(Candidate {
                    enum_rule: e.clone(),
                    matched_patterns: matched,
                })
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.rank()
            .cmp(&a.rank())
            .then_with(|| a.enum_rule.name.cmp(&b.enum_rule.name))
    });
    candidates
}

/// Whether the top two candidates tie on rank. Tied candidates must be
/// surfaced to the user, never silently picked between.
pub fn top_is_ambiguous(candidates: &[Candidate]) -> bool {
    match candidates {
        [first, second, ..] => first.rank() == second.rank(),
        _ => false,
    }
}
