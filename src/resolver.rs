use crate::error::{KhataError, Result};
use crate::matcher::{self, Candidate};
use crate::models::{SplitAllocation, Transaction};
use crate::splits;
use crate::store::Store;

/// User's answer to an ambiguous-match prompt.
#[derive(Debug, Clone)]
pub enum AmbiguousChoice {
    /// Index into the presented candidate list.
    Select(usize),
    /// This is a new, distinct case; fall through to the new-pattern prompt.
    NewPattern,
    /// Decline without choosing; skipped with a system-generated reason.
    Decline,
    /// Abort the whole run.
    Abort,
}

/// Raw new-classification input, validated by the resolver.
#[derive(Debug, Clone)]
pub struct NewClassification {
    /// Transaction-level category, independent of the enum's category.
    pub transaction_category: String,
    pub enum_name: String,
    pub patterns: Vec<String>,
    pub enum_category: String,
    /// Merge patterns into an existing enum of the same name instead of
    /// treating the collision as an error.
    pub extend_existing: bool,
}

#[derive(Debug, Clone)]
pub enum ClassificationRequest {
    Provide(NewClassification),
    Skip,
    Abort,
}

/// Synchronous user-interaction adapter. The engine blocks on these calls
/// and is agnostic to whether they are terminal prompts or canned test
/// responses. Input validation stays in the resolver.
pub trait Prompt {
    /// Display hook called once per row before any decision is made.
    fn begin_transaction(&mut self, _txn: &Transaction, _index: usize, _total: usize) {}
    /// Progress feedback (saved, duplicate, auto-classified). Not a decision.
    fn notify(&mut self, _message: &str) {}
    fn present_ambiguous_matches(&mut self, candidates: &[Candidate]) -> AmbiguousChoice;
    fn request_new_classification(&mut self, description: &str, categories: &[String]) -> ClassificationRequest;
    /// `None` means "use the enum's category".
    fn request_transaction_category(&mut self, enum_category: &str, categories: &[String]) -> Option<String>;
    fn request_reason(&mut self, default_reason: &str) -> Option<String>;
    fn request_split_directive(&mut self) -> String;
    fn request_skip_reason(&mut self) -> String;
    /// Shown when the previous answer failed validation, before re-prompting.
    fn reject_input(&mut self, message: &str);
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub enum_id: i64,
    pub enum_category: String,
    pub transaction_category: String,
    pub reason: Option<String>,
    pub splits: Vec<SplitAllocation>,
    pub auto_confirmed: bool,
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Classified(Classification),
    Skipped { reason: String },
    /// Run-scoped abort; nothing was written for the in-flight transaction.
    Aborted,
}

enum State {
    Matching,
    AmbiguousPrompt(Vec<Candidate>),
    NewPatternPrompt,
    /// A chosen enum; `interactive` selects whether category/reason/splits
    /// prompts still run (auto-confirmed matches prompt for nothing).
    Confirmed { candidate: Candidate, interactive: bool },
}

/// Decide one transaction:
/// `Unclassified -> Matching -> {AutoConfirmed | AmbiguousPrompt | NewPatternPrompt}
///  -> Classified | Skipped`.
/// Enum and category writes happen on the way to `Classified`; the
/// transaction row itself is committed by the caller.
pub fn resolve(
    store: &Store,
    prompt: &mut dyn Prompt,
    processor_type: &str,
    txn: &Transaction,
) -> Result<Resolution> {
    let mut state = State::Matching;

    loop {
        state = match state {
            State::Matching => {
                let enums = store.list_enums(processor_type)?;
                let candidates = matcher::find_candidates(&txn.description, &enums);
                if candidates.is_empty() {
                    State::NewPatternPrompt
                } else if matcher::top_is_ambiguous(&candidates) {
                    State::AmbiguousPrompt(candidates)
                } else {
                    State::Confirmed {
                        candidate: candidates.into_iter().next().unwrap(),
                        interactive: false,
                    }
                }
            }

            State::AmbiguousPrompt(candidates) => {
                match prompt.present_ambiguous_matches(&candidates) {
                    AmbiguousChoice::Select(idx) => {
                        let Some(candidate) = candidates.get(idx) else {
                            prompt.reject_input(&format!(
                                "choice {idx} is out of range (0-{})",
                                candidates.len() - 1
                            ));
                            state = State::AmbiguousPrompt(candidates);
                            continue;
                        };
                        State::Confirmed {
                            candidate: candidate.clone(),
                            interactive: true,
                        }
                    }
                    AmbiguousChoice::NewPattern => State::NewPatternPrompt,
                    AmbiguousChoice::Decline => {
                        return Ok(Resolution::Skipped {
                            reason: "ambiguous match left unresolved".to_string(),
                        });
                    }
                    AmbiguousChoice::Abort => return Ok(Resolution::Aborted),
                }
            }

            State::NewPatternPrompt => {
                let categories = store.list_categories()?;
                match prompt.request_new_classification(&txn.description, &categories) {
                    ClassificationRequest::Skip => {
                        let reason = prompt.request_skip_reason();
                        return Ok(Resolution::Skipped { reason });
                    }
                    ClassificationRequest::Abort => return Ok(Resolution::Aborted),
                    ClassificationRequest::Provide(input) => {
                        match learn_enum(store, processor_type, &input) {
                            Ok(enum_rule) => {
                                store.save_category(&input.transaction_category)?;
                                let reason = prompt.request_reason(&format!("Transaction: {}", enum_rule.name));
                                let splits = collect_splits(prompt)?;
                                return Ok(Resolution::Classified(Classification {
                                    enum_id: enum_rule.id.unwrap_or_default(),
                                    enum_category: enum_rule.category,
                                    transaction_category: input.transaction_category.trim().to_lowercase(),
                                    reason,
                                    splits,
                                    auto_confirmed: false,
                                }));
                            }
                            Err(KhataError::Validation(message)) => {
                                prompt.reject_input(&message);
                                State::NewPatternPrompt
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
            }

            State::Confirmed { candidate, interactive } => {
                let enum_rule = candidate.enum_rule;
                if !interactive {
                    // Learning contract: once a pattern is taught, repeat
                    // transactions classify without re-confirmation.
                    return Ok(Resolution::Classified(Classification {
                        enum_id: enum_rule.id.unwrap_or_default(),
                        enum_category: enum_rule.category.clone(),
                        transaction_category: enum_rule.category,
                        reason: None,
                        splits: vec![],
                        auto_confirmed: true,
                    }));
                }
                let categories = store.list_categories()?;
                let transaction_category = match prompt.request_transaction_category(&enum_rule.category, &categories) {
                    Some(name) => {
                        let name = name.trim().to_lowercase();
                        store.save_category(&name)?;
                        name
                    }
                    None => enum_rule.category.clone(),
                };
                let reason = prompt.request_reason(&format!("Transaction: {}", enum_rule.name));
                let splits = collect_splits(prompt)?;
                return Ok(Resolution::Classified(Classification {
                    enum_id: enum_rule.id.unwrap_or_default(),
                    enum_category: enum_rule.category,
                    transaction_category,
                    reason,
                    splits,
                    auto_confirmed: false,
                }));
            }
        };
    }
}

/// Validate a new-classification answer and persist the enum. A name
/// collision is an error unless the user opted to extend the existing enum,
/// in which case new patterns merge in and its category is kept.
fn learn_enum(
    store: &Store,
    processor_type: &str,
    input: &NewClassification,
) -> Result<crate::models::TransactionEnum> {
    let name = input.enum_name.trim();
    if name.is_empty() {
        return Err(KhataError::Validation("enum name must not be empty".to_string()));
    }
    let patterns: Vec<String> = input
        .patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    if patterns.is_empty() {
        return Err(KhataError::Validation(format!(
            "enum '{name}' needs at least one non-empty pattern"
        )));
    }
    if input.transaction_category.trim().len() < 2 {
        return Err(KhataError::Validation(
            "transaction category must be at least 2 characters".to_string(),
        ));
    }

    let existing = store.find_enum(name, processor_type)?;
    if existing.is_some() && !input.extend_existing {
        return Err(KhataError::Validation(format!(
            "enum '{name}' already exists for {processor_type}; choose another name or extend it"
        )));
    }

    let category = match &existing {
        Some(e) => e.category.clone(),
        None => {
            let category = input.enum_category.trim().to_lowercase();
            if category.len() < 2 {
                return Err(KhataError::Validation(
                    "enum category must be at least 2 characters".to_string(),
                ));
            }
            store.save_category(&category)?;
            category
        }
    };

    store.save_enum(name, &patterns, &category, processor_type)
}

/// Re-prompt until the split directive parses.
fn collect_splits(prompt: &mut dyn Prompt) -> Result<Vec<SplitAllocation>> {
    loop {
        let directive = prompt.request_split_directive();
        match splits::parse(&directive) {
            Ok(allocations) => return Ok(allocations),
            Err(KhataError::Validation(message)) => prompt.reject_input(&message),
            Err(e) => return Err(e),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{new_classification, ScriptedPrompt};
    use super::*;

    const PROC: &str = "icici_bank";

    fn seeded_store() -> Store {
        Store::in_memory().unwrap()
    }

    fn txn(description: &str) -> Transaction {
        Transaction {
            id: None,
            fingerprint: "fp".to_string(),
            institution_id: 1,
            processed_file_id: 1,
            date: "2025-01-15".to_string(),
            description: description.to_string(),
            debit_amount: Some(250.0),
            credit_amount: None,
            balance: None,
            reference_number: None,
            currency: "INR".to_string(),
            enum_id: None,
            enum_category: None,
            category: None,
            reason: None,
            is_settled: false,
            splits: vec![],
        }
    }

    #[test]
    fn test_unique_match_auto_confirms_without_prompting() {
        let store = seeded_store();
        store.save_enum("SWIGGY", &["swiggy".to_string()], "food", PROC).unwrap();
        let mut prompt = ScriptedPrompt::default();

        let resolution = resolve(&store, &mut prompt, PROC, &txn("UPI/SWIGGY/ORDER-1")).unwrap();
        let Resolution::Classified(c) = resolution else { panic!("expected classification") };
        assert!(c.auto_confirmed);
        assert_eq!(c.enum_category, "food");
        assert_eq!(c.transaction_category, "food");
        assert!(prompt.ambiguous_seen.is_empty());
    }

    #[test]
    fn test_new_pattern_prompt_learns_enum() {
        let store = seeded_store();
        let mut prompt = ScriptedPrompt::default();
        prompt.classifications.push_back(new_classification("food", "SWIGGY", &["Swiggy"], "food"));
        prompt.reasons.push_back(Some("Food delivery".to_string()));

        let resolution = resolve(&store, &mut prompt, PROC, &txn("UPI/SWIGGY/ORDER-1")).unwrap();
        let Resolution::Classified(c) = resolution else { panic!("expected classification") };
        assert!(!c.auto_confirmed);
        assert_eq!(c.reason.as_deref(), Some("Food delivery"));

        let enums = store.list_enums(PROC).unwrap();
        assert_eq!(enums.len(), 1);
        assert_eq!(enums[0].patterns, vec!["swiggy"]);
        assert!(store.list_categories().unwrap().contains(&"food".to_string()));
    }

    #[test]
    fn test_learned_pattern_auto_matches_next_time() {
        let store = seeded_store();
        let mut prompt = ScriptedPrompt::default();
        prompt.classifications.push_back(new_classification("food", "SWIGGY", &["swiggy"], "food"));
        resolve(&store, &mut prompt, PROC, &txn("UPI/SWIGGY/ORDER-1")).unwrap();

        // Same run, next transaction containing the learned pattern.
        let mut silent = ScriptedPrompt::default();
        let resolution = resolve(&store, &mut silent, PROC, &txn("POS SWIGGY INSTAMART")).unwrap();
        let Resolution::Classified(c) = resolution else { panic!("expected classification") };
        assert!(c.auto_confirmed);
        assert_eq!(c.transaction_category, "food");
    }

    #[test]
    fn test_tied_candidates_surface_as_ambiguous() {
        let store = seeded_store();
        store.save_enum("SWIGGY", &["food12".to_string()], "food", PROC).unwrap();
        store.save_enum("ZOMATO", &["food34".to_string()], "food", PROC).unwrap();
        let mut prompt = ScriptedPrompt::default();
        prompt.ambiguous.push_back(AmbiguousChoice::Select(1));

        let resolution = resolve(&store, &mut prompt, PROC, &txn("PAYMENT food12 food34")).unwrap();
        assert_eq!(prompt.ambiguous_seen, vec![vec!["SWIGGY".to_string(), "ZOMATO".to_string()]]);
        let Resolution::Classified(c) = resolution else { panic!("expected classification") };
        assert!(!c.auto_confirmed);
        let chosen = store.find_enum("ZOMATO", PROC).unwrap().unwrap();
        assert_eq!(c.enum_id, chosen.id.unwrap());
    }

    #[test]
    fn test_ambiguous_decline_skips_with_system_reason() {
        let store = seeded_store();
        store.save_enum("SWIGGY", &["food12".to_string()], "food", PROC).unwrap();
        store.save_enum("ZOMATO", &["food34".to_string()], "food", PROC).unwrap();
        let mut prompt = ScriptedPrompt::default();
        prompt.ambiguous.push_back(AmbiguousChoice::Decline);

        let resolution = resolve(&store, &mut prompt, PROC, &txn("PAYMENT food12 food34")).unwrap();
        let Resolution::Skipped { reason } = resolution else { panic!("expected skip") };
        assert_eq!(reason, "ambiguous match left unresolved");
    }

    #[test]
    fn test_ambiguous_out_of_range_selection_reprompts() {
        let store = seeded_store();
        store.save_enum("SWIGGY", &["food12".to_string()], "food", PROC).unwrap();
        store.save_enum("ZOMATO", &["food34".to_string()], "food", PROC).unwrap();
        let mut prompt = ScriptedPrompt::default();
        prompt.ambiguous.push_back(AmbiguousChoice::Select(7));
        prompt.ambiguous.push_back(AmbiguousChoice::Select(0));

        let resolution = resolve(&store, &mut prompt, PROC, &txn("PAYMENT food12 food34")).unwrap();
        assert!(matches!(resolution, Resolution::Classified(_)));
        assert_eq!(prompt.rejections.len(), 1);
    }

    #[test]
    fn test_dual_category_independence() {
        let store = seeded_store();
        store.save_enum("SWIGGY", &["food12".to_string()], "food", PROC).unwrap();
        store.save_enum("ZOMATO", &["food34".to_string()], "food", PROC).unwrap();
        let mut prompt = ScriptedPrompt::default();
        prompt.ambiguous.push_back(AmbiguousChoice::Select(0));
        prompt.transaction_categories.push_back(Some("friends".to_string()));

        let resolution = resolve(&store, &mut prompt, PROC, &txn("PAYMENT food12 food34")).unwrap();
        let Resolution::Classified(c) = resolution else { panic!("expected classification") };
        assert_eq!(c.transaction_category, "friends");
        assert_eq!(c.enum_category, "food");
        // Enum's own category untouched
        assert_eq!(store.find_enum("SWIGGY", PROC).unwrap().unwrap().category, "food");
    }

    #[test]
    fn test_enum_name_collision_reprompts() {
        let store = seeded_store();
        store.save_enum("SWIGGY", &["swiggy".to_string()], "food", PROC).unwrap();
        let mut prompt = ScriptedPrompt::default();
        // First answer collides, second picks a fresh name.
        prompt.classifications.push_back(new_classification("food", "SWIGGY", &["zomato"], "food"));
        prompt.classifications.push_back(new_classification("food", "ZOMATO", &["zomato"], "food"));

        let resolution = resolve(&store, &mut prompt, PROC, &txn("UPI/ZOMATO/ORDER-1")).unwrap();
        assert!(matches!(resolution, Resolution::Classified(_)));
        assert_eq!(prompt.rejections.len(), 1);
        assert!(prompt.rejections[0].contains("already exists"));
        // Existing enum's patterns were not silently overwritten.
        assert_eq!(store.find_enum("SWIGGY", PROC).unwrap().unwrap().patterns, vec!["swiggy"]);
    }

    #[test]
    fn test_extend_existing_enum_merges_patterns() {
        let store = seeded_store();
        store.save_enum("SWIGGY", &["swiggy".to_string()], "food", PROC).unwrap();
        let mut prompt = ScriptedPrompt::default();
        prompt.classifications.push_back(ClassificationRequest::Provide(NewClassification {
            transaction_category: "food".to_string(),
            enum_name: "SWIGGY".to_string(),
            patterns: vec!["instamart".to_string()],
            enum_category: "ignored".to_string(),
            extend_existing: true,
        }));

        let resolution = resolve(&store, &mut prompt, PROC, &txn("POS INSTAMART 42")).unwrap();
        assert!(matches!(resolution, Resolution::Classified(_)));
        let merged = store.find_enum("SWIGGY", PROC).unwrap().unwrap();
        assert_eq!(merged.patterns, vec!["swiggy", "instamart"]);
        assert_eq!(merged.category, "food");
    }

    #[test]
    fn test_extend_existing_with_case_variant_name() {
        let store = seeded_store();
        store.save_enum("SWIGGY", &["swiggy".to_string()], "food", PROC).unwrap();
        let mut prompt = ScriptedPrompt::default();
        prompt.classifications.push_back(ClassificationRequest::Provide(NewClassification {
            transaction_category: "food".to_string(),
            enum_name: "swiggy".to_string(),
            patterns: vec!["instamart".to_string()],
            enum_category: "ignored".to_string(),
            extend_existing: true,
        }));

        let resolution = resolve(&store, &mut prompt, PROC, &txn("POS INSTAMART 42")).unwrap();
        assert!(matches!(resolution, Resolution::Classified(_)));
        let enums = store.list_enums(PROC).unwrap();
        assert_eq!(enums.len(), 1);
        assert_eq!(enums[0].name, "SWIGGY");
        assert_eq!(enums[0].patterns, vec!["swiggy", "instamart"]);
    }

    #[test]
    fn test_empty_pattern_reprompts() {
        let store = seeded_store();
        let mut prompt = ScriptedPrompt::default();
        prompt.classifications.push_back(new_classification("food", "SWIGGY", &["  "], "food"));
        prompt.classifications.push_back(new_classification("food", "SWIGGY", &["swiggy"], "food"));

        let resolution = resolve(&store, &mut prompt, PROC, &txn("UPI/SWIGGY")).unwrap();
        assert!(matches!(resolution, Resolution::Classified(_)));
        assert_eq!(prompt.rejections.len(), 1);
    }

    #[test]
    fn test_bad_split_directive_reprompts() {
        let store = seeded_store();
        let mut prompt = ScriptedPrompt::default();
        prompt.classifications.push_back(new_classification("food", "SWIGGY", &["swiggy"], "food"));
        prompt.split_directives.push_back("yugam 150".to_string());
        prompt.split_directives.push_back("yugam 50, chintu 25".to_string());

        let resolution = resolve(&store, &mut prompt, PROC, &txn("UPI/SWIGGY")).unwrap();
        let Resolution::Classified(c) = resolution else { panic!("expected classification") };
        assert_eq!(c.splits.len(), 2);
        assert_eq!(prompt.rejections.len(), 1);
    }

    #[test]
    fn test_skip_records_reason() {
        let store = seeded_store();
        let mut prompt = ScriptedPrompt::default();
        prompt.classifications.push_back(ClassificationRequest::Skip);
        prompt.skip_reasons.push_back("not my expense".to_string());

        let resolution = resolve(&store, &mut prompt, PROC, &txn("UNKNOWN VENDOR")).unwrap();
        let Resolution::Skipped { reason } = resolution else { panic!("expected skip") };
        assert_eq!(reason, "not my expense");
        // No enum was created on the skip path.
        assert!(store.list_enums(PROC).unwrap().is_empty());
    }

    #[test]
    fn test_abort_writes_nothing() {
        let store = seeded_store();
        let mut prompt = ScriptedPrompt::default();
        prompt.classifications.push_back(ClassificationRequest::Abort);

        let resolution = resolve(&store, &mut prompt, PROC, &txn("UNKNOWN VENDOR")).unwrap();
        assert!(matches!(resolution, Resolution::Aborted));
        assert!(store.list_enums(PROC).unwrap().is_empty());
    }
}
