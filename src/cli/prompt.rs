use std::io::Write;

use colored::Colorize;

use crate::fmt::money;
use crate::matcher::Candidate;
use crate::models::Transaction;
use crate::resolver::{
    AmbiguousChoice, ClassificationRequest, NewClassification, Prompt,
};

/// Terminal implementation of the user-interaction adapter. Blocks on
/// stdin at every decision point; the engine treats EOF like an abort.
#[derive(Default)]
pub struct TerminalPrompt;

fn read_line(label: &str) -> Option<String> {
    print!("{label}");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn print_category_menu(categories: &[String]) {
    println!("{}", "Categories:".dimmed());
    for (i, name) in categories.iter().enumerate() {
        println!("  {}. {name}", i + 1);
    }
}

/// Number picks from the menu; anything else is a (possibly new) name.
fn category_from_input(input: &str, categories: &[String]) -> Option<String> {
    if let Ok(n) = input.parse::<usize>() {
        if n >= 1 && n <= categories.len() {
            return Some(categories[n - 1].clone());
        }
        return None;
    }
    if input.len() >= 2 {
        return Some(input.to_lowercase());
    }
    None
}

impl Prompt for TerminalPrompt {
    fn begin_transaction(&mut self, txn: &Transaction, index: usize, total: usize) {
        println!();
        println!("{}", format!("Transaction {index} of {total}").bold());
        println!("{}", "-".repeat(50).dimmed());
        println!("  Date:        {}", txn.date);
        println!("  Description: {}", txn.description);
        if let Some(debit) = txn.debit_amount {
            println!("  Amount:      {} (debit)", money(debit, &txn.currency).red());
        }
        if let Some(credit) = txn.credit_amount {
            println!("  Amount:      {} (credit)", money(credit, &txn.currency).green());
        }
        if let Some(balance) = txn.balance {
            println!("  Balance:     {}", money(balance, &txn.currency));
        }
        if let Some(reference) = &txn.reference_number {
            println!("  Reference:   {reference}");
        }
    }

    fn notify(&mut self, message: &str) {
        println!("  {}", message.dimmed());
    }

    fn present_ambiguous_matches(&mut self, candidates: &[Candidate]) -> AmbiguousChoice {
        println!("\n{}", "Multiple patterns match:".yellow());
        for (i, candidate) in candidates.iter().enumerate() {
            println!(
                "  {}. {} ({}) via [{}]",
                i + 1,
                candidate.enum_rule.name,
                candidate.enum_rule.category,
                candidate.matched_patterns.join(", ")
            );
        }
        loop {
            let Some(input) =
                read_line("Choose a number, (n)ew pattern, (s)kip, or (q)uit: ")
            else {
                return AmbiguousChoice::Abort;
            };
            match input.as_str() {
                "n" => return AmbiguousChoice::NewPattern,
                "s" => return AmbiguousChoice::Decline,
                "q" => return AmbiguousChoice::Abort,
                other => {
                    if let Ok(n) = other.parse::<usize>() {
                        if n >= 1 && n <= candidates.len() {
                            return AmbiguousChoice::Select(n - 1);
                        }
                    }
                    println!("{}", "Enter a listed number, n, s, or q.".red());
                }
            }
        }
    }

    fn request_new_classification(
        &mut self,
        description: &str,
        categories: &[String],
    ) -> ClassificationRequest {
        println!("\nNo pattern matches: {description}");
        print_category_menu(categories);

        let transaction_category = loop {
            let Some(input) =
                read_line("Transaction category (number or name, (s)kip, (q)uit): ")
            else {
                return ClassificationRequest::Abort;
            };
            match input.as_str() {
                "s" => return ClassificationRequest::Skip,
                "q" => return ClassificationRequest::Abort,
                other => match category_from_input(other, categories) {
                    Some(name) => break name,
                    None => println!("{}", "Enter a listed number or a name (2+ characters).".red()),
                },
            }
        };

        let Some(enum_name) = read_line("Enum name (prefix with + to extend an existing enum): ")
        else {
            return ClassificationRequest::Abort;
        };
        let (enum_name, extend_existing) = match enum_name.strip_prefix('+') {
            Some(rest) => (rest.to_string(), true),
            None => (enum_name, false),
        };

        let Some(patterns_input) = read_line("Patterns (comma-separated substrings): ") else {
            return ClassificationRequest::Abort;
        };
        let patterns: Vec<String> = patterns_input
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let enum_category = if extend_existing {
            // Kept from the existing enum; the resolver ignores this field.
            String::new()
        } else {
            let Some(input) = read_line(&format!(
                "Enum category [Enter for '{transaction_category}']: "
            )) else {
                return ClassificationRequest::Abort;
            };
            if input.is_empty() {
                transaction_category.clone()
            } else {
                input.to_lowercase()
            }
        };

        ClassificationRequest::Provide(NewClassification {
            transaction_category,
            enum_name,
            patterns,
            enum_category,
            extend_existing,
        })
    }

    fn request_transaction_category(
        &mut self,
        enum_category: &str,
        categories: &[String],
    ) -> Option<String> {
        print_category_menu(categories);
        loop {
            let input = read_line(&format!(
                "Transaction category [Enter for '{enum_category}']: "
            ))?;
            if input.is_empty() {
                return None;
            }
            match category_from_input(&input, categories) {
                Some(name) => return Some(name),
                None => println!("{}", "Enter a listed number or a name (2+ characters).".red()),
            }
        }
    }

    fn request_reason(&mut self, default_reason: &str) -> Option<String> {
        let input = read_line(&format!("Reason [Enter for '{default_reason}']: "))?;
        if input.is_empty() {
            Some(default_reason.to_string())
        } else {
            Some(input)
        }
    }

    fn request_split_directive(&mut self) -> String {
        println!("{}", "Splits, e.g. 'yugam 50, chintu 25' (Enter for none):".dimmed());
        read_line("Splits: ").unwrap_or_default()
    }

    fn request_skip_reason(&mut self) -> String {
        match read_line("Skip reason: ") {
            Some(reason) if !reason.is_empty() => reason,
            _ => "skipped by user".to_string(),
        }
    }

    fn reject_input(&mut self, message: &str) {
        println!("{}", message.red());
    }
}
