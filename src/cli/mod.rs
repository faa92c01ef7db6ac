pub mod categories;
pub mod enums;
pub mod init;
pub mod process;
pub mod prompt;
pub mod splits;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "khata", about = "Interactive bank-statement classifier with pattern learning.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up khata: choose a data directory and initialize the database.
    Init {
        /// Path for khata data (default: ~/Documents/khata)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Process a statement export: dedup, classify, and save transactions.
    Process {
        /// Path to the statement file (CSV, or XLS/XLSX with the xlsx feature)
        file: String,
        /// Processor key (e.g. icici_bank); auto-detected when omitted
        #[arg(long)]
        processor: Option<String>,
        /// Re-prompt for previously skipped transactions this run
        #[arg(long = "reprocess-skipped")]
        reprocess_skipped: bool,
    },
    /// Manage pattern-matching enums.
    Enums {
        #[command(subcommand)]
        command: EnumsCommands,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Show unsettled split balances by person.
    Splits,
    /// Show database location and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum EnumsCommands {
    /// Add an enum or merge new patterns into an existing one.
    Add {
        /// Enum name, e.g. SWIGGY
        name: String,
        /// Comma-separated substring patterns, e.g. 'swiggy,instamart'
        #[arg(long)]
        patterns: String,
        /// Category to associate with this enum
        #[arg(long)]
        category: String,
        /// Processor scope (default: icici_bank)
        #[arg(long, default_value = "icici_bank")]
        processor: String,
    },
    /// List enums for a processor.
    List {
        #[arg(long, default_value = "icici_bank")]
        processor: String,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add {
        /// Category name, e.g. food
        name: String,
    },
    /// List all categories.
    List,
}
