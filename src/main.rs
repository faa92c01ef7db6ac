mod cli;
mod db;
mod dedup;
mod error;
mod extractor;
mod fingerprint;
mod fmt;
mod matcher;
mod models;
mod pipeline;
mod resolver;
mod settings;
mod splits;
mod store;

use clap::Parser;

use cli::{CategoriesCommands, Cli, Commands, EnumsCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Process {
            file,
            processor,
            reprocess_skipped,
        } => cli::process::run(&file, processor.as_deref(), reprocess_skipped),
        Commands::Enums { command } => match command {
            EnumsCommands::Add {
                name,
                patterns,
                category,
                processor,
            } => cli::enums::add(&name, &patterns, &category, &processor),
            EnumsCommands::List { processor } => cli::enums::list(&processor),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name } => cli::categories::add(&name),
            CategoriesCommands::List => cli::categories::list(),
        },
        Commands::Splits => cli::splits::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
