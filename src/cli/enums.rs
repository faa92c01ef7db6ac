use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Table};

use crate::error::Result;
use crate::extractor;
use crate::settings;
use crate::store::Store;

pub fn add(name: &str, patterns: &str, category: &str, processor: &str) -> Result<()> {
    // Validates the key; the enum is scoped to this processor.
    let processor = extractor::get_by_key(processor)?;

    std::fs::create_dir_all(settings::get_data_dir())?;
    let store = Store::open(&settings::db_path())?;
    store.save_category(category)?;

    let parsed: Vec<String> = patterns
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let saved = store.save_enum(name, &parsed, &category.trim().to_lowercase(), processor.key())?;

    println!(
        "{} {} ({}) with patterns [{}]",
        "Saved".green(),
        saved.name.bold(),
        saved.category,
        saved.patterns.join(", ")
    );
    Ok(())
}

pub fn list(processor: &str) -> Result<()> {
    let processor = extractor::get_by_key(processor)?;
    let store = Store::open(&settings::db_path())?;
    let enums = store.list_enums(processor.key())?;

    if enums.is_empty() {
        println!("No enums for {} yet. Add one with 'khata enums add'.", processor.key());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Name", "Category", "Patterns"]);
    for e in &enums {
        table.add_row(vec![
            Cell::new(&e.name),
            Cell::new(&e.category),
            Cell::new(e.patterns.join(", ")),
        ]);
    }
    println!("{table}");
    Ok(())
}
