use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

use crate::error::Result;
use crate::settings;
use crate::store::Store;

pub fn add(name: &str) -> Result<()> {
    std::fs::create_dir_all(settings::get_data_dir())?;
    let store = Store::open(&settings::db_path())?;
    store.save_category(name)?;
    println!("{} category '{}'", "Saved".green(), name.trim().to_lowercase());
    Ok(())
}

pub fn list() -> Result<()> {
    let store = Store::open(&settings::db_path())?;
    let categories = store.list_categories()?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Category"]);
    for name in &categories {
        table.add_row(vec![name]);
    }
    println!("{table}");
    Ok(())
}
