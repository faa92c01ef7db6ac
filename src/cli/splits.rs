use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::settings::{self, load_settings};
use crate::store::Store;

/// Who owes what across all unsettled splits, largest balance first.
pub fn run() -> Result<()> {
    let cfg = load_settings();
    let store = Store::open(&settings::db_path())?;
    let people = store.unsettled_splits_by_person()?;

    if people.is_empty() {
        println!("No unsettled splits.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Person", "Owed", "Splits"]);
    let mut total = 0.0;
    for (person, owed, count) in &people {
        total += owed;
        table.add_row(vec![
            Cell::new(person),
            Cell::new(money(*owed, &cfg.default_currency)).set_alignment(CellAlignment::Right),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(money(total, &cfg.default_currency)).set_alignment(CellAlignment::Right),
        Cell::new(""),
    ]);
    println!("{table}");
    Ok(())
}
