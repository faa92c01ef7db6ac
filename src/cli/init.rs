use std::io::Write;
use std::path::PathBuf;

use colored::Colorize;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();

    match data_dir {
        Some(dir) => settings.data_dir = expand_home(&dir),
        None => {
            print!("Data directory [{}]: ", settings.data_dir);
            let _ = std::io::stdout().flush();
            let mut input = String::new();
            std::io::stdin().read_line(&mut input).ok();
            let chosen = input.trim();
            if !chosen.is_empty() {
                settings.data_dir = expand_home(chosen);
            }
        }
    }
    save_settings(&settings)?;

    let data_dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let db = data_dir.join("khata.db");
    let conn = get_connection(&db)?;
    init_db(&conn)?;

    println!("{} database at {}", "Initialized".green(), db.display());
    println!("Next: 'khata process <statement.csv>' to classify a statement.");
    Ok(())
}

fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}
