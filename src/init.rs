//! Project initialization for evergreen
//!
//! `evergreen init` creates the .evergreen directory, a starter config,
//! and the database.

use crate::db::Database;
use colored::Colorize;
use std::fs;
use std::path::Path;

/// Starter config written on init
const STARTER_CONFIG: &str = r#"# Evergreen configuration

[contacts]
# Days between touches for contacts without an explicit cadence
default_cadence_days = 30

[dashboard]
# Trailing windows (in days) shown for completion rates
windows = [7, 30, 90]

# Extra classification rules, tried before the built-in ones.
# [[capture.rules]]
# pattern = "gift idea"
# category = "idea"
"#;

/// Create the .evergreen directory, starter config, and database.
pub fn run_init(base: &Path) -> std::io::Result<()> {
    let evergreen_dir = base.join(".evergreen");

    if !evergreen_dir.exists() {
        fs::create_dir_all(&evergreen_dir)?;
        println!("{} {}", "Created".green(), evergreen_dir.display());
    } else {
        println!("{} {}", "Exists".dimmed(), evergreen_dir.display());
    }

    let config_path = evergreen_dir.join("config.toml");
    if !config_path.exists() {
        fs::write(&config_path, STARTER_CONFIG)?;
        println!("{} {}", "Created".green(), config_path.display());
    } else {
        println!("{} {}", "Exists".dimmed(), config_path.display());
    }

    // Materialize the database (honors EVERGREEN_DB_PATH)
    let db_path = Database::db_path();
    Database::open()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    println!("{} {}", "Database".green(), db_path.display());

    println!();
    println!("{}", "Evergreen is ready. Next steps:".bold());
    println!("  evergreen habit add read");
    println!("  evergreen log read");
    println!("  evergreen dashboard");

    Ok(())
}
