//! CLI `reset` command — delete the saved collection after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use citynotes::config::CityNotesConfig;
use citynotes::storage::SqliteBackend;

/// Delete the saved collection after user confirmation.
pub fn reset(config: &CityNotesConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let key = &config.storage.collection_key;

    println!("WARNING: This will permanently delete ALL saved cities and notes.");
    println!("Database: {}", db_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    let backend = SqliteBackend::open(&db_path)?;
    let removed = backend.delete(key)?;
    backend.delete(&format!("{key}.corrupt"))?;

    if removed {
        println!("Saved cities deleted. Reset complete.");
    } else {
        println!("Nothing was saved. Reset complete.");
    }
    Ok(())
}
