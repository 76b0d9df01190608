//! CLI `doctor` command — run database diagnostics and print a health report.

use anyhow::{Context, Result};

use citynotes::collection::CollectionState;
use citynotes::config::CityNotesConfig;
use citynotes::db;
use citynotes::storage::{KeyValueBackend, SqliteBackend};

/// Run database diagnostics and print a health report.
pub fn doctor(config: &CityNotesConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `citynotes save <city>` to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let backend =
        SqliteBackend::open(&db_path).context("failed to open database (may be corrupt)")?;
    let report = backend
        .with_connection(db::check_database_health)
        .context("failed to run health check")?;

    let key = &config.storage.collection_key;
    let payload = backend.get(key)?;
    let backup = backend.get(&format!("{key}.corrupt"))?;

    println!("CityNotes Health Report");
    println!("=======================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Collection `{key}`:");
    match payload {
        None => println!("  Status:          not saved yet"),
        Some(bytes) => match CollectionState::from_json(&bytes) {
            Ok(state) => println!("  Status:          OK ({} cities, {})", state.len(), format_bytes(bytes.len() as u64)),
            Err(e) => println!("  Status:          UNREADABLE ({e})"),
        },
    }
    if backup.is_some() {
        println!("  Preserved corrupt payload under `{key}.corrupt`.");
    }
    println!();
    println!("Row counts:");
    println!("  Entries:         {}", report.entry_count);
    println!("  Write log:       {}", report.write_count);
    if let Some(ref last) = report.last_write_at {
        println!("  Last write:      {last}");
    }
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.citynotes/citynotes.db");
        println!("  2. Or export from a good copy and reimport:");
        println!("     citynotes export > backup.json");
        println!("     citynotes reset && citynotes import backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
