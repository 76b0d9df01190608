use anyhow::{Context, Result};
use std::path::Path;

use citynotes::collection::CollectionState;
use citynotes::config::CityNotesConfig;

/// Import saved cities from a JSON export.
///
/// Records are added oldest first so the file's order is kept. Ids already in
/// the collection are skipped; their notes are not overwritten.
pub async fn import(config: &CityNotesConfig, file: &Path) -> Result<()> {
    let bytes = std::fs::read(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;
    let data = CollectionState::from_json(&bytes).context("failed to parse import JSON")?;

    let mut store = super::open_store(config)?;

    println!("Importing {} cities...", data.len());

    let mut imported = 0u64;
    let mut skipped = 0u64;
    for city in data.iter().rev() {
        match store.add(city.clone()) {
            Some(_) => imported += 1,
            None => skipped += 1,
        }
    }

    super::finish(&mut store).await?;

    println!("Import complete:");
    println!("  Cities imported: {imported}");
    println!("  Cities skipped:  {skipped} (already saved)");
    Ok(())
}
