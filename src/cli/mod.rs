pub mod doctor;
pub mod edit;
pub mod export;
pub mod import;
pub mod list;
pub mod reset;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use std::sync::Arc;

use citynotes::catalog::Catalog;
use citynotes::collection::{Advisory, CollectionStore, LoadOutcome};
use citynotes::config::CityNotesConfig;
use citynotes::storage::SqliteBackend;

/// Open the configured database and load the saved collection.
///
/// An unreadable collection is reported on stderr and the command continues
/// with an empty list.
pub fn open_store(config: &CityNotesConfig) -> Result<CollectionStore> {
    let db_path = config.resolved_db_path();
    let backend = Arc::new(SqliteBackend::open(&db_path)?);
    let (store, outcome) =
        CollectionStore::initialize(backend, config.storage.collection_key.as_str());

    if let LoadOutcome::Unreadable(advisory) = &outcome {
        report_advisory(advisory);
        eprintln!(
            "The unreadable data was kept under `{}.corrupt`.",
            config.storage.collection_key
        );
    }

    Ok(store)
}

/// Built-in catalog, or the configured JSON file.
pub fn load_catalog(config: &CityNotesConfig) -> Result<Catalog> {
    match config.resolved_catalog_path() {
        Some(path) => Catalog::from_json_file(&path).context("failed to load custom catalog"),
        None => Ok(Catalog::builtin()),
    }
}

pub fn report_advisory(advisory: &Advisory) {
    eprintln!("Warning: {advisory}");
}

/// Wait for queued writes and report any failures. Fails the command if the
/// latest state could not be written.
pub async fn finish(store: &mut CollectionStore) -> Result<()> {
    store.flush().await;
    let advisories = store.drain_advisories();
    for advisory in &advisories {
        report_advisory(advisory);
    }
    anyhow::ensure!(
        !store.has_unsaved_changes(),
        "changes could not be saved to disk"
    );
    Ok(())
}

/// Single-line preview of notes, truncated on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
