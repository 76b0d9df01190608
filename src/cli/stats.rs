use anyhow::Result;

use citynotes::config::CityNotesConfig;

/// Display collection statistics in the terminal.
pub fn stats(config: &CityNotesConfig) -> Result<()> {
    let catalog = super::load_catalog(config)?;
    let store = super::open_store(config)?;
    let all = store.get_all();

    let with_notes = all.iter().filter(|c| !c.notes.trim().is_empty()).count();
    let note_chars: usize = all.iter().map(|c| c.notes.chars().count()).sum();

    println!("Collection Statistics");
    println!("{}", "=".repeat(40));
    println!("  Saved cities:        {}", all.len());
    println!("  With notes:          {with_notes}");
    println!("  Note characters:     {note_chars}");
    println!("  Catalog size:        {}", catalog.len());
    println!("  Storage key:         {}", store.key());

    Ok(())
}
