use anyhow::Result;

use citynotes::config::CityNotesConfig;

/// Export the saved collection as JSON to stdout.
pub fn export(config: &CityNotesConfig) -> Result<()> {
    let store = super::open_store(config)?;
    let all = store.get_all();

    let json = serde_json::to_string_pretty(&all)?;
    println!("{json}");

    eprintln!("Exported {} saved cities.", all.len());
    Ok(())
}
