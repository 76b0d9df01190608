//! CLI `list`, `remove` and `notes` commands.

use anyhow::Result;

use citynotes::config::CityNotesConfig;

/// Print the saved cities, most recently added first.
pub fn list(config: &CityNotesConfig) -> Result<()> {
    let store = super::open_store(config)?;
    let all = store.get_all();

    if all.is_empty() {
        println!("Your list is empty.");
        return Ok(());
    }

    for (i, city) in all.iter().enumerate() {
        let province = city.province.as_deref().unwrap_or("-");
        println!("  {}. {} [{}] ({})", i + 1, city.name, city.id, province);
        if !city.notes.is_empty() {
            println!("     {}", super::preview(&city.notes, 80));
        }
    }
    Ok(())
}

pub async fn remove(config: &CityNotesConfig, id: &str) -> Result<()> {
    let mut store = super::open_store(config)?;
    match store.remove(id) {
        Some(_) => println!("Removed {id}."),
        None => println!("{id} is not in your list; nothing to remove."),
    }
    super::finish(&mut store).await
}

pub async fn notes(config: &CityNotesConfig, id: &str, text: &str) -> Result<()> {
    let mut store = super::open_store(config)?;
    match store.update_notes(id, text) {
        Some(_) => println!("Notes saved for {id}."),
        None => println!("{id} is not in your list; save it first."),
    }
    super::finish(&mut store).await
}
