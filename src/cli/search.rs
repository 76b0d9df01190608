use anyhow::Result;

use citynotes::collection::CityRecord;
use citynotes::config::CityNotesConfig;

/// Print the best catalog match for `query`.
pub fn search(config: &CityNotesConfig, query: &str) -> Result<()> {
    let catalog = super::load_catalog(config)?;

    match catalog.find_best_match(query) {
        Some(city) => print_city(city),
        None => println!("No city found."),
    }
    Ok(())
}

/// Save the best catalog match for `query` to the collection.
pub async fn save(config: &CityNotesConfig, query: &str) -> Result<()> {
    let catalog = super::load_catalog(config)?;
    let Some(city) = catalog.find_best_match(query) else {
        println!("No city found.");
        return Ok(());
    };

    let mut store = super::open_store(config)?;
    match store.add(city.clone()) {
        Some(_) => println!("Saved {} ({}).", city.name, city.id),
        None => println!("{} is already in your list.", city.name),
    }

    super::finish(&mut store).await
}

fn print_city(city: &CityRecord) {
    println!("Found: {} [{}]", city.name, city.id);
    if let Some(local) = city.localized_name.as_deref().filter(|l| *l != city.name) {
        println!("  Local name: {local}");
    }
    if let Some(ref province) = city.province {
        println!("  Province:   {province}");
    }
    if let Some(ref description) = city.description {
        println!("  {description}");
    }
}
