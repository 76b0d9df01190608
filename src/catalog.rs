//! Read-only city catalog and search.
//!
//! The catalog is a fixed, ordered list of [`CityRecord`]s. [`Catalog::find_best_match`]
//! returns the first city in that order whose English or local name contains the
//! query, case-insensitively. The built-in order is the order of [`BUILTIN_CITIES`]
//! and is part of the contract: it breaks ties between matches.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::collection::CityRecord;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("duplicate city id in catalog: {0}")]
    DuplicateId(String),
}

/// `(id, name, localized name, province, description)`, in search order.
pub const BUILTIN_CITIES: &[(&str, &str, &str, &str, &str)] = &[
    ("ams", "Amsterdam", "Amsterdam", "North Holland", "Capital city, famous for its canals, museums and cycling culture."),
    ("rot", "Rotterdam", "Rotterdam", "South Holland", "Major port city known for bold modern architecture and the Erasmus Bridge."),
    ("dhg", "The Hague", "Den Haag", "South Holland", "Seat of government and home to the International Court of Justice."),
    ("utr", "Utrecht", "Utrecht", "Utrecht", "Medieval old town with wharf-side canals and the Dom Tower."),
    ("ein", "Eindhoven", "Eindhoven", "North Brabant", "Design and technology hub that grew up around Philips."),
    ("gro", "Groningen", "Groningen", "Groningen", "Lively northern student city with the Martinitoren."),
    ("til", "Tilburg", "Tilburg", "North Brabant", "Former textile city, now known for its fair and pop venues."),
    ("alm", "Almere", "Almere", "Flevoland", "One of the youngest cities, built on reclaimed land."),
    ("bre", "Breda", "Breda", "North Brabant", "Historic garrison town with a grand Gothic church."),
    ("nij", "Nijmegen", "Nijmegen", "Gelderland", "Claims to be the oldest city, founded by the Romans on the Waal."),
    ("har", "Haarlem", "Haarlem", "North Holland", "Compact historic centre close to the dunes and the sea."),
    ("arn", "Arnhem", "Arnhem", "Gelderland", "Green city near the Veluwe and the Open Air Museum."),
    ("ens", "Enschede", "Enschede", "Overijssel", "University city in Twente near the German border."),
    ("amf", "Amersfoort", "Amersfoort", "Utrecht", "Well preserved medieval walls and the Koppelpoort gate."),
    ("zwo", "Zwolle", "Zwolle", "Overijssel", "Hanseatic city with a star-shaped moat."),
    ("ley", "Leiden", "Leiden", "South Holland", "Oldest university in the country and birthplace of Rembrandt."),
    ("maa", "Maastricht", "Maastricht", "Limburg", "Southern city with a Burgundian feel on the river Meuse."),
    ("del", "Delft", "Delft", "South Holland", "Known for Delftware pottery and Vermeer."),
    ("dbo", "'s-Hertogenbosch", "Den Bosch", "North Brabant", "Birthplace of Hieronymus Bosch, famous for the Bossche bol."),
    ("lee", "Leeuwarden", "Leeuwarden", "Friesland", "Frisian capital with the leaning Oldehove tower."),
    ("gou", "Gouda", "Gouda", "South Holland", "Cheese market town with a Gothic city hall."),
    ("dev", "Deventer", "Deventer", "Overijssel", "Hanseatic city hosting a large Dickens festival."),
];

#[derive(Debug, Clone)]
pub struct Catalog {
    cities: Vec<CityRecord>,
}

impl Catalog {
    /// The built-in Dutch city list.
    pub fn builtin() -> Self {
        let cities = BUILTIN_CITIES
            .iter()
            .map(|(id, name, localized, province, description)| {
                CityRecord::new(*id, *name)
                    .with_localized_name(*localized)
                    .with_province(*province)
                    .with_description(*description)
            })
            .collect();
        Self { cities }
    }

    /// Build a catalog from records in search order. Notes are cleared.
    pub fn new(cities: Vec<CityRecord>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut cleaned = Vec::with_capacity(cities.len());
        for mut city in cities {
            if !seen.insert(city.id.clone()) {
                return Err(CatalogError::DuplicateId(city.id));
            }
            city.notes.clear();
            cleaned.push(city);
        }
        Ok(Self { cities: cleaned })
    }

    /// Load a catalog from a JSON array of city records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cities: Vec<CityRecord> =
            serde_json::from_str(&contents).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), count = cities.len(), "custom catalog loaded");
        Self::new(cities)
    }

    /// First city (in catalog order) whose name or localized name contains
    /// `query`, ignoring case. Blank queries match nothing.
    pub fn find_best_match(&self, query: &str) -> Option<&CityRecord> {
        if query.trim().is_empty() {
            return None;
        }
        let needle = query.to_lowercase();
        self.cities.iter().find(|city| {
            city.name.to_lowercase().contains(&needle)
                || city
                    .localized_name
                    .as_deref()
                    .is_some_and(|local| local.to_lowercase().contains(&needle))
        })
    }

    pub fn get(&self, id: &str) -> Option<&CityRecord> {
        self.cities.iter().find(|city| city.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CityRecord> {
        self.cities.iter()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
