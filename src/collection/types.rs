//! Collection data model.
//!
//! Defines [`CityRecord`] (a saved city plus its notes), [`CollectionState`]
//! (the immutable ordered snapshot handed to subscribers and persisted as JSON),
//! [`Advisory`] (non-fatal signals), [`LoadOutcome`] and [`WriteTicket`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

/// A city record. `id` is the identity; `notes` is the only field a user edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityRecord {
    /// Stable identifier assigned by the catalog.
    pub id: String,
    /// Display name (English).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text notes. Missing or `null` on the wire reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
    /// Name in the local language, e.g. "Den Haag" for "The Hague".
    #[serde(default, alias = "dutchName", skip_serializing_if = "Option::is_none")]
    pub localized_name: Option<String>,
}

impl CityRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            province: None,
            description: None,
            notes: String::new(),
            localized_name: None,
        }
    }

    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.province = Some(province.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_localized_name(mut self, name: impl Into<String>) -> Self {
        self.localized_name = Some(name.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered, immutable snapshot of the saved cities (most recently added first).
///
/// Cloning is cheap: the records are shared behind an `Arc`, and nothing holding
/// a snapshot can mutate the store's copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionState(Arc<[CityRecord]>);

impl CollectionState {
    pub fn from_records(records: Vec<CityRecord>) -> Self {
        Self(Arc::from(records))
    }

    pub fn get(&self, id: &str) -> Option<&CityRecord> {
        self.0.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// `true` if both snapshots share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Encode as the persisted JSON array.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decode a persisted JSON array. Later duplicates of an id are dropped so
    /// the uniqueness invariant holds even for hand-edited payloads.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let records: Vec<CityRecord> = serde_json::from_slice(bytes)?;
        let mut seen = HashSet::new();
        let unique: Vec<CityRecord> = records
            .into_iter()
            .filter(|r| seen.insert(r.id.clone()))
            .collect();
        Ok(Self::from_records(unique))
    }
}

impl Default for CollectionState {
    fn default() -> Self {
        Self::from_records(Vec::new())
    }
}

impl Deref for CollectionState {
    type Target = [CityRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Serialize for CollectionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CollectionState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<CityRecord>::deserialize(deserializer).map(Self::from_records)
    }
}

/// Non-fatal signal surfaced to the caller. Never aborts the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Advisory {
    #[error("saved cities could not be read ({reason}); continuing with an empty list")]
    UnreadablePersistedState { reason: String },
    #[error("saving failed ({reason}); changes are kept in memory and will be retried")]
    DurableWriteFailure { seq: u64, reason: String },
}

/// What [`CollectionStore::initialize`](super::CollectionStore::initialize) found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing persisted yet (first run).
    Empty,
    /// Payload decoded.
    Restored { count: usize },
    /// Payload present but unreadable; the session starts empty.
    Unreadable(Advisory),
}

impl LoadOutcome {
    pub fn advisory(&self) -> Option<&Advisory> {
        match self {
            Self::Unreadable(advisory) => Some(advisory),
            _ => None,
        }
    }
}

/// Sequence number of the snapshot a mutation was scheduled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WriteTicket(pub(crate) u64);

impl WriteTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_and_skips_absent_fields() {
        let record = CityRecord::new("dh", "The Hague").with_localized_name("Den Haag");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "dh", "name": "The Hague", "notes": "", "localizedName": "Den Haag"})
        );
    }

    #[test]
    fn tolerant_decoding() {
        let payload = br#"[
            {"id": "ams", "name": "Amsterdam", "notes": null, "population": 921402},
            {"id": "dh", "name": "The Hague", "dutchName": "Den Haag"}
        ]"#;
        let state = CollectionState::from_json(payload).unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state[0].notes, "");
        assert_eq!(state[1].localized_name.as_deref(), Some("Den Haag"));
        assert!(state[1].province.is_none());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let payload = br#"[
            {"id": "ams", "name": "Amsterdam", "notes": "first"},
            {"id": "ams", "name": "Amsterdam", "notes": "second"}
        ]"#;
        let state = CollectionState::from_json(payload).unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].notes, "first");
    }

    #[test]
    fn rejects_non_array_payload() {
        assert!(CollectionState::from_json(b"{\"id\": \"ams\"}").is_err());
        assert!(CollectionState::from_json(b"not json").is_err());
        assert!(CollectionState::from_json(br#"[{"name": "no id"}]"#).is_err());
    }

    #[test]
    fn clones_share_allocation() {
        let state = CollectionState::from_records(vec![CityRecord::new("ams", "Amsterdam")]);
        let clone = state.clone();
        assert!(state.ptr_eq(&clone));
        assert!(!state.ptr_eq(&CollectionState::from_records(state.to_vec())));
    }
}
