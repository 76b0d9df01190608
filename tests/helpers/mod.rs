#![allow(dead_code)]

use citynotes::autosave::{AutosavePolicy, ManualClock, NotesEditor};
use citynotes::collection::{
    CityRecord, CollectionState, CollectionStore, LoadOutcome, DEFAULT_COLLECTION_KEY,
};
use citynotes::storage::{KeyValueBackend, MemoryBackend};
use std::sync::Arc;
use std::time::Duration;

/// Fresh store over an empty in-memory backend. Needs a Tokio runtime.
pub fn memory_store() -> (CollectionStore, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let (store, outcome) = CollectionStore::initialize(backend.clone(), DEFAULT_COLLECTION_KEY);
    assert_eq!(outcome, LoadOutcome::Empty);
    (store, backend)
}

/// Editor on a virtual clock with the default 1000 ms / 500 ms policy.
pub fn manual_editor() -> (NotesEditor<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let editor = NotesEditor::with_clock(clock.clone(), AutosavePolicy::default());
    (editor, clock)
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

pub fn amsterdam() -> CityRecord {
    CityRecord::new("ams", "Amsterdam").with_province("North Holland")
}

pub fn rotterdam() -> CityRecord {
    CityRecord::new("rot", "Rotterdam").with_province("South Holland")
}

pub fn utrecht() -> CityRecord {
    CityRecord::new("utr", "Utrecht").with_province("Utrecht")
}

/// Decode whatever is persisted under the default key.
pub fn persisted(backend: &dyn KeyValueBackend) -> Option<CollectionState> {
    backend
        .get(DEFAULT_COLLECTION_KEY)
        .unwrap()
        .map(|bytes| CollectionState::from_json(&bytes).unwrap())
}

pub fn ids(state: &CollectionState) -> Vec<String> {
    state.iter().map(|r| r.id.clone()).collect()
}
