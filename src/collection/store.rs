//! The collection store: single source of truth for saved cities and notes.
//!
//! All operations are synchronous and run on the caller's context. Each
//! mutation replaces the in-memory snapshot, notifies subscribers, and queues a
//! full-snapshot write on the [`WriteQueue`]. The in-memory state is always the
//! newest data whether or not the matching write has landed.

use std::sync::Arc;

use super::types::{Advisory, CityRecord, CollectionState, LoadOutcome, WriteTicket};
use super::writer::{WriteProgress, WriteQueue};
use crate::storage::KeyValueBackend;

/// Versioned storage key for the persisted collection.
pub const DEFAULT_COLLECTION_KEY: &str = "cityCollection.v2";

/// Handle returned by [`CollectionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&CollectionState) + Send>;

pub struct CollectionStore {
    key: String,
    state: CollectionState,
    writer: WriteQueue,
    last_enqueued: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl CollectionStore {
    /// Load the persisted collection under `key` and start the writer task.
    ///
    /// Never fails: an unreadable payload (or a backend read error) yields an
    /// empty collection and [`LoadOutcome::Unreadable`]. A corrupt payload is
    /// copied to `<key>.corrupt` first so later writes cannot destroy it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn initialize(backend: Arc<dyn KeyValueBackend>, key: impl Into<String>) -> (Self, LoadOutcome) {
        let key = key.into();
        let (state, outcome) = load_collection(backend.as_ref(), &key);
        let writer = WriteQueue::spawn(backend, key.clone());

        let store = Self {
            key,
            state,
            writer,
            last_enqueued: 0,
            subscribers: Vec::new(),
            next_subscription: 0,
        };
        (store, outcome)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current snapshot. Cheap to clone and immutable.
    pub fn get_all(&self) -> CollectionState {
        self.state.clone()
    }

    /// Look up a saved record. Missing ids are simply `None`.
    pub fn get(&self, id: &str) -> Option<&CityRecord> {
        self.state.get(id)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Save `record` at the front of the collection.
    ///
    /// Returns `None` without scheduling a write if the id is already saved.
    pub fn add(&mut self, record: CityRecord) -> Option<WriteTicket> {
        if self.state.contains(&record.id) {
            tracing::debug!(id = %record.id, "city already saved");
            return None;
        }

        let id = record.id.clone();
        let mut records = Vec::with_capacity(self.state.len() + 1);
        records.push(record);
        records.extend(self.state.iter().cloned());

        let ticket = self.commit(records);
        tracing::info!(id = %id, seq = ticket.seq(), "city saved");
        Some(ticket)
    }

    /// Remove the record with `id`. Absent ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<WriteTicket> {
        if !self.state.contains(id) {
            tracing::debug!(id, "remove of unsaved city ignored");
            return None;
        }

        let records = self.state.iter().filter(|r| r.id != id).cloned().collect();
        let ticket = self.commit(records);
        tracing::info!(id, seq = ticket.seq(), "city removed");
        Some(ticket)
    }

    /// Replace the notes of `id`, keeping its other fields and position.
    /// Absent ids are a no-op (the record may have been removed meanwhile).
    pub fn update_notes(&mut self, id: &str, notes: &str) -> Option<WriteTicket> {
        let position = self.state.iter().position(|r| r.id == id);
        let Some(position) = position else {
            tracing::debug!(id, "notes update for unsaved city ignored");
            return None;
        };

        let mut records = self.state.to_vec();
        records[position].notes = notes.to_string();

        let ticket = self.commit(records);
        tracing::debug!(id, seq = ticket.seq(), chars = notes.chars().count(), "notes updated");
        Some(ticket)
    }

    /// Register a callback invoked with every new snapshot.
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&CollectionState) + Send + 'static,
    ) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Drop a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// `true` once the snapshot carrying `ticket` (or a later one) is on disk.
    pub fn is_durable(&self, ticket: WriteTicket) -> bool {
        self.writer.progress().applied >= ticket.0
    }

    /// `true` while the newest snapshot has not been durably written.
    pub fn has_unsaved_changes(&self) -> bool {
        self.writer.progress().applied < self.last_enqueued
    }

    /// Ticket of the newest snapshot handed to the writer, if any.
    pub fn last_ticket(&self) -> Option<WriteTicket> {
        (self.last_enqueued > 0).then_some(WriteTicket(self.last_enqueued))
    }

    pub fn write_progress(&self) -> WriteProgress {
        self.writer.progress()
    }

    /// Re-queue the current snapshot after a failed write.
    /// Returns `None` if no write is currently failing.
    pub fn retry(&mut self) -> Option<WriteTicket> {
        let failed = self.writer.progress().failed?;
        tracing::info!(failed, "retrying durable write");
        Some(self.schedule_write())
    }

    /// Wait until every write queued so far has been attempted.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// The newest write failure since the last call. Older unseen failures are
    /// superseded, so this holds at most one advisory.
    pub fn drain_advisories(&mut self) -> Vec<Advisory> {
        self.writer.drain_advisories()
    }

    fn commit(&mut self, records: Vec<CityRecord>) -> WriteTicket {
        self.state = CollectionState::from_records(records);
        let ticket = self.schedule_write();

        let state = &self.state;
        for (_, callback) in self.subscribers.iter_mut() {
            callback(state);
        }
        ticket
    }

    fn schedule_write(&mut self) -> WriteTicket {
        self.last_enqueued += 1;
        let seq = self.last_enqueued;
        match self.state.to_json() {
            Ok(payload) => self.writer.enqueue(seq, payload),
            Err(e) => tracing::error!(seq, error = %e, "failed to encode collection snapshot"),
        }
        WriteTicket(seq)
    }
}

fn load_collection(backend: &dyn KeyValueBackend, key: &str) -> (CollectionState, LoadOutcome) {
    let bytes = match backend.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::info!(key, "no saved collection yet; starting empty");
            return (CollectionState::default(), LoadOutcome::Empty);
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read saved collection; starting empty");
            let advisory = Advisory::UnreadablePersistedState {
                reason: e.to_string(),
            };
            return (CollectionState::default(), LoadOutcome::Unreadable(advisory));
        }
    };

    match CollectionState::from_json(&bytes) {
        Ok(state) => {
            tracing::info!(key, count = state.len(), "saved collection loaded");
            let count = state.len();
            (state, LoadOutcome::Restored { count })
        }
        Err(e) => {
            tracing::warn!(key, bytes = bytes.len(), error = %e, "saved collection is corrupt; starting empty");
            preserve_corrupt(backend, &format!("{key}.corrupt"), &bytes);
            let advisory = Advisory::UnreadablePersistedState {
                reason: e.to_string(),
            };
            (CollectionState::default(), LoadOutcome::Unreadable(advisory))
        }
    }
}

/// Copy a corrupt payload aside. An existing backup is never overwritten: it
/// holds the oldest unreadable data and has not been recovered yet.
fn preserve_corrupt(backend: &dyn KeyValueBackend, backup_key: &str, bytes: &[u8]) {
    match backend.get(backup_key) {
        Ok(Some(existing)) => {
            tracing::warn!(
                key = %backup_key,
                kept = existing.len(),
                dropped = bytes.len(),
                "earlier corrupt payload already preserved; leaving it in place"
            );
            return;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(key = %backup_key, error = %e, "could not check for an earlier backup");
            return;
        }
    }

    match backend.set(backup_key, bytes) {
        Ok(()) => tracing::info!(key = %backup_key, "corrupt payload preserved"),
        Err(e) => tracing::warn!(key = %backup_key, error = %e, "could not preserve corrupt payload"),
    }
}
