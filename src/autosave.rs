//! Debounced notes autosave.
//!
//! [`NotesEditor`] turns a stream of keystroke-level edits on the open record
//! into occasional [`CollectionStore::update_notes`] calls:
//!
//! - **Clean**: the draft equals the last durably written text
//! - **Pending**: the draft changed; a quiet-period deadline is armed and every
//!   edit pushes it back (debounce, not throttle)
//! - **Writing**: the deadline passed and the notes were handed to the store;
//!   the editor reports Clean only once the write is durable *and* the
//!   visible-latency floor has elapsed. A failed write is re-queued by the
//!   next `tick`, so the editor stays in Writing until the backend accepts it
//!
//! The editor is polled: timers are deadlines checked against an injected
//! [`Clock`] in [`NotesEditor::tick`], so cancelling one on close or switch is a
//! plain state change that cannot race a timer mid-fire.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::collection::{CollectionStore, WriteTicket};

/// Time source for the editor.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += by;
        }
    }

    /// Jump to `at` after the origin. Never moves backwards.
    pub fn set(&self, at: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed = (*elapsed).max(at);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or_default()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

/// Timing knobs for autosave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosavePolicy {
    /// Quiet period after the last edit before the notes are written.
    pub debounce: Duration,
    /// Minimum time spent in Writing before Clean is reported.
    pub saved_floor: Duration,
    /// How often a write that is not yet durable is checked (and retried
    /// after a failure) once the floor has passed.
    pub retry_interval: Duration,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(1000),
            saved_floor: Duration::from_millis(500),
            retry_interval: Duration::from_millis(1000),
        }
    }
}

/// Save state of the open record, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing is open.
    Idle,
    Clean,
    Pending,
    Writing,
}

impl SaveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Clean => "All changes saved",
            Self::Pending => "Unsaved changes",
            Self::Writing => "Saving...",
        }
    }
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Clean,
    Pending { deadline: Instant },
    Writing { ticket: WriteTicket, visible_after: Instant },
}

#[derive(Debug)]
struct Session {
    id: String,
    draft: String,
    /// Last text known to be durable.
    saved: String,
    /// Text handed to the store by the current write.
    in_flight: String,
    phase: Phase,
}

pub struct NotesEditor<C: Clock = SystemClock> {
    clock: C,
    policy: AutosavePolicy,
    session: Option<Session>,
}

impl NotesEditor<SystemClock> {
    pub fn new(policy: AutosavePolicy) -> Self {
        Self::with_clock(SystemClock, policy)
    }
}

impl<C: Clock> NotesEditor<C> {
    pub fn with_clock(clock: C, policy: AutosavePolicy) -> Self {
        Self {
            clock,
            policy,
            session: None,
        }
    }

    /// Open `id` for editing. Pending edits on the previously open record are
    /// written first. Returns `false` (and leaves nothing open) if `id` is not saved.
    ///
    /// If the store still has writes that are not durable, the record opens in
    /// Writing on the newest of them rather than Clean.
    pub fn open(&mut self, store: &mut CollectionStore, id: &str) -> bool {
        self.close(store);

        let Some(record) = store.get(id) else {
            tracing::debug!(id, "cannot open notes for unsaved city");
            return false;
        };

        let (phase, in_flight) = match store.last_ticket() {
            Some(ticket) if store.has_unsaved_changes() => {
                tracing::debug!(id, seq = ticket.seq(), "opened while a write is outstanding");
                let phase = Phase::Writing {
                    ticket,
                    visible_after: self.clock.now() + self.policy.saved_floor,
                };
                (phase, record.notes.clone())
            }
            _ => (Phase::Clean, String::new()),
        };

        self.session = Some(Session {
            id: record.id.clone(),
            draft: record.notes.clone(),
            saved: record.notes.clone(),
            in_flight,
            phase,
        });
        tracing::debug!(id, "notes opened");
        true
    }

    /// Close the open record, cancelling its timer. Pending edits are written
    /// immediately rather than dropped.
    pub fn close(&mut self, store: &mut CollectionStore) -> Option<WriteTicket> {
        let session = self.session.take()?;
        match session.phase {
            Phase::Pending { .. } => {
                tracing::info!(id = %session.id, "flushing pending notes on close");
                store.update_notes(&session.id, &session.draft)
            }
            Phase::Clean | Phase::Writing { .. } => None,
        }
    }

    /// Replace the draft. Re-arms the debounce deadline unless the text is back
    /// to what is already saved. Returns `false` if nothing is open.
    pub fn edit(&mut self, text: impl Into<String>) -> bool {
        let now = self.clock.now();
        let debounce = self.policy.debounce;
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        session.draft = text.into();
        let settled = !matches!(session.phase, Phase::Writing { .. });
        session.phase = if settled && session.draft == session.saved {
            Phase::Clean
        } else {
            Phase::Pending {
                deadline: now + debounce,
            }
        };
        true
    }

    /// Advance the state machine. Returns the ticket of a write issued by this
    /// call, including a retry of a failed one.
    pub fn tick(&mut self, store: &mut CollectionStore) -> Option<WriteTicket> {
        let now = self.clock.now();
        let saved_floor = self.policy.saved_floor;
        let session = self.session.as_mut()?;

        match session.phase {
            Phase::Clean => None,
            Phase::Pending { deadline } if now < deadline => None,
            Phase::Pending { .. } => match store.update_notes(&session.id, &session.draft) {
                Some(ticket) => {
                    tracing::debug!(id = %session.id, seq = ticket.seq(), "autosave write issued");
                    session.in_flight = session.draft.clone();
                    session.phase = Phase::Writing {
                        ticket,
                        visible_after: now + saved_floor,
                    };
                    Some(ticket)
                }
                None => {
                    tracing::debug!(id = %session.id, "open city was removed; discarding draft");
                    session.saved = session.draft.clone();
                    session.phase = Phase::Clean;
                    None
                }
            },
            Phase::Writing {
                ticket,
                visible_after,
            } => {
                if store.is_durable(ticket) {
                    if now >= visible_after {
                        session.saved = std::mem::take(&mut session.in_flight);
                        session.phase = Phase::Clean;
                    }
                    return None;
                }

                let failed = store.write_progress().failed;
                if !failed.is_some_and(|seq| seq >= ticket.seq()) {
                    return None;
                }
                let retry = store.retry()?;
                tracing::info!(id = %session.id, failed = ticket.seq(), seq = retry.seq(), "autosave write retried");
                session.phase = Phase::Writing {
                    ticket: retry,
                    visible_after,
                };
                Some(retry)
            }
        }
    }

    pub fn status(&self) -> SaveStatus {
        match self.session.as_ref().map(|s| s.phase) {
            None => SaveStatus::Idle,
            Some(Phase::Clean) => SaveStatus::Clean,
            Some(Phase::Pending { .. }) => SaveStatus::Pending,
            Some(Phase::Writing { .. }) => SaveStatus::Writing,
        }
    }

    /// When the next `tick` can change state, if anything is armed. Always in
    /// the future while Writing, even if the write is slow or failing.
    pub fn next_wakeup(&self) -> Option<Instant> {
        match self.session.as_ref()?.phase {
            Phase::Clean => None,
            Phase::Pending { deadline } => Some(deadline),
            Phase::Writing { visible_after, .. } => {
                let now = self.clock.now();
                if now < visible_after {
                    Some(visible_after)
                } else {
                    Some(now + self.policy.retry_interval)
                }
            }
        }
    }

    pub fn open_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn draft(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.draft.as_str())
    }

    pub fn policy(&self) -> AutosavePolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CityRecord, DEFAULT_COLLECTION_KEY};
    use crate::storage::MemoryBackend;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn setup() -> (CollectionStore, ManualClock, NotesEditor<ManualClock>) {
        let backend = Arc::new(MemoryBackend::new());
        let (mut store, _) = CollectionStore::initialize(backend, DEFAULT_COLLECTION_KEY);
        store.add(CityRecord::new("ams", "Amsterdam"));
        let clock = ManualClock::new();
        let editor = NotesEditor::with_clock(clock.clone(), AutosavePolicy::default());
        (store, clock, editor)
    }

    #[test]
    fn manual_clock_is_shared_and_monotonic() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = clock.now();
        other.advance(ms(250));
        assert_eq!(clock.now() - start, ms(250));
        clock.set(ms(100));
        assert_eq!(clock.elapsed(), ms(250));
    }

    #[tokio::test]
    async fn nothing_open_is_idle() {
        let (mut store, _, mut editor) = setup();
        assert_eq!(editor.status(), SaveStatus::Idle);
        assert!(!editor.edit("text"));
        assert!(editor.tick(&mut store).is_none());
        assert!(editor.next_wakeup().is_none());
    }

    #[tokio::test]
    async fn open_unknown_id_fails() {
        let (mut store, _, mut editor) = setup();
        assert!(!editor.open(&mut store, "nope"));
        assert!(editor.open_id().is_none());
    }

    #[tokio::test]
    async fn edit_back_to_saved_text_is_clean() {
        let (mut store, _, mut editor) = setup();
        editor.open(&mut store, "ams");
        editor.edit("x");
        assert_eq!(editor.status(), SaveStatus::Pending);
        editor.edit("");
        assert_eq!(editor.status(), SaveStatus::Clean);
    }

    #[tokio::test]
    async fn writing_waits_for_floor_and_durability() {
        let (mut store, clock, mut editor) = setup();
        editor.open(&mut store, "ams");
        editor.edit("canals");

        clock.advance(ms(1000));
        let ticket = editor.tick(&mut store).unwrap();
        assert_eq!(editor.status(), SaveStatus::Writing);
        assert_eq!(store.get("ams").unwrap().notes, "canals");

        store.flush().await;
        assert!(store.is_durable(ticket));

        clock.advance(ms(499));
        editor.tick(&mut store);
        assert_eq!(editor.status(), SaveStatus::Writing);

        clock.advance(ms(1));
        editor.tick(&mut store);
        assert_eq!(editor.status(), SaveStatus::Clean);
    }

    #[tokio::test]
    async fn removed_record_drops_draft_quietly() {
        let (mut store, clock, mut editor) = setup();
        editor.open(&mut store, "ams");
        editor.edit("orphan");
        store.remove("ams");

        clock.advance(ms(1000));
        assert!(editor.tick(&mut store).is_none());
        assert_eq!(editor.status(), SaveStatus::Clean);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn wakeup_moves_forward_while_write_is_outstanding() {
        let (mut store, clock, mut editor) = setup();
        editor.open(&mut store, "ams");
        editor.edit("slow disk");
        clock.advance(ms(1000));
        editor.tick(&mut store).unwrap();

        clock.advance(ms(800));
        let now = clock.now();
        assert_eq!(editor.next_wakeup(), Some(now + ms(1000)));
    }

    #[tokio::test]
    async fn close_flushes_pending() {
        let (mut store, _, mut editor) = setup();
        editor.open(&mut store, "ams");
        editor.edit("bikes");
        assert!(editor.close(&mut store).is_some());
        assert_eq!(store.get("ams").unwrap().notes, "bikes");
        assert_eq!(editor.status(), SaveStatus::Idle);
    }
}
