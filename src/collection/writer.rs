//! Single-writer durable write queue.
//!
//! Snapshots are pushed onto an unbounded channel and drained by one Tokio
//! task, so backend writes land in the order mutations were issued. When
//! several snapshots are waiting, only the newest is written: each snapshot is
//! the full collection, so the older ones are already superseded.
//!
//! Only the newest unseen write failure is kept for the store to report; a
//! session whose advisories are never drained holds at most one.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use super::types::Advisory;
use crate::storage::KeyValueBackend;

enum WriteJob {
    Snapshot { seq: u64, payload: Vec<u8> },
    Flush(oneshot::Sender<()>),
}

/// Writer progress as seen by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteProgress {
    /// Highest snapshot sequence durably written.
    pub applied: u64,
    /// Sequence of the last failed write, cleared by a later success.
    pub failed: Option<u64>,
}

pub(crate) struct WriteQueue {
    jobs: mpsc::UnboundedSender<WriteJob>,
    progress: watch::Receiver<WriteProgress>,
    advisories: watch::Receiver<Option<Advisory>>,
}

impl WriteQueue {
    /// Start the writer task. Must be called from within a Tokio runtime.
    pub(crate) fn spawn(backend: Arc<dyn KeyValueBackend>, key: String) -> Self {
        let (jobs, job_rx) = mpsc::unbounded_channel();
        let (progress_tx, progress) = watch::channel(WriteProgress::default());
        let (advisory_tx, advisories) = watch::channel(None);

        tokio::spawn(run_writer(backend, key, job_rx, progress_tx, advisory_tx));

        Self {
            jobs,
            progress,
            advisories,
        }
    }

    pub(crate) fn enqueue(&self, seq: u64, payload: Vec<u8>) {
        if self.jobs.send(WriteJob::Snapshot { seq, payload }).is_err() {
            tracing::error!(seq, "writer task has stopped; snapshot not persisted");
        }
    }

    /// Wait until every job queued before this call has been attempted.
    pub(crate) async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.jobs.send(WriteJob::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    pub(crate) fn progress(&self) -> WriteProgress {
        *self.progress.borrow()
    }

    /// The latest failure not yet returned, if any.
    pub(crate) fn drain_advisories(&mut self) -> Vec<Advisory> {
        if !self.advisories.has_changed().unwrap_or(false) {
            return Vec::new();
        }
        self.advisories.borrow_and_update().iter().cloned().collect()
    }
}

async fn run_writer(
    backend: Arc<dyn KeyValueBackend>,
    key: String,
    mut jobs: mpsc::UnboundedReceiver<WriteJob>,
    progress: watch::Sender<WriteProgress>,
    advisories: watch::Sender<Option<Advisory>>,
) {
    let mut carried: Option<WriteJob> = None;

    loop {
        let job = match carried.take() {
            Some(job) => job,
            None => match jobs.recv().await {
                Some(job) => job,
                None => break,
            },
        };

        match job {
            WriteJob::Flush(done) => {
                let _ = done.send(());
            }
            WriteJob::Snapshot {
                mut seq,
                mut payload,
            } => {
                // Coalesce consecutive snapshots; a flush marker stops the scan
                // and is handled after this write.
                while let Ok(next) = jobs.try_recv() {
                    match next {
                        WriteJob::Snapshot {
                            seq: next_seq,
                            payload: next_payload,
                        } => {
                            tracing::trace!(skipped = seq, next = next_seq, "coalescing snapshot");
                            seq = next_seq;
                            payload = next_payload;
                        }
                        flush @ WriteJob::Flush(_) => {
                            carried = Some(flush);
                            break;
                        }
                    }
                }

                write_snapshot(&backend, &key, seq, payload, &progress, &advisories).await;
            }
        }
    }

    tracing::debug!(key = %key, "writer task finished");
}

async fn write_snapshot(
    backend: &Arc<dyn KeyValueBackend>,
    key: &str,
    seq: u64,
    payload: Vec<u8>,
    progress: &watch::Sender<WriteProgress>,
    advisories: &watch::Sender<Option<Advisory>>,
) {
    let bytes = payload.len();
    let backend = Arc::clone(backend);
    let owned_key = key.to_string();
    let result = tokio::task::spawn_blocking(move || backend.set(&owned_key, &payload))
        .await
        .map_err(|e| format!("write task failed: {e}"))
        .and_then(|r| r.map_err(|e| e.to_string()));

    match result {
        Ok(()) => {
            tracing::debug!(key, seq, bytes, "collection snapshot persisted");
            progress.send_modify(|p| {
                p.applied = p.applied.max(seq);
                if p.failed.is_some_and(|failed| failed <= seq) {
                    p.failed = None;
                }
            });
        }
        Err(reason) => {
            tracing::warn!(key, seq, error = %reason, "durable write failed; keeping in-memory state");
            progress.send_modify(|p| p.failed = Some(seq));
            advisories.send_replace(Some(Advisory::DurableWriteFailure { seq, reason }));
        }
    }
}
