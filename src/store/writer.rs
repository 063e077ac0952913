//! Single writer for the durable store.
//!
//! Persisting is a whole-snapshot replace, so two writers that each read a
//! snapshot, add their own key, and write it back would lose one of the keys.
//! Every mutation therefore goes through one task. The merge base is the hot
//! cache at the time of the write, which contains every record resolved so
//! far. Before the first save the task makes sure the durable entries have
//! been hydrated into it; while the snapshot cannot be read, writes are held
//! back and retried on the next command.
//!
//! Queued `Persist` signals are coalesced, so a burst of resolutions results
//! in one write that contains all of them. A failed save stays pending.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::{DurableStore, Hydration};
use crate::cache::HotCache;
use crate::error_handling::{CacheEvent, CacheStats};

enum WriterCommand {
    /// The hot cache changed and should be persisted.
    Persist,
    /// Acknowledge once every earlier command has been written.
    Flush(oneshot::Sender<()>),
}

/// Handle to the durable writer task.
///
/// Cheap to clone. The task stops once every handle has been dropped and the
/// queue is drained.
#[derive(Clone)]
pub struct DurableWriter {
    tx: mpsc::UnboundedSender<WriterCommand>,
}

impl DurableWriter {
    /// Spawns the writer task on the current tokio runtime.
    pub fn spawn(
        store: Arc<dyn DurableStore>,
        cache: Arc<HotCache>,
        stats: Arc<CacheStats>,
        hydration: Arc<Hydration>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(rx, store, cache, stats, hydration));
        Self { tx }
    }

    /// Schedules a write of the current hot cache contents.
    pub fn persist(&self) {
        if self.tx.send(WriterCommand::Persist).is_err() {
            log::warn!("Durable writer is not running; geo cache update not persisted");
        }
    }

    /// Waits until every write scheduled before this call has been attempted.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriterCommand::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }
}

async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<WriterCommand>,
    store: Arc<dyn DurableStore>,
    cache: Arc<HotCache>,
    stats: Arc<CacheStats>,
    hydration: Arc<Hydration>,
) {
    let mut dirty = false;
    while let Some(first) = rx.recv().await {
        let mut acks = Vec::new();

        let mut next = Some(first);
        while let Some(command) = next {
            match command {
                WriterCommand::Persist => dirty = true,
                WriterCommand::Flush(ack) => acks.push(ack),
            }
            next = rx.try_recv().ok();
        }

        if dirty {
            if let Err(e) = hydration.ensure(&*store, &cache, &stats).await {
                stats.increment(CacheEvent::StoreWriteFailed);
                log::warn!(
                    "Holding back geo cache write to {}: stored snapshot unreadable: {}",
                    store.describe(),
                    e
                );
                for ack in acks {
                    let _ = ack.send(());
                }
                continue;
            }

            let snapshot = cache.snapshot();
            match store.save_all(&snapshot).await {
                Ok(()) => {
                    dirty = false;
                    stats.increment(CacheEvent::StoreWrite);
                    log::debug!(
                        "Persisted {} geo cache entries to {}",
                        snapshot.len(),
                        store.describe()
                    );
                }
                Err(e) => {
                    stats.increment(CacheEvent::StoreWriteFailed);
                    log::warn!("Failed to persist geo cache to {}: {}", store.describe(), e);
                }
            }
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }
    log::debug!("Durable writer for {} stopped", store.describe());
}
