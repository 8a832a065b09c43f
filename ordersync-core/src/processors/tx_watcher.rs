//! TxWatcher processor.
//!
//! The TxWatcher is responsible for:
//! - Spawning a fixed pool of workers off one shared event source
//! - Invoking the reconciler for each event's transaction id
//! - Logging and continuing on per-event failures (one bad transaction must
//!   not halt the pool)
//! - Committing consumed offsets monotonically through a shared watermark
//! - Draining the source's error channel in a background task
//!
//! Offset commits advance regardless of reconciliation outcome, so delivery
//! is at-least-once rather than exactly-once: a crash before the mark causes
//! a harmless idempotent re-run, a crash after it loses the retry for that
//! one event. Fan-out across workers also gives up relative event ordering,
//! which is safe because reconciliation of distinct tx ids is commutative.

use crate::events::{EventSource, TxEvent};
use crate::reconciler::Reconciler;
use crate::store::ReconcilerStore;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

/// Worker pool consuming transaction events and reconciling them.
pub struct TxWatcher<S, E> {
    reconciler: Arc<Reconciler<S>>,
    source: Arc<E>,
    handlers: usize,
    /// Highest offset committed so far. Mutated only inside the lock, and
    /// the commit call stays inside the critical section so commits reach
    /// the source in increasing order.
    marked: Arc<Mutex<i64>>,
}

impl<S, E> TxWatcher<S, E>
where
    S: ReconcilerStore + 'static,
    E: EventSource + 'static,
{
    /// Create a watcher with `handlers` workers (clamped to at least one).
    pub fn new(reconciler: Reconciler<S>, source: E, handlers: usize) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            source: Arc::new(source),
            handlers: handlers.max(1),
            marked: Arc::new(Mutex::new(i64::MIN)),
        }
    }

    /// Run the pool until the stream closes or shutdown is signaled.
    ///
    /// Blocks for the process lifetime in normal operation. All in-flight
    /// workers are awaited before returning, so events already pulled are
    /// drained rather than dropped.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) {
        info!(handlers = self.handlers, "TxWatcher started");

        let mut workers = Vec::with_capacity(self.handlers);
        for worker_id in 0..self.handlers {
            let reconciler = self.reconciler.clone();
            let source = self.source.clone();
            let marked = self.marked.clone();
            let shutdown_rx = shutdown_rx.clone();
            workers.push(tokio::spawn(async move {
                worker_loop(worker_id, reconciler, source, marked, shutdown_rx).await;
            }));
        }

        let drain = tokio::spawn(drain_source_errors(self.source.clone(), shutdown_rx));

        for worker in workers {
            if let Err(e) = worker.await {
                error!(error = %e, "worker task failed");
            }
        }
        if let Err(e) = drain.await {
            error!(error = %e, "error drain task failed");
        }

        info!("TxWatcher shutdown complete");
    }
}

/// One worker: pull, reconcile, commit, repeat.
async fn worker_loop<S, E>(
    worker_id: usize,
    reconciler: Arc<Reconciler<S>>,
    source: Arc<E>,
    marked: Arc<Mutex<i64>>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    S: ReconcilerStore,
    E: EventSource,
{
    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                // A dropped sender counts as shutdown.
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!(worker_id, "worker received shutdown signal");
                    break;
                }
            }

            maybe_event = source.next() => {
                let Some(event) = maybe_event else {
                    debug!(worker_id, "event stream closed");
                    break;
                };

                match reconciler.reconcile(&event.key).await {
                    Ok(outcome) => {
                        debug!(worker_id, tx_id = %event.key, outcome = ?outcome, "reconciled");
                    }
                    Err(e) => {
                        error!(worker_id, tx_id = %event.key, error = %e, "failed to reconcile");
                    }
                }

                // Committed even when reconciliation failed: availability of
                // the pool over per-event durability.
                commit_event(source.as_ref(), &marked, &event).await;
            }
        }
    }
}

/// Advance the shared watermark and commit, if this event moves it forward.
async fn commit_event<E: EventSource>(source: &E, marked: &Mutex<i64>, event: &TxEvent) {
    let mut marked = marked.lock().await;
    if event.offset > *marked {
        *marked = event.offset;
        if let Err(e) = source.commit(event.offset).await {
            warn!(offset = event.offset, error = %e, "offset commit failed");
        }
    }
}

/// Log transport errors from the source. Best effort only; source-level
/// errors never stop the workers.
async fn drain_source_errors<E: EventSource>(source: Arc<E>, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }

            maybe_error = source.next_error() => {
                match maybe_error {
                    Some(e) => error!(error = %e, "event source error"),
                    None => break,
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::transaction::TxRecord;
    use crate::events::{ChannelEventSource, SourceError};
    use crate::store::memory::MemoryStore;
    use rust_decimal::Decimal;
    use std::sync::atomic::Ordering;
    use time::macros::datetime;

    fn tx(tx_id: &str) -> TxRecord {
        TxRecord {
            tx_id: tx_id.to_owned(),
            from_address: "0x1".to_owned(),
            to_address: "0x2".to_owned(),
            asset: "eth".to_owned(),
            value: Decimal::ONE,
            block_height: 7,
            created_at: datetime!(2024-05-01 12:00:00),
        }
    }

    #[tokio::test]
    async fn commits_the_maximum_offset_across_workers() {
        let store = Arc::new(MemoryStore::new());
        let (source, handle) = ChannelEventSource::new(16);
        let committed = handle.committed_watch();

        let watcher = TxWatcher::new(Reconciler::new(store), source, 4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let pool = tokio::spawn(watcher.run(shutdown_rx));

        // Out of order across workers; the final committed offset must still
        // be the maximum seen.
        for offset in [3, 1, 4, 2] {
            assert!(handle.send(TxEvent::new("0xnope", offset)).await);
        }
        drop(handle);

        pool.await.unwrap();
        assert_eq!(*committed.borrow(), 4);
    }

    #[tokio::test]
    async fn store_errors_do_not_halt_the_pool() {
        let store = Arc::new(MemoryStore::new());
        store.add_transaction(tx("0xgood"));
        store.track_wallet("0x2");
        store.fail.store(true, Ordering::SeqCst);

        let (source, handle) = ChannelEventSource::new(16);
        let committed = handle.committed_watch();

        let watcher = TxWatcher::new(Reconciler::new(store.clone()), source, 1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let pool = tokio::spawn(watcher.run(shutdown_rx));

        // First event fails at the store but is still committed.
        assert!(handle.send(TxEvent::new("0xgood", 1)).await);
        while handle.committed() < 1 {
            tokio::task::yield_now().await;
        }
        assert!(store.orders_for("0xgood").is_empty());

        // Once the store recovers, later deliveries reconcile normally.
        store.fail.store(false, Ordering::SeqCst);
        assert!(handle.send(TxEvent::new("0xgood", 2)).await);
        drop(handle);

        pool.await.unwrap();
        assert_eq!(*committed.borrow(), 2);
        assert_eq!(store.orders_for("0xgood").len(), 1);
    }

    #[tokio::test]
    async fn redelivered_events_never_duplicate_orders() {
        let store = Arc::new(MemoryStore::new());
        store.add_transaction(tx("0xabc"));
        store.track_wallet("0x2");

        let (source, handle) = ChannelEventSource::new(16);

        let watcher = TxWatcher::new(Reconciler::new(store.clone()), source, 2);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let pool = tokio::spawn(watcher.run(shutdown_rx));

        // The same event delivered three times, as a source may do after an
        // uncommitted restart.
        for _ in 0..3 {
            assert!(handle.send(TxEvent::new("0xabc", 9)).await);
        }
        drop(handle);

        pool.await.unwrap();
        let orders = store.orders_for("0xabc");
        assert_eq!(orders.len(), 1);
        assert!(orders[0].confirmed_at.is_some());
    }

    #[tokio::test]
    async fn shutdown_stops_an_open_stream() {
        let store = Arc::new(MemoryStore::new());
        let (source, handle) = ChannelEventSource::new(16);

        let watcher = TxWatcher::new(Reconciler::new(store), source, 3);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let pool = tokio::spawn(watcher.run(shutdown_rx));

        // Stream stays open (handle alive); only the signal ends the pool.
        shutdown_tx.send(true).unwrap();
        pool.await.unwrap();
        drop(handle);
    }

    #[tokio::test]
    async fn transport_errors_are_drained_without_stopping_workers() {
        let store = Arc::new(MemoryStore::new());
        store.add_transaction(tx("0xabc"));
        store.track_wallet("0x2");

        let (source, handle) = ChannelEventSource::new(16);

        let watcher = TxWatcher::new(Reconciler::new(store.clone()), source, 1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let pool = tokio::spawn(watcher.run(shutdown_rx));

        assert!(
            handle
                .report_error(SourceError::Transport("broker unreachable".into()))
                .await
        );
        assert!(handle.send(TxEvent::new("0xabc", 1)).await);
        drop(handle);

        pool.await.unwrap();
        assert_eq!(store.orders_for("0xabc").len(), 1);
    }
}
