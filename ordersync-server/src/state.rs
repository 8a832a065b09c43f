//! Application state shared across all request handlers.

use ordersync_core::events::{TxEvent, TxEventSender};
use sqlx::PgPool;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Producer side of the watcher's event stream.
    pub ingest: IngestHandle,
}

impl AppState {
    /// Create a new AppState with the given database pool and ingest handle.
    pub fn new(db: PgPool, ingest: IngestHandle) -> Self {
        Self { db, ingest }
    }
}

/// Feeds transaction events into the watcher pool, assigning each one the
/// next stream offset.
#[derive(Clone)]
pub struct IngestHandle {
    events: TxEventSender,
    next_offset: Arc<AtomicI64>,
}

impl IngestHandle {
    pub fn new(events: TxEventSender) -> Self {
        Self {
            events,
            next_offset: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Publish a transaction id to the stream. Returns the assigned offset,
    /// or `None` when the watcher pool is no longer consuming.
    pub async fn publish(&self, tx_id: String) -> Option<i64> {
        let offset = self.next_offset.fetch_add(1, Ordering::SeqCst);
        self.events.send(TxEvent::new(tx_id, offset)).await.ok()?;
        Some(offset)
    }
}
