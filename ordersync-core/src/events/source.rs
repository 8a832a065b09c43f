//! The event source abstraction and its in-process implementation.

use super::channels::{TxEventReceiver, TxEventSender, tx_event_channel};
use super::types::{SourceError, TxEvent};
use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, watch};

/// An ordered, offset-addressed stream of transaction events.
///
/// Mirrors the consumer surface of a partitioned message queue: a blocking
/// event pull, an asynchronous error channel, and an explicit offset commit.
/// Handles are shared across the watcher pool's workers, so all methods take
/// `&self`.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Pull the next event. `None` means the stream is closed and no further
    /// events will arrive.
    async fn next(&self) -> Option<TxEvent>;

    /// Receive the next transport-level error. `None` means the error
    /// channel is closed.
    async fn next_error(&self) -> Option<SourceError>;

    /// Durably record a consumed offset with the source.
    async fn commit(&self, offset: i64) -> Result<(), SourceError>;
}

/// In-process event source backed by tokio channels.
///
/// Producers feed it through a [`ChannelSourceHandle`]; committed offsets are
/// published on a `watch` channel so the producer side can observe consumer
/// progress.
pub struct ChannelEventSource {
    events: Mutex<TxEventReceiver>,
    errors: Mutex<mpsc::Receiver<SourceError>>,
    committed: watch::Sender<i64>,
}

/// Producer-side handle paired with a [`ChannelEventSource`].
#[derive(Clone)]
pub struct ChannelSourceHandle {
    event_tx: TxEventSender,
    error_tx: mpsc::Sender<SourceError>,
    committed_rx: watch::Receiver<i64>,
}

impl ChannelEventSource {
    /// Create a source and its producer handle with the given event buffer
    /// (clamped to at least one).
    pub fn new(buffer: usize) -> (Self, ChannelSourceHandle) {
        let buffer = buffer.max(1);
        let (event_tx, event_rx) = tx_event_channel(buffer);
        let (error_tx, error_rx) = mpsc::channel(buffer);
        let (committed_tx, committed_rx) = watch::channel(i64::MIN);

        let source = Self {
            events: Mutex::new(event_rx),
            errors: Mutex::new(error_rx),
            committed: committed_tx,
        };
        let handle = ChannelSourceHandle {
            event_tx,
            error_tx,
            committed_rx,
        };
        (source, handle)
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn next(&self) -> Option<TxEvent> {
        self.events.lock().await.recv().await
    }

    async fn next_error(&self) -> Option<SourceError> {
        self.errors.lock().await.recv().await
    }

    async fn commit(&self, offset: i64) -> Result<(), SourceError> {
        self.committed.send_replace(offset);
        Ok(())
    }
}

impl ChannelSourceHandle {
    /// Push an event into the stream. Returns `false` if the consumer side
    /// is gone.
    pub async fn send(&self, event: TxEvent) -> bool {
        self.event_tx.send(event).await.is_ok()
    }

    /// Report a transport-level error to the consumer.
    pub async fn report_error(&self, error: SourceError) -> bool {
        self.error_tx.send(error).await.is_ok()
    }

    /// The highest offset committed by the consumer so far, `i64::MIN`
    /// before the first commit.
    pub fn committed(&self) -> i64 {
        *self.committed_rx.borrow()
    }

    /// Clone of the raw event sender, for producers that only push events.
    pub fn sender(&self) -> TxEventSender {
        self.event_tx.clone()
    }

    /// A watch receiver over committed offsets, usable independently of the
    /// handle's lifetime.
    pub fn committed_watch(&self) -> watch::Receiver<i64> {
        self.committed_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_events_in_order() {
        let (source, handle) = ChannelEventSource::new(8);

        assert!(handle.send(TxEvent::new("0xaa", 1)).await);
        assert!(handle.send(TxEvent::new("0xbb", 2)).await);
        drop(handle);

        assert_eq!(source.next().await, Some(TxEvent::new("0xaa", 1)));
        assert_eq!(source.next().await, Some(TxEvent::new("0xbb", 2)));
        assert_eq!(source.next().await, None);
    }

    #[tokio::test]
    async fn records_committed_offsets() {
        let (source, handle) = ChannelEventSource::new(8);

        assert_eq!(handle.committed(), i64::MIN);
        source.commit(7).await.ok();
        assert_eq!(handle.committed(), 7);
    }

    #[tokio::test]
    async fn forwards_transport_errors() {
        let (source, handle) = ChannelEventSource::new(8);

        handle
            .report_error(SourceError::Transport("broker gone".into()))
            .await;
        let err = source.next_error().await;
        assert!(matches!(err, Some(SourceError::Transport(_))));
    }
}
