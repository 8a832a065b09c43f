//! Event channel factory and handles.

use super::types::TxEvent;
use tokio::sync::mpsc;

/// Default buffer size for the event channel.
///
/// Enough to absorb ingest bursts while keeping memory bounded; producers
/// back-pressure once the watcher pool falls this far behind.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for transaction events.
pub type TxEventSender = mpsc::Sender<TxEvent>;
/// Receiver handle for transaction events.
pub type TxEventReceiver = mpsc::Receiver<TxEvent>;

/// Create a new transaction event channel with the given buffer size.
///
/// Multiple producers can be cloned from the returned sender; the stream is
/// considered closed once every sender is dropped.
pub fn tx_event_channel(buffer: usize) -> (TxEventSender, TxEventReceiver) {
    mpsc::channel(buffer)
}
