//! Event stream infrastructure for the reconciliation engine.
//!
//! The engine consumes an abstract ordered stream of transaction-key events
//! through the [`EventSource`] trait. The in-tree implementation is backed
//! by tokio channels and fed by the server's ingest bridge; a message-queue
//! client would implement the same trait out of tree.

pub mod channels;
pub mod source;
pub mod types;

pub use channels::{DEFAULT_CHANNEL_BUFFER, TxEventReceiver, TxEventSender, tx_event_channel};
pub use source::{ChannelEventSource, ChannelSourceHandle, EventSource};
pub use types::{SourceError, TxEvent};
