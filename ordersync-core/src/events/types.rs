//! Event type definitions.

use thiserror::Error;

/// A queued notification that a transaction was confirmed on chain.
///
/// Events carry identifiers rather than full data; the reconciler re-fetches
/// current state from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEvent {
    /// Transaction id (the event key).
    pub key: String,
    /// Source-assigned position within the partition, monotonically
    /// non-decreasing per consumer. Used to resume consumption after restart.
    pub offset: i64,
}

impl TxEvent {
    pub fn new(key: impl Into<String>, offset: i64) -> Self {
        Self {
            key: key.into(),
            offset,
        }
    }
}

/// Errors reported by an event source.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Asynchronous transport-level error from the underlying stream.
    #[error("transport error: {0}")]
    Transport(String),

    /// An offset commit was not accepted.
    #[error("commit failed: {0}")]
    Commit(String),
}
