//! Long-running processors.
//!
//! - `TxWatcher`: consumes the transaction event stream, drives the
//!   reconciler, and commits consumed offsets back to the source.

pub mod tx_watcher;

pub use tx_watcher::TxWatcher;
