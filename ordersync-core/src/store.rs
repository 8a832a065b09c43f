//! Store abstraction consumed by the reconciliation engine.
//!
//! The engine issues exactly four operations against the relational store.
//! They are lifted into a trait so the decision logic can run against the
//! Postgres-backed [`PgStore`] in production and an in-memory store in tests.

use crate::entities::order::{NewOrder, Order};
use crate::entities::transaction::TxRecord;
use crate::entities::wallet::Wallet;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The read/write operations the reconciler needs.
#[async_trait]
pub trait ReconcilerStore: Send + Sync {
    /// Point lookup of an indexed transaction.
    async fn transaction_by_id(&self, tx_id: &str) -> Result<Option<TxRecord>, StoreError>;

    /// Conditionally confirm all order rows matching a tx id, returning the
    /// number of rows affected.
    async fn confirm_orders(
        &self,
        tx_id: &str,
        block_height: i64,
        confirmed_at: time::PrimitiveDateTime,
    ) -> Result<u64, StoreError>;

    /// Count tracked wallets whose address is either of the two given.
    async fn tracked_wallet_count(&self, addr_a: &str, addr_b: &str) -> Result<i64, StoreError>;

    /// Insert a single new order row.
    async fn insert_order(&self, order: NewOrder) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: ReconcilerStore + ?Sized> ReconcilerStore for std::sync::Arc<S> {
    async fn transaction_by_id(&self, tx_id: &str) -> Result<Option<TxRecord>, StoreError> {
        (**self).transaction_by_id(tx_id).await
    }

    async fn confirm_orders(
        &self,
        tx_id: &str,
        block_height: i64,
        confirmed_at: time::PrimitiveDateTime,
    ) -> Result<u64, StoreError> {
        (**self).confirm_orders(tx_id, block_height, confirmed_at).await
    }

    async fn tracked_wallet_count(&self, addr_a: &str, addr_b: &str) -> Result<i64, StoreError> {
        (**self).tracked_wallet_count(addr_a, addr_b).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(), StoreError> {
        (**self).insert_order(order).await
    }
}

/// Postgres-backed store, delegating to the entity query functions.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReconcilerStore for PgStore {
    async fn transaction_by_id(&self, tx_id: &str) -> Result<Option<TxRecord>, StoreError> {
        Ok(TxRecord::by_tx_id(&self.pool, tx_id).await?)
    }

    async fn confirm_orders(
        &self,
        tx_id: &str,
        block_height: i64,
        confirmed_at: time::PrimitiveDateTime,
    ) -> Result<u64, StoreError> {
        Ok(Order::confirm_by_tx_id(&self.pool, tx_id, block_height, confirmed_at).await?)
    }

    async fn tracked_wallet_count(&self, addr_a: &str, addr_b: &str) -> Result<i64, StoreError> {
        Ok(Wallet::count_by_addresses(&self.pool, addr_a, addr_b).await?)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(), StoreError> {
        Ok(order.insert(&self.pool).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod memory {
    //! In-memory store used by the reconciler and watcher tests.

    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub transactions: Mutex<Vec<TxRecord>>,
        pub wallets: Mutex<Vec<String>>,
        pub orders: Mutex<Vec<NewOrder>>,
        /// When set, every operation fails with `StoreError::Unavailable`.
        pub fail: AtomicBool,
        /// Number of write statements issued (confirm + insert).
        pub writes: AtomicUsize,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_transaction(&self, tx: TxRecord) {
            self.transactions.lock().unwrap().push(tx);
        }

        pub fn track_wallet(&self, address: &str) {
            self.wallets.lock().unwrap().push(address.to_owned());
        }

        pub fn orders_for(&self, tx_id: &str) -> Vec<NewOrder> {
            self.orders
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.tx_id == tx_id)
                .cloned()
                .collect()
        }

        fn check_available(&self) -> Result<(), StoreError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("injected failure".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ReconcilerStore for MemoryStore {
        async fn transaction_by_id(&self, tx_id: &str) -> Result<Option<TxRecord>, StoreError> {
            self.check_available()?;
            Ok(self
                .transactions
                .lock()
                .unwrap()
                .iter()
                .find(|tx| tx.tx_id == tx_id)
                .cloned())
        }

        async fn confirm_orders(
            &self,
            tx_id: &str,
            block_height: i64,
            confirmed_at: time::PrimitiveDateTime,
        ) -> Result<u64, StoreError> {
            self.check_available()?;
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut orders = self.orders.lock().unwrap();
            let mut updated = 0;
            for order in orders.iter_mut().filter(|o| o.tx_id == tx_id) {
                order.confirmed_at = Some(confirmed_at);
                order.block_height = block_height;
                updated += 1;
            }
            Ok(updated)
        }

        async fn tracked_wallet_count(
            &self,
            addr_a: &str,
            addr_b: &str,
        ) -> Result<i64, StoreError> {
            self.check_available()?;
            Ok(self
                .wallets
                .lock()
                .unwrap()
                .iter()
                .filter(|w| w.as_str() == addr_a || w.as_str() == addr_b)
                .count() as i64)
        }

        async fn insert_order(&self, order: NewOrder) -> Result<(), StoreError> {
            self.check_available()?;
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.orders.lock().unwrap().push(order);
            Ok(())
        }
    }
}
