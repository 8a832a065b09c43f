//! Reconciliation decision logic.
//!
//! Maps an incoming transaction id to a store mutation (or no-op):
//!
//! 1. Look up the transaction; if the indexer has not written it yet, skip.
//! 2. Conditionally confirm existing order rows for the tx id. A non-zero
//!    row count means the order was already placed (or a prior delivery of
//!    the same event already ran), and nothing more must be inserted.
//! 3. Otherwise insert one already-confirmed order row, but only when the
//!    sender or receiver is a tracked wallet.
//!
//! Update-before-insert, gated on the affected row count, is what makes
//! re-delivery of the same event idempotent: a second run matches on step 2
//! and never inserts a duplicate.

use crate::entities::order::NewOrder;
use crate::entities::transaction::TxRecord;
use crate::store::{ReconcilerStore, StoreError};
use tracing::{debug, warn};

/// Result of reconciling one transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing to do: transaction unknown, or irrelevant to tracked wallets.
    Skipped,
    /// Existing order rows were confirmed (count of rows touched).
    Updated(u64),
    /// A new, already-confirmed order row was inserted.
    Inserted,
}

/// Applies the reconciliation algorithm against an abstract store.
pub struct Reconciler<S> {
    store: S,
}

impl<S: ReconcilerStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reconcile a single transaction id.
    ///
    /// Fails only on store errors; those are propagated to the caller and
    /// leave no partial writes behind (each write is a single statement).
    pub async fn reconcile(&self, tx_id: &str) -> Result<ReconcileOutcome, StoreError> {
        let Some(tx) = self.store.transaction_by_id(tx_id).await? else {
            // Expected under event/indexer lag, not an error.
            warn!(tx_id = %tx_id, "transaction not found");
            return Ok(ReconcileOutcome::Skipped);
        };

        let updated = self
            .store
            .confirm_orders(tx_id, tx.block_height, tx.created_at)
            .await?;

        if updated != 0 {
            debug!(tx_id = %tx_id, updated, "confirmed existing orders");
            return Ok(ReconcileOutcome::Updated(updated));
        }

        let tracked = self
            .store
            .tracked_wallet_count(&tx.from_address, &tx.to_address)
            .await?;

        if tracked == 0 {
            return Ok(ReconcileOutcome::Skipped);
        }

        self.store.insert_order(confirmed_order(&tx)).await?;
        debug!(tx_id = %tx_id, "inserted confirmed order");
        Ok(ReconcileOutcome::Inserted)
    }
}

/// Build the order row the engine inserts for a transaction with no
/// pre-existing order. The indexer's observation time doubles as the
/// confirmation time in this flow.
fn confirmed_order(tx: &TxRecord) -> NewOrder {
    NewOrder {
        tx_id: tx.tx_id.clone(),
        from_address: tx.from_address.clone(),
        to_address: tx.to_address.clone(),
        asset: tx.asset.clone(),
        value: tx.value,
        block_height: tx.block_height,
        confirmed_at: Some(tx.created_at),
    }
}
