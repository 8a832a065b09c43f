//! Indexed blockchain transactions.
//!
//! The `transactions` table is written by the upstream chain indexer;
//! this service only ever reads from it.

use rust_decimal::Decimal;
use sqlx::PgPool;

/// A confirmed on-chain transaction as recorded by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TxRecord {
    pub tx_id: String,
    pub from_address: String,
    pub to_address: String,
    pub asset: String,
    pub value: Decimal,
    pub block_height: i64,
    pub created_at: time::PrimitiveDateTime,
}

impl TxRecord {
    /// Look up a transaction by its tx id.
    ///
    /// Returns `None` when the indexer has not written the transaction yet,
    /// which is expected under indexer lag.
    pub async fn by_tx_id(pool: &PgPool, tx_id: &str) -> Result<Option<TxRecord>, sqlx::Error> {
        sqlx::query_as::<_, TxRecord>(
            r#"
            SELECT
                tx_id,
                from_address,
                to_address,
                asset,
                value,
                block_height,
                created_at
            FROM transactions
            WHERE tx_id = $1
            "#,
        )
        .bind(tx_id)
        .fetch_optional(pool)
        .await
    }
}
