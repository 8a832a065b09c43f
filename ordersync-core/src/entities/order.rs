//! Order records.
//!
//! An order row is created either eagerly by the HTTP surface when a user
//! places an order (`confirmed_at` null), or by the reconciliation engine
//! when a confirmed transaction touches a tracked wallet that has no
//! pre-existing order row for that tx id.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

/// A stored order. `tx_id` is not unique across rows: a transaction may
/// legitimately confirm several user-placed orders at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    #[serde(skip_serializing)]
    pub id: i64,
    pub tx_id: String,
    pub from_address: String,
    pub to_address: String,
    pub asset: String,
    pub value: Decimal,
    pub block_height: i64,
    pub created_at: time::PrimitiveDateTime,
    pub confirmed_at: Option<time::PrimitiveDateTime>,
}

/// Data for inserting a new order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub tx_id: String,
    pub from_address: String,
    pub to_address: String,
    pub asset: String,
    pub value: Decimal,
    pub block_height: i64,
    pub confirmed_at: Option<time::PrimitiveDateTime>,
}

impl NewOrder {
    /// Insert the order. `created_at` is assigned by the database.
    pub async fn insert(self, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO orders
                (tx_id, from_address, to_address, asset, value, block_height, confirmed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(self.tx_id)
        .bind(self.from_address)
        .bind(self.to_address)
        .bind(self.asset)
        .bind(self.value)
        .bind(self.block_height)
        .bind(self.confirmed_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl Order {
    /// Mark all order rows for a tx id as confirmed.
    ///
    /// This is the idempotency gate of the reconciliation algorithm: it is
    /// conditioned on pre-existing rows and returns the number of rows it
    /// touched, so re-delivery of an already handled transaction updates in
    /// place instead of inserting a duplicate.
    pub async fn confirm_by_tx_id(
        pool: &PgPool,
        tx_id: &str,
        block_height: i64,
        confirmed_at: time::PrimitiveDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET confirmed_at = $2, block_height = $3
            WHERE tx_id = $1
            "#,
        )
        .bind(tx_id)
        .bind(confirmed_at)
        .bind(block_height)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Fetch all order rows for a tx id.
    pub async fn by_tx_id(pool: &PgPool, tx_id: &str) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, tx_id, from_address, to_address, asset, value,
                block_height, created_at, confirmed_at
            FROM orders
            WHERE tx_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(tx_id)
        .fetch_all(pool)
        .await
    }

    /// Paged listing of orders where the address appears on either side,
    /// filtered by asset. Newest first.
    pub async fn list_for_address(
        pool: &PgPool,
        address: &str,
        asset: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, tx_id, from_address, to_address, asset, value,
                block_height, created_at, confirmed_at
            FROM orders
            WHERE (from_address = $1 OR to_address = $1) AND asset = $2
            ORDER BY created_at DESC
            OFFSET $3
            LIMIT $4
            "#,
        )
        .bind(address)
        .bind(asset)
        .bind(offset)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
