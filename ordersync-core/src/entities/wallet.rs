//! Tracked wallets.
//!
//! Wallets are registered and removed through the HTTP surface. The
//! reconciliation engine only consults them via the address existence count.

use sqlx::PgPool;

/// A wallet address registered for order bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Wallet {
    pub address: String,
    pub owner_id: String,
    pub created_at: time::PrimitiveDateTime,
}

impl Wallet {
    /// Register a wallet address for an owner. Re-registering the same
    /// address is a no-op.
    pub async fn create(pool: &PgPool, address: &str, owner_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO wallets (address, owner_id)
            VALUES ($1, $2)
            ON CONFLICT (address) DO NOTHING
            "#,
        )
        .bind(address)
        .bind(owner_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Remove a wallet registration. Returns the number of rows deleted.
    pub async fn delete(pool: &PgPool, address: &str, owner_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM wallets
            WHERE address = $1 AND owner_id = $2
            "#,
        )
        .bind(address)
        .bind(owner_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Count tracked wallets matching either of two addresses.
    ///
    /// Used by the reconciler as the "is this transaction relevant" gate:
    /// a transaction matters iff its sender or receiver is tracked.
    pub async fn count_by_addresses(
        pool: &PgPool,
        addr_a: &str,
        addr_b: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM wallets
            WHERE address = $1 OR address = $2
            "#,
        )
        .bind(addr_a)
        .bind(addr_b)
        .fetch_one(pool)
        .await
    }
}
