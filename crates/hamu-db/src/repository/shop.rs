//! # Shop Repository
//!
//! The tenant table. Small by design - one row per shop, read on almost
//! every operation to fetch the loyalty interval.

use sqlx::SqlitePool;
use tracing::debug;

use hamu_core::Shop;

use crate::error::DbResult;

/// Repository for shop (tenant) records.
#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    /// Inserts a new shop.
    pub async fn insert(&self, shop: &Shop) -> DbResult<()> {
        debug!(shop_id = %shop.id, name = %shop.shop_name, "Inserting shop");

        sqlx::query(
            r#"
            INSERT INTO shops (id, shop_name, free_refill_interval, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&shop.id)
        .bind(&shop.shop_name)
        .bind(shop.free_refill_interval)
        .bind(shop.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a shop by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>(
            "SELECT id, shop_name, free_refill_interval, created_at FROM shops WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    /// Updates the free-refill interval for a shop.
    ///
    /// Takes effect for subsequent refills only; committed refill rows
    /// are never rewritten.
    pub async fn set_free_refill_interval(&self, id: &str, interval: i64) -> DbResult<()> {
        sqlx::query("UPDATE shops SET free_refill_interval = ? WHERE id = ?")
            .bind(interval)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
