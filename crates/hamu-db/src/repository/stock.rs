//! # Stock Repository
//!
//! Stock items and the append-only stock ledger.
//!
//! ## The Ledger Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock_logs is APPEND-ONLY                                             │
//! │                                                                         │
//! │  current level(item) = SUM(quantity_change) over its rows              │
//! │                                                                         │
//! │  • No UPDATE or DELETE statement exists in this module                 │
//! │  • Corrections are new compensating entries                            │
//! │  • The sum is order-independent, so out-of-order offline syncs         │
//! │    converge to the same level                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Write methods take `&mut SqliteConnection` so the service tier can
//! append deduction rows inside the same transaction as the sale or
//! refill that caused them.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use hamu_core::{StockItem, StockItemType, StockLogEntry};

use crate::error::DbResult;

const ITEM_COLUMNS: &str = "id, shop_id, name, item_type, threshold, reorder_point";
const LOG_COLUMNS: &str =
    "id, stock_item_id, shop_id, quantity_change, notes, actor_name, logged_at";

/// Repository for stock items and their ledger.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    // =========================================================================
    // Stock Items
    // =========================================================================

    /// Inserts a new stock item (SKU definition, zero starting level).
    pub async fn insert_item(&self, item: &StockItem) -> DbResult<()> {
        debug!(item_id = %item.id, name = %item.name, "Inserting stock item");

        sqlx::query(
            r#"
            INSERT INTO stock_items (id, shop_id, name, item_type, threshold, reorder_point)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.shop_id)
        .bind(&item.name)
        .bind(item.item_type)
        .bind(item.threshold)
        .bind(item.reorder_point)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a stock item by ID.
    pub async fn get_item(&self, id: &str) -> DbResult<Option<StockItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM stock_items WHERE id = ?");
        let item = sqlx::query_as::<_, StockItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists all stock items of a shop.
    pub async fn list_items(&self, shop_id: &str) -> DbResult<Vec<StockItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM stock_items WHERE shop_id = ? ORDER BY name");
        let items = sqlx::query_as::<_, StockItem>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Finds the shop's item of a given type (caps, labels).
    ///
    /// Ordered by name so shops with several SKUs of one type resolve
    /// deterministically.
    pub async fn find_by_type(
        &self,
        shop_id: &str,
        item_type: StockItemType,
    ) -> DbResult<Option<StockItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM stock_items \
             WHERE shop_id = ? AND item_type = ? ORDER BY name LIMIT 1"
        );
        let item = sqlx::query_as::<_, StockItem>(&sql)
            .bind(shop_id)
            .bind(item_type)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Finds the shop's item of a given type whose name contains the
    /// needle (bottle type for bottle sales, water amount label for
    /// bundle sales).
    pub async fn find_by_type_and_name(
        &self,
        shop_id: &str,
        item_type: StockItemType,
        needle: &str,
    ) -> DbResult<Option<StockItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM stock_items \
             WHERE shop_id = ? AND item_type = ? AND name LIKE '%' || ? || '%' \
             ORDER BY name LIMIT 1"
        );
        let item = sqlx::query_as::<_, StockItem>(&sql)
            .bind(shop_id)
            .bind(item_type)
            .bind(needle)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Appends a ledger entry inside the caller's transaction.
    ///
    /// The only write path for `stock_logs`.
    pub async fn append_log(
        &self,
        conn: &mut SqliteConnection,
        entry: &StockLogEntry,
    ) -> DbResult<()> {
        debug!(
            item_id = %entry.stock_item_id,
            delta = entry.quantity_change,
            actor = %entry.actor_name,
            "Appending stock log entry"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_logs
                (id, stock_item_id, shop_id, quantity_change, notes, actor_name, logged_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.stock_item_id)
        .bind(&entry.shop_id)
        .bind(entry.quantity_change)
        .bind(&entry.notes)
        .bind(&entry.actor_name)
        .bind(entry.logged_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Derives the current level of an item: the ledger sum.
    pub async fn current_level(&self, item_id: &str) -> DbResult<i64> {
        let level: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity_change), 0) FROM stock_logs WHERE stock_item_id = ?",
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(level)
    }

    /// Derives the current level inside the caller's transaction.
    ///
    /// Used to re-check subtract/set adjustments against the level as of
    /// the transaction snapshot, not an earlier read.
    pub async fn current_level_in(
        &self,
        conn: &mut SqliteConnection,
        item_id: &str,
    ) -> DbResult<i64> {
        let level: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity_change), 0) FROM stock_logs WHERE stock_item_id = ?",
        )
        .bind(item_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(level)
    }

    /// Lists ledger entries for one item, newest first.
    pub async fn history_for_item(&self, item_id: &str) -> DbResult<Vec<StockLogEntry>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM stock_logs \
             WHERE stock_item_id = ? ORDER BY logged_at DESC, id DESC"
        );
        let entries = sqlx::query_as::<_, StockLogEntry>(&sql)
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Lists ledger entries for a whole shop, newest first.
    pub async fn history_for_shop(&self, shop_id: &str) -> DbResult<Vec<StockLogEntry>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM stock_logs \
             WHERE shop_id = ? ORDER BY logged_at DESC, id DESC"
        );
        let entries = sqlx::query_as::<_, StockLogEntry>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use hamu_core::Shop;

    async fn db_with_shop() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.shops()
            .insert(&Shop {
                id: "shop-1".to_string(),
                shop_name: "Hamu Waters".to_string(),
                free_refill_interval: 10,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        db
    }

    fn item(id: &str, name: &str, item_type: StockItemType) -> StockItem {
        StockItem {
            id: id.to_string(),
            shop_id: "shop-1".to_string(),
            name: name.to_string(),
            item_type,
            threshold: 10,
            reorder_point: 20,
        }
    }

    fn entry(id: &str, item_id: &str, delta: i64) -> StockLogEntry {
        StockLogEntry {
            id: id.to_string(),
            stock_item_id: item_id.to_string(),
            shop_id: "shop-1".to_string(),
            quantity_change: delta,
            notes: String::new(),
            actor_name: "Jane Agent".to_string(),
            logged_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_level_is_ledger_sum() {
        let db = db_with_shop().await;
        let repo = db.stock();
        repo.insert_item(&item("i1", "Caps", StockItemType::Cap))
            .await
            .unwrap();

        assert_eq!(repo.current_level("i1").await.unwrap(), 0);

        let mut conn = db.pool().acquire().await.unwrap();
        repo.append_log(&mut conn, &entry("e1", "i1", 100)).await.unwrap();
        repo.append_log(&mut conn, &entry("e2", "i1", -30)).await.unwrap();
        repo.append_log(&mut conn, &entry("e3", "i1", 5)).await.unwrap();
        drop(conn);

        assert_eq!(repo.current_level("i1").await.unwrap(), 75);
    }

    #[tokio::test]
    async fn test_find_by_type_deterministic() {
        let db = db_with_shop().await;
        let repo = db.stock();
        repo.insert_item(&item("i2", "Zebra Caps", StockItemType::Cap))
            .await
            .unwrap();
        repo.insert_item(&item("i1", "Alpha Caps", StockItemType::Cap))
            .await
            .unwrap();

        let found = repo
            .find_by_type("shop-1", StockItemType::Cap)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "i1");
    }

    #[tokio::test]
    async fn test_find_by_type_and_name() {
        let db = db_with_shop().await;
        let repo = db.stock();
        repo.insert_item(&item("i1", "18L hard bottle", StockItemType::Bottle))
            .await
            .unwrap();
        repo.insert_item(&item("i2", "20L soft bottle", StockItemType::Bottle))
            .await
            .unwrap();

        let found = repo
            .find_by_type_and_name("shop-1", StockItemType::Bottle, "soft")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "i2");

        assert!(repo
            .find_by_type_and_name("shop-1", StockItemType::Bottle, "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let db = db_with_shop().await;
        let repo = db.stock();
        repo.insert_item(&item("i1", "Labels", StockItemType::Label))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let mut first = entry("e1", "i1", 50);
        first.logged_at = Utc::now() - chrono::Duration::hours(1);
        repo.append_log(&mut conn, &first).await.unwrap();
        repo.append_log(&mut conn, &entry("e2", "i1", -2)).await.unwrap();
        drop(conn);

        let history = repo.history_for_item("i1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, "e2");
        assert_eq!(history[1].id, "e1");
    }

    #[tokio::test]
    async fn test_level_in_transaction_sees_uncommitted_rows() {
        let db = db_with_shop().await;
        let repo = db.stock();
        repo.insert_item(&item("i1", "Caps", StockItemType::Cap))
            .await
            .unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        repo.append_log(&mut tx, &entry("e1", "i1", 40)).await.unwrap();
        assert_eq!(repo.current_level_in(&mut tx, "i1").await.unwrap(), 40);
        tx.rollback().await.unwrap();

        // Rolled back: nothing committed
        assert_eq!(repo.current_level("i1").await.unwrap(), 0);
    }
}
