//! # Package Repository
//!
//! Sellable unit definitions per shop. Immutable reference data: the
//! loyalty split keys on (customer, package), so a package's price or
//! labels changing under committed history would corrupt derivations.

use sqlx::SqlitePool;
use tracing::debug;

use hamu_core::{Package, SaleType};

use crate::error::DbResult;

const SELECT_COLUMNS: &str =
    "id, shop_id, water_amount_label, bottle_type, price_cents, sale_type, description";

/// Repository for package definitions.
#[derive(Debug, Clone)]
pub struct PackageRepository {
    pool: SqlitePool,
}

impl PackageRepository {
    /// Creates a new repository with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        PackageRepository { pool }
    }

    /// Inserts a new package.
    pub async fn insert(&self, package: &Package) -> DbResult<()> {
        debug!(
            package_id = %package.id,
            label = %package.water_amount_label,
            "Inserting package"
        );

        sqlx::query(
            r#"
            INSERT INTO packages
                (id, shop_id, water_amount_label, bottle_type,
                 price_cents, sale_type, description)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&package.id)
        .bind(&package.shop_id)
        .bind(&package.water_amount_label)
        .bind(&package.bottle_type)
        .bind(package.price_cents)
        .bind(package.sale_type)
        .bind(&package.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a package by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Package>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM packages WHERE id = ?");
        let package = sqlx::query_as::<_, Package>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(package)
    }

    /// Lists all packages of a shop.
    pub async fn list_for_shop(&self, shop_id: &str) -> DbResult<Vec<Package>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM packages \
             WHERE shop_id = ? ORDER BY water_amount_label"
        );
        let packages = sqlx::query_as::<_, Package>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(packages)
    }

    /// Lists packages of a shop filtered by sale type.
    pub async fn list_by_sale_type(
        &self,
        shop_id: &str,
        sale_type: SaleType,
    ) -> DbResult<Vec<Package>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM packages \
             WHERE shop_id = ? AND sale_type = ? ORDER BY water_amount_label"
        );
        let packages = sqlx::query_as::<_, Package>(&sql)
            .bind(shop_id)
            .bind(sale_type)
            .fetch_all(&self.pool)
            .await?;

        Ok(packages)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
