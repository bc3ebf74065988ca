//! Stock aggregator: derived quantities and the central counter
//!
//! Derived quantity is computed from the ledger at call time; there is no
//! cache to invalidate. The central counter is the materialized per-product
//! total maintained by the ledger and reversal services inside their
//! transactions; this service only reads it.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::Location;

use crate::error::{AppError, AppResult};

/// Read-side stock queries
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// One product's stock position at a branch
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BranchStockLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub stock_value: Decimal,
}

/// Sum of movements into a location minus movements out of it, for one
/// product, over the full ledger. Usable both on the pool and inside a
/// transaction so availability checks see uncommitted batch lines.
pub(crate) async fn derived_quantity_on<'e, E>(
    executor: E,
    product_id: Uuid,
    location: Location,
) -> AppResult<i64>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let quantity: i64 = sqlx::query_scalar(
        r#"
        SELECT
            (COALESCE(SUM(CASE WHEN destination_type = $2
                                AND destination_id IS NOT DISTINCT FROM $3
                               THEN quantity ELSE 0 END), 0)
           - COALESCE(SUM(CASE WHEN source_type = $2
                                AND source_id IS NOT DISTINCT FROM $3
                               THEN quantity ELSE 0 END), 0))::BIGINT
        FROM movements
        WHERE product_id = $1
        "#,
    )
    .bind(product_id)
    .bind(location.kind_str())
    .bind(location.entity_id())
    .fetch_one(executor)
    .await?;

    Ok(quantity)
}

impl StockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Stock of a product at a location, derived from the ledger
    pub async fn derived_quantity(&self, product_id: Uuid, location: Location) -> AppResult<i64> {
        derived_quantity_on(&self.db, product_id, location).await
    }

    /// The materialized central counter for a product
    pub async fn central_quantity(&self, product_id: Uuid) -> AppResult<i64> {
        let quantity: Option<i64> =
            sqlx::query_scalar("SELECT central_quantity FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&self.db)
                .await?;

        quantity.ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// All products with positive derived stock at a branch, with their
    /// value at the current unit price
    pub async fn branch_stock(&self, branch_id: Uuid) -> AppResult<Vec<BranchStockLine>> {
        let lines = sqlx::query_as::<_, BranchStockLine>(
            r#"
            SELECT p.id AS product_id,
                   p.name AS product_name,
                   p.unit_price,
                   q.quantity,
                   p.unit_price * q.quantity::numeric AS stock_value
            FROM products p
            JOIN (
                SELECT product_id,
                       (COALESCE(SUM(CASE WHEN destination_type = 'branch'
                                           AND destination_id = $1
                                          THEN quantity ELSE 0 END), 0)
                      - COALESCE(SUM(CASE WHEN source_type = 'branch'
                                           AND source_id = $1
                                          THEN quantity ELSE 0 END), 0))::BIGINT AS quantity
                FROM movements
                GROUP BY product_id
            ) q ON q.product_id = p.id
            WHERE q.quantity > 0
            ORDER BY p.name
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(lines)
    }

    /// Total stock value held at a branch
    pub async fn branch_stock_value(&self, branch_id: Uuid) -> AppResult<Decimal> {
        let lines = self.branch_stock(branch_id).await?;
        Ok(lines.iter().map(|l| l.stock_value).sum())
    }
}
