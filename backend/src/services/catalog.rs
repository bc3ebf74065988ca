//! Catalog and location registry: products, categories, branches, dealers

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{Actor, Branch, Category, Dealer, Product};

use crate::error::{AppError, AppResult};
use crate::services::authz::{authorize, StockAction};

/// Registry of products and stock-holding places
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub category_id: Uuid,
    pub unit_price: Decimal,
    pub barcode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBranchInput {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub manager_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDealerInput {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    category_id: Uuid,
    unit_price: Decimal,
    central_quantity: i64,
    barcode: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            unit_price: row.unit_price,
            central_quantity: row.central_quantity,
            barcode: row.barcode,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct BranchRow {
    id: Uuid,
    name: String,
    address: Option<String>,
    phone: Option<String>,
    manager_name: Option<String>,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Branch {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            manager_name: row.manager_name,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct DealerRow {
    id: Uuid,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    notes: Option<String>,
}

impl From<DealerRow> for Dealer {
    fn from(row: DealerRow) -> Self {
        Dealer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            address: row.address,
            notes: row.notes,
        }
    }
}

impl CatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_product(
        &self,
        actor: &Actor,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        authorize(actor, StockAction::ManageCatalog)?;
        if input.unit_price < Decimal::ZERO {
            return Err(AppError::Validation(
                "Unit price cannot be negative".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, category_id, unit_price, barcode)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, category_id, unit_price, central_quantity, barcode, created_at
            "#,
        )
        .bind(&input.name)
        .bind(input.category_id)
        .bind(input.unit_price)
        .bind(input.barcode.as_deref())
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    pub async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, category_id, unit_price, central_quantity, barcode, created_at \
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        Ok(row.into())
    }

    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, category_id, unit_price, central_quantity, barcode, created_at \
             FROM products ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn create_category(&self, actor: &Actor, name: String) -> AppResult<Category> {
        authorize(actor, StockAction::ManageCatalog)?;
        let (id, name): (Uuid, String) =
            sqlx::query_as("INSERT INTO categories (name) VALUES ($1) RETURNING id, name")
                .bind(name)
                .fetch_one(&self.db)
                .await?;
        Ok(Category { id, name })
    }

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.db)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name)| Category { id, name })
            .collect())
    }

    pub async fn create_branch(
        &self,
        actor: &Actor,
        input: CreateBranchInput,
    ) -> AppResult<Branch> {
        authorize(actor, StockAction::ManageCatalog)?;
        let row = sqlx::query_as::<_, BranchRow>(
            r#"
            INSERT INTO branches (name, address, phone, manager_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, address, phone, manager_name, is_active, created_at
            "#,
        )
        .bind(&input.name)
        .bind(input.address.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.manager_name.as_deref())
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    pub async fn list_branches(&self) -> AppResult<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(
            "SELECT id, name, address, phone, manager_name, is_active, created_at \
             FROM branches ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Delete a branch. Refused while ledger history references it, so the
    /// audit trail stays resolvable.
    pub async fn delete_branch(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        authorize(actor, StockAction::ManageCatalog)?;

        let has_movements: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM movements
                WHERE (source_type = 'branch' AND source_id = $1)
                   OR (destination_type = 'branch' AND destination_id = $1)
            )
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if has_movements {
            return Err(AppError::Conflict(
                "Branch has ledger history and cannot be deleted".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM branches WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Branch".to_string()));
        }
        Ok(())
    }

    pub async fn create_dealer(
        &self,
        actor: &Actor,
        input: CreateDealerInput,
    ) -> AppResult<Dealer> {
        authorize(actor, StockAction::ManageCatalog)?;
        let row = sqlx::query_as::<_, DealerRow>(
            r#"
            INSERT INTO dealers (name, phone, address, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, phone, address, notes
            "#,
        )
        .bind(&input.name)
        .bind(input.phone.as_deref())
        .bind(input.address.as_deref())
        .bind(input.notes.as_deref())
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    pub async fn list_dealers(&self) -> AppResult<Vec<Dealer>> {
        let rows = sqlx::query_as::<_, DealerRow>(
            "SELECT id, name, phone, address, notes FROM dealers ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
