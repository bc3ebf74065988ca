//! HTTP handlers for stock queries

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::Location;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::stock::BranchStockLine;
use crate::services::StockService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LocationParams {
    pub location_type: String,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct QuantityResponse {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Derived quantity of a product at a location
pub async fn get_derived_quantity(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Query(params): Query<LocationParams>,
) -> AppResult<Json<QuantityResponse>> {
    let location = Location::from_parts(&params.location_type, params.location_id)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let service = StockService::new(state.db);
    let quantity = service.derived_quantity(product_id, location).await?;
    Ok(Json(QuantityResponse {
        product_id,
        quantity,
    }))
}

/// The materialized central counter for a product
pub async fn get_central_quantity(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<QuantityResponse>> {
    let service = StockService::new(state.db);
    let quantity = service.central_quantity(product_id).await?;
    Ok(Json(QuantityResponse {
        product_id,
        quantity,
    }))
}

#[derive(Debug, Serialize)]
pub struct BranchStockValueResponse {
    pub branch_id: Uuid,
    pub total_value: rust_decimal::Decimal,
}

/// All products with positive stock at a branch
pub async fn get_branch_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<Vec<BranchStockLine>>> {
    let service = StockService::new(state.db);
    let stock = service.branch_stock(branch_id).await?;
    Ok(Json(stock))
}

/// Total value of the stock held at a branch, at current unit prices
pub async fn get_branch_stock_value(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<BranchStockValueResponse>> {
    let service = StockService::new(state.db);
    let total_value = service.branch_stock_value(branch_id).await?;
    Ok(Json(BranchStockValueResponse {
        branch_id,
        total_value,
    }))
}
