//! HTTP handlers for the catalog and location registry

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{Branch, Category, Dealer, Product};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::{CreateBranchInput, CreateDealerInput, CreateProductInput};
use crate::services::CatalogService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
}

pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let service = CatalogService::new(state.db);
    let product = service.create_product(&current_user.0, input).await?;
    Ok(Json(product))
}

pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = CatalogService::new(state.db);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}

pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let service = CatalogService::new(state.db);
    let products = service.list_products().await?;
    Ok(Json(products))
}

pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<Json<Category>> {
    let service = CatalogService::new(state.db);
    let category = service.create_category(&current_user.0, input.name).await?;
    Ok(Json(category))
}

pub async fn list_categories(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Category>>> {
    let service = CatalogService::new(state.db);
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

pub async fn create_branch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateBranchInput>,
) -> AppResult<Json<Branch>> {
    let service = CatalogService::new(state.db);
    let branch = service.create_branch(&current_user.0, input).await?;
    Ok(Json(branch))
}

pub async fn list_branches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Branch>>> {
    let service = CatalogService::new(state.db);
    let branches = service.list_branches().await?;
    Ok(Json(branches))
}

pub async fn delete_branch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(branch_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let service = CatalogService::new(state.db);
    service.delete_branch(&current_user.0, branch_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn create_dealer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateDealerInput>,
) -> AppResult<Json<Dealer>> {
    let service = CatalogService::new(state.db);
    let dealer = service.create_dealer(&current_user.0, input).await?;
    Ok(Json(dealer))
}

pub async fn list_dealers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Dealer>>> {
    let service = CatalogService::new(state.db);
    let dealers = service.list_dealers().await?;
    Ok(Json(dealers))
}
