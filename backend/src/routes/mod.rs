//! Route definitions for the Branch Stock Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - movement ledger
        .nest("/movements", movement_routes())
        // Protected routes - stock queries
        .nest("/stock", stock_routes())
        // Protected routes - transfer request workflow
        .nest("/requests", request_routes())
        // Protected routes - notification feed
        .nest("/notifications", notification_routes())
        // Protected routes - catalog and locations
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/branches", branch_routes())
        .nest("/dealers", dealer_routes())
}

/// Movement ledger routes (protected)
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movements).post(handlers::post_movement_batch),
        )
        .route("/:movement_id/reverse", post(handlers::reverse_movement))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock query routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products/:product_id/derived",
            get(handlers::get_derived_quantity),
        )
        .route(
            "/products/:product_id/central",
            get(handlers::get_central_quantity),
        )
        .route("/branches/:branch_id", get(handlers::get_branch_stock))
        .route(
            "/branches/:branch_id/value",
            get(handlers::get_branch_stock_value),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Transfer request routes (protected)
fn request_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_requests).post(handlers::create_request),
        )
        .route("/:request_id", get(handlers::get_request))
        .route("/:request_id/respond", post(handlers::respond_to_request))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Notification feed routes (protected)
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/unread-count", get(handlers::get_unread_count))
        .route("/mark-all-read", post(handlers::mark_all_notifications_read))
        .route(
            "/:notification_id/read",
            post(handlers::mark_notification_read),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/:product_id", get(handlers::get_product))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Category routes (protected)
fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Branch registry routes (protected)
fn branch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_branches).post(handlers::create_branch),
        )
        .route(
            "/:branch_id",
            axum::routing::delete(handlers::delete_branch),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Dealer registry routes (protected)
fn dealer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_dealers).post(handlers::create_dealer),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
