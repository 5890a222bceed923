//! Route definitions for the POS Inventory Platform

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
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - product catalog and reconciliation
        .nest("/products", product_routes())
        // Protected routes - quick stock adjustments
        .nest("/stock", stock_routes())
        // Protected routes - activity log
        .nest("/activity", activity_routes())
        // Protected routes - location management
        .nest("/businesses", business_routes())
        // Protected routes - reporting
        .nest("/reports", report_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products))
        .route("/reconcile", post(handlers::reconcile_product))
        .route(
            "/:product_id",
            get(handlers::get_product).delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Quick stock adjustment routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/adjust", post(handlers::quick_adjust))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Activity log routes (protected)
fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_activity))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Location management routes (protected)
fn business_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_businesses).post(handlers::create_business),
        )
        .route("/:business_id", get(handlers::get_business))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Reporting routes (protected)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/stock-by-location", get(handlers::get_stock_by_location))
        .route("/activity.csv", get(handlers::export_activity_csv))
        .route_layer(middleware::from_fn(auth_middleware))
}
