use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod service;

use crate::config::HealthTimeouts;
use crate::service::ProductService;

/// Shared application state — cheap to clone (all heap behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
    pub health: HealthTimeouts,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/health/startup", get(handlers::health::startup))

        // ── Products ────────────────────────────────────────────────────────
        .route(
            "/api/v1/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/api/v1/products/search",
            get(handlers::products::search_products),
        )
        .route(
            "/api/v1/products/price-range",
            get(handlers::products::products_in_price_range),
        )
        .route(
            "/api/v1/products/low-stock",
            get(handlers::products::low_stock_products),
        )
        .route(
            "/api/v1/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
