use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    models::{PageRequest, ProductInput},
    AppState,
};

type JsonResponse = AppResult<(StatusCode, Json<serde_json::Value>)>;

const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

// ── Query parameters ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl PageParams {
    fn page_request(&self) -> AppResult<PageRequest> {
        PageRequest::parse(
            self.page,
            self.size,
            self.sort_by.as_deref(),
            self.sort_dir.as_deref(),
        )
        .map_err(AppError::BadRequest)
    }
}

// serde(flatten) loses numeric typing with query strings, so the paging
// fields are repeated here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub name: String,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeParams {
    pub min_price: f64,
    pub max_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
    pub threshold: Option<i32>,
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> JsonResponse {
    let Query(params) = params?;
    let page = params.page_request()?;

    info!(
        page = page.page,
        size = page.size,
        sort_by = page.sort_by.column(),
        sort_dir = page.direction.keyword(),
        "GET /api/v1/products"
    );

    let result = state
        .products
        .list_active_page(&page)
        .await
        .map_err(|e| e.during("Failed to fetch products"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "products": result.content,
            "totalCount": result.total_elements,
            "totalPages": result.total_pages,
            "currentPage": result.page,
            "pageSize": result.size,
        })),
    ))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResponse {
    let Path(id) = id?;
    info!(id, "GET /api/v1/products/:id");

    let product = state
        .products
        .get_by_id(id)
        .await
        .map_err(|e| e.during("Failed to fetch product"))?
        .ok_or(AppError::NotFound(id))?;

    Ok((StatusCode::OK, Json(json!({ "product": product }))))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> JsonResponse {
    let Json(payload) = payload?;
    info!(name = %payload.name, "POST /api/v1/products");

    let product = state
        .products
        .create(payload)
        .await
        .map_err(|e| e.during("Failed to create product"))?;

    info!(id = product.id, name = %product.name, "Created product");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "product": product,
            "message": "Product created successfully",
        })),
    ))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> JsonResponse {
    let Path(id) = id?;
    let Json(payload) = payload?;
    info!(id, "PUT /api/v1/products/:id");

    let product = state
        .products
        .update(id, payload)
        .await
        .map_err(|e| e.during("Failed to update product"))?
        .ok_or(AppError::NotFound(id))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "product": product,
            "message": "Product updated successfully",
        })),
    ))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> JsonResponse {
    let Path(id) = id?;
    info!(id, "DELETE /api/v1/products/:id");

    let deleted = state
        .products
        .delete(id)
        .await
        .map_err(|e| e.during("Failed to delete product"))?;

    if !deleted {
        return Err(AppError::NotFound(id));
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Product deleted successfully",
            "id": id,
        })),
    ))
}

// ── Search ────────────────────────────────────────────────────────────────────

pub async fn search_products(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> JsonResponse {
    let Query(params) = params?;
    let page = PageRequest::parse(
        params.page,
        params.size,
        params.sort_by.as_deref(),
        params.sort_dir.as_deref(),
    )
    .map_err(AppError::BadRequest)?;

    info!(
        name = %params.name,
        page = page.page,
        size = page.size,
        "GET /api/v1/products/search"
    );

    let result = state
        .products
        .search_by_name(&params.name, &page)
        .await
        .map_err(|e| e.during("Failed to search products"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "products": result.content,
            "totalElements": result.total_elements,
            "totalPages": result.total_pages,
            "currentPage": result.page,
            "pageSize": result.size,
        })),
    ))
}

// ── Price range ───────────────────────────────────────────────────────────────

pub async fn products_in_price_range(
    State(state): State<AppState>,
    params: Result<Query<PriceRangeParams>, QueryRejection>,
) -> JsonResponse {
    let Query(params) = params?;
    info!(
        min = params.min_price,
        max = params.max_price,
        "GET /api/v1/products/price-range"
    );

    let products = state
        .products
        .in_price_range(params.min_price, params.max_price)
        .await
        .map_err(|e| e.during("Failed to fetch products in price range"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "count": products.len(),
            "products": products,
            "priceRange": { "min": params.min_price, "max": params.max_price },
        })),
    ))
}

// ── Low stock ─────────────────────────────────────────────────────────────────

pub async fn low_stock_products(
    State(state): State<AppState>,
    params: Result<Query<LowStockParams>, QueryRejection>,
) -> JsonResponse {
    let Query(params) = params?;
    let threshold = params.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    info!(threshold, "GET /api/v1/products/low-stock");

    let products = state
        .products
        .low_stock(threshold)
        .await
        .map_err(|e| e.during("Failed to fetch low stock products"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "count": products.len(),
            "products": products,
            "threshold": threshold,
        })),
    ))
}
