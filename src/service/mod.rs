use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::db::ProductRepository;
use crate::error::{AppError, AppResult};
use crate::models::*;

/// Business rules over the product table: active-only listings, soft delete,
/// and full-replace updates. The only writer of product rows.
#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_active(&self) -> AppResult<Vec<Product>> {
        info!("Fetching all active products");
        self.repo.find_all_active().await
    }

    pub async fn list_active_page(&self, page: &PageRequest) -> AppResult<Page<Product>> {
        info!(page = page.page, size = page.size, "Fetching active products page");
        self.repo.search_by_name_active(None, page).await
    }

    /// Not filtered by the active flag: soft-deleted rows stay reachable by id.
    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Product>> {
        info!(id, "Fetching product");
        self.repo.find_by_id(id).await
    }

    pub async fn create(&self, input: ProductInput) -> AppResult<Product> {
        input.validate()?;
        info!(name = %input.name, "Creating product");
        self.repo.save(ProductDraft::new(input)).await
    }

    /// Overwrites name, description, price, quantity and active with exactly
    /// what `input` carries. `None` if no row has this id.
    pub async fn update(&self, id: i64, input: ProductInput) -> AppResult<Option<Product>> {
        input.validate()?;
        info!(id, "Updating product");
        match self.repo.save(ProductDraft::existing(id, input)).await {
            Ok(product) => Ok(Some(product)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Soft delete. Returns `false` if no row has this id.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        info!(id, "Soft deleting product");
        self.repo.deactivate(id).await
    }

    pub async fn search_by_name(
        &self,
        name: &str,
        page: &PageRequest,
    ) -> AppResult<Page<Product>> {
        info!(name, page = page.page, size = page.size, "Searching products by name");
        self.repo.search_by_name_active(Some(name), page).await
    }

    pub async fn in_price_range(&self, min: f64, max: f64) -> AppResult<Vec<Product>> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
            return Err(AppError::BadRequest(
                "minPrice and maxPrice must be non-negative numbers".to_string(),
            ));
        }
        if min > max {
            return Err(AppError::BadRequest(
                "minPrice must not exceed maxPrice".to_string(),
            ));
        }
        info!(min, max, "Fetching products in price range");
        self.repo.find_in_price_range(min, max).await
    }

    pub async fn low_stock(&self, threshold: i32) -> AppResult<Vec<Product>> {
        info!(threshold, "Fetching low stock products");
        self.repo.find_low_stock(threshold).await
    }

    pub async fn total_active_count(&self) -> AppResult<i64> {
        self.repo.count_active().await
    }

    pub async fn check_store(&self) -> AppResult<()> {
        self.repo.ping().await
    }
}
