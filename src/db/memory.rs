use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::models::*;

use super::ProductRepository;

/// In-memory stand-in for the products table, used by unit and router tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    state: Arc<RwLock<Table>>,
    stall_counts: bool,
}

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Product>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count_active` never completes; every other call behaves normally.
    pub fn with_stalled_count() -> Self {
        Self {
            stall_counts: true,
            ..Self::default()
        }
    }
}

/// Mirrors `$1::float8::numeric` stored into NUMERIC(12,2): the float is first
/// printed with 15 significant digits, then rounded half away from zero.
fn to_cents(price: f64) -> f64 {
    let printed = format!("{price:.14e}");
    let Some((mantissa, exponent)) = printed.split_once('e') else {
        return price;
    };
    let (Ok(digits), Ok(exponent)) = (
        mantissa.replace('.', "").parse::<i128>(),
        exponent.parse::<i32>(),
    ) else {
        return price;
    };

    // price = digits * 10^(exponent - 14), so cents = digits * 10^(exponent - 12)
    let shift = exponent - 12;
    let cents = if shift >= 0 {
        digits * 10_i128.pow(shift as u32)
    } else if shift < -30 {
        0
    } else {
        let divisor = 10_i128.pow(shift.unsigned_abs());
        let (quotient, remainder) = (digits / divisor, digits % divisor);
        if 2 * remainder.abs() >= divisor {
            quotient + digits.signum()
        } else {
            quotient
        }
    };
    cents as f64 / 100.0
}

fn compare(a: &Product, b: &Product, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Description => a.description.cmp(&b.description),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Quantity => a.quantity.cmp(&b.quantity),
        SortField::Active => a.active.cmp(&b.active),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Product>> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn find_all_active(&self) -> AppResult<Vec<Product>> {
        let table = self.state.read().await;
        Ok(table.rows.values().filter(|p| p.active).cloned().collect())
    }

    async fn search_by_name_active(
        &self,
        name: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<Page<Product>> {
        let needle = name.map(str::to_lowercase);
        let table = self.state.read().await;

        let mut matched: Vec<Product> = table
            .rows
            .values()
            .filter(|p| p.active)
            .filter(|p| match &needle {
                Some(n) => p.name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ord = compare(a, b, page.sort_by);
            let ord = match page.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });

        let total = matched.len() as i64;
        let content = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(Page::new(content, total, page))
    }

    async fn find_in_price_range(&self, min: f64, max: f64) -> AppResult<Vec<Product>> {
        let table = self.state.read().await;
        Ok(table
            .rows
            .values()
            .filter(|p| p.active && p.price >= min && p.price <= max)
            .cloned()
            .collect())
    }

    async fn find_low_stock(&self, threshold: i32) -> AppResult<Vec<Product>> {
        let table = self.state.read().await;
        Ok(table
            .rows
            .values()
            .filter(|p| p.active && p.quantity <= threshold)
            .cloned()
            .collect())
    }

    async fn count_active(&self) -> AppResult<i64> {
        if self.stall_counts {
            std::future::pending::<()>().await;
        }
        let table = self.state.read().await;
        Ok(table.rows.values().filter(|p| p.active).count() as i64)
    }

    async fn insert(&self, input: &ProductInput) -> AppResult<Product> {
        let mut table = self.state.write().await;
        table.next_id += 1;
        let now = Utc::now();
        let product = Product {
            id: table.next_id,
            name: input.name.clone(),
            description: input.description.clone(),
            price: to_cents(input.price),
            quantity: input.quantity,
            active: input.active,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(product.id, product.clone());
        Ok(product)
    }

    async fn replace(&self, id: i64, input: &ProductInput) -> AppResult<Option<Product>> {
        let mut table = self.state.write().await;
        let Some(product) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        product.name = input.name.clone();
        product.description = input.description.clone();
        product.price = to_cents(input.price);
        product.quantity = input.quantity;
        product.active = input.active;
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn deactivate(&self, id: i64) -> AppResult<bool> {
        let mut table = self.state.write().await;
        match table.rows.get_mut(&id) {
            Some(product) => {
                product.active = false;
                product.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Repository whose every call fails the way an unreachable database does.
#[derive(Debug, Default, Clone)]
pub struct UnavailableRepository;

#[async_trait]
impl ProductRepository for UnavailableRepository {
    async fn find_by_id(&self, _id: i64) -> AppResult<Option<Product>> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn find_all_active(&self) -> AppResult<Vec<Product>> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn search_by_name_active(
        &self,
        _name: Option<&str>,
        _page: &PageRequest,
    ) -> AppResult<Page<Product>> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn find_in_price_range(&self, _min: f64, _max: f64) -> AppResult<Vec<Product>> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn find_low_stock(&self, _threshold: i32) -> AppResult<Vec<Product>> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn count_active(&self) -> AppResult<i64> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn insert(&self, _input: &ProductInput) -> AppResult<Product> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn replace(&self, _id: i64, _input: &ProductInput) -> AppResult<Option<Product>> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn deactivate(&self, _id: i64) -> AppResult<bool> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn ping(&self) -> AppResult<()> {
        Err(sqlx::Error::PoolTimedOut.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn input(name: &str, price: f64, quantity: i32) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: None,
            price,
            quantity,
            active: true,
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_and_unique() {
        let repo = InMemoryProductRepository::new();
        let a = repo.insert(&input("A", 1.0, 1)).await.unwrap();
        let b = repo.insert(&input("B", 1.0, 1)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn save_dispatches_on_id() {
        let repo = InMemoryProductRepository::new();
        let created = repo.save(ProductDraft::new(input("A", 1.0, 1))).await.unwrap();

        let updated = repo
            .save(ProductDraft::existing(created.id, input("A2", 2.0, 3)))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "A2");

        let missing = repo.save(ProductDraft::existing(999, input("X", 1.0, 1))).await;
        assert!(matches!(missing, Err(AppError::NotFound(999))));
    }

    #[test]
    fn cents_round_like_numeric() {
        assert_eq!(to_cents(0.285), 0.29);
        assert_eq!(to_cents(1.005), 1.01);
        assert_eq!(to_cents(9.994), 9.99);
        assert_eq!(to_cents(12.0), 12.0);
        assert_eq!(to_cents(0.0), 0.0);
        assert_eq!(to_cents(9_999_999_999.99), 9_999_999_999.99);
    }

    #[tokio::test]
    async fn stored_price_is_rounded_to_cents() {
        let repo = InMemoryProductRepository::new();
        let product = repo.insert(&input("A", 0.285, 1)).await.unwrap();
        assert_eq!(product.price, 0.29);
    }

    #[tokio::test]
    async fn search_sorts_and_pages() {
        let repo = InMemoryProductRepository::new();
        for (name, price) in [("beta", 3.0), ("alpha", 1.0), ("gamma", 2.0)] {
            repo.insert(&input(name, price, 1)).await.unwrap();
        }
        let req = PageRequest {
            page: 0,
            size: 2,
            sort_by: SortField::Price,
            direction: SortDirection::Desc,
        };
        let page = repo.search_by_name_active(None, &req).await.unwrap();
        let names: Vec<&str> = page.content.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "gamma"]);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
    }
}
