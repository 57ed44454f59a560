use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::*;

#[cfg(test)]
pub mod memory;

/// Typed query surface over the products table. Every read except
/// `find_by_id` is scoped to active rows.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Returns the row whatever its active flag.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Product>>;

    async fn find_all_active(&self) -> AppResult<Vec<Product>>;

    /// Case-insensitive substring match on `name`; `None` matches every
    /// active row.
    async fn search_by_name_active(
        &self,
        name: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<Page<Product>>;

    /// Inclusive at both bounds.
    async fn find_in_price_range(&self, min: f64, max: f64) -> AppResult<Vec<Product>>;

    /// Rows with `quantity <= threshold`.
    async fn find_low_stock(&self, threshold: i32) -> AppResult<Vec<Product>>;

    async fn count_active(&self) -> AppResult<i64>;

    async fn insert(&self, input: &ProductInput) -> AppResult<Product>;

    /// Overwrites every mutable column in one statement. `None` if the id is
    /// unknown.
    async fn replace(&self, id: i64, input: &ProductInput) -> AppResult<Option<Product>>;

    /// Clears the active flag. Returns `false` if the id is unknown.
    async fn deactivate(&self, id: i64) -> AppResult<bool>;

    async fn ping(&self) -> AppResult<()>;

    /// Inserts a new draft or fully overwrites an existing one.
    async fn save(&self, draft: ProductDraft) -> AppResult<Product> {
        match draft.id {
            None => self.insert(&draft.input).await,
            Some(id) => self
                .replace(id, &draft.input)
                .await?
                .ok_or(AppError::NotFound(id)),
        }
    }
}

// ── PostgreSQL ────────────────────────────────────────────────────────────────

const COLUMNS: &str =
    "id, name, description, price::FLOAT8 AS price, quantity, active, created_at, updated_at";

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes LIKE metacharacters so the caller's text is matched literally.
fn like_pattern(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push('%');
    for c in name.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_all_active(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM products WHERE active = TRUE ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn search_by_name_active(
        &self,
        name: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<Page<Product>> {
        let pattern = name.map(like_pattern);

        // Page and count must agree, so both run in one read-only snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let content = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM products
            WHERE active = TRUE
              AND ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
            ORDER BY {} {}, id ASC
            LIMIT $2 OFFSET $3
            "#,
            page.sort_by.column(),
            page.direction.keyword(),
        ))
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE active = TRUE
              AND ($1::text IS NULL OR name ILIKE $1 ESCAPE '\')
            "#,
        )
        .bind(pattern.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            returned = content.len(),
            total,
            page = page.page,
            size = page.size,
            "Searched active products"
        );

        Ok(Page::new(content, total, page))
    }

    async fn find_in_price_range(&self, min: f64, max: f64) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM products
            WHERE active = TRUE
              AND price BETWEEN $1::float8::numeric AND $2::float8::numeric
            ORDER BY price, id
            "#
        ))
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn find_low_stock(&self, threshold: i32) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM products
            WHERE active = TRUE AND quantity <= $1
            ORDER BY quantity, id
            "#
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn count_active(&self) -> AppResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE active = TRUE")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn insert(&self, input: &ProductInput) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, description, price, quantity, active)
            VALUES ($1, $2, $3::float8::numeric, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn replace(&self, id: i64, input: &ProductInput) -> AppResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name        = $1,
                description = $2,
                price       = $3::float8::numeric,
                quantity    = $4,
                active      = $5,
                updated_at  = NOW()
            WHERE id = $6
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn deactivate(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
