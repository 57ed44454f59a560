use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Core product entity. `active = false` marks a soft-deleted row; such rows
/// stay in the table and remain reachable by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Stored as NUMERIC(12,2), read back as FLOAT8.
    pub price: f64,
    pub quantity: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Request payloads ─────────────────────────────────────────────────────────

/// Body of both create and update. Update is a full replace: fields the
/// caller omits fall back to the defaults below rather than the stored value.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255), custom(function = "valid_name"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "no_nul"))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, max = 9_999_999_999.99))]
    pub price: f64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn valid_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    no_nul(name)
}

/// Postgres text columns cannot hold NUL.
fn no_nul(text: &str) -> Result<(), ValidationError> {
    if text.contains('\0') {
        return Err(ValidationError::new("nul_byte"));
    }
    Ok(())
}

/// A product about to be written. Without an id it is inserted; with one it
/// overwrites the existing row.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub id: Option<i64>,
    pub input: ProductInput,
}

impl ProductDraft {
    pub fn new(input: ProductInput) -> Self {
        Self { id: None, input }
    }

    pub fn existing(id: i64, input: ProductInput) -> Self {
        Self { id: Some(id), input }
    }
}
