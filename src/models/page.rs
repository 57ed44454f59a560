use std::str::FromStr;

use serde::Serialize;

/// Hard ceiling on page size, whatever the caller asks for.
pub const MAX_PAGE_SIZE: u32 = 1_000;

/// Columns a listing may be ordered by. Parsing goes through this closed set
/// so user input never reaches the ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Description,
    Price,
    Quantity,
    Active,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Description => "description",
            SortField::Price => "price",
            SortField::Quantity => "quantity",
            SortField::Active => "active",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "name" => Ok(SortField::Name),
            "description" => Ok(SortField::Description),
            "price" => Ok(SortField::Price),
            "quantity" => Ok(SortField::Quantity),
            "active" => Ok(SortField::Active),
            "createdAt" | "created_at" => Ok(SortField::CreatedAt),
            "updatedAt" | "updated_at" => Ok(SortField::UpdatedAt),
            other => Err(format!("cannot sort by unknown field '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` in any case selects descending; anything else is ascending.
    pub fn from_param(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort_by: SortField,
    pub direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort_by: SortField::Id,
            direction: SortDirection::Asc,
        }
    }
}

impl PageRequest {
    /// Builds a request from raw query values, rejecting a negative page or a
    /// non-positive size. Oversized pages are clamped to [`MAX_PAGE_SIZE`].
    pub fn parse(
        page: Option<i64>,
        size: Option<i64>,
        sort_by: Option<&str>,
        sort_dir: Option<&str>,
    ) -> Result<Self, String> {
        let page = page.unwrap_or(0);
        if page < 0 {
            return Err("page must be >= 0".to_string());
        }
        let size = size.unwrap_or(10);
        if size < 1 {
            return Err("size must be >= 1".to_string());
        }
        let sort_by = match sort_by {
            Some(raw) => raw.parse()?,
            None => SortField::Id,
        };

        Ok(Self {
            page: u32::try_from(page).map_err(|_| "page is too large".to_string())?,
            size: size.min(i64::from(MAX_PAGE_SIZE)) as u32,
            sort_by,
            direction: sort_dir.map(SortDirection::from_param).unwrap_or_default(),
        })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: i64, request: &PageRequest) -> Self {
        let size = i64::from(request.size.max(1));
        Self {
            content,
            total_elements,
            total_pages: (total_elements + size - 1) / size,
            page: request.page,
            size: request.size,
        }
    }
}
