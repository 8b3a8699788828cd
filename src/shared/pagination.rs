//! Pagination and Sorting
//!
//! Every list operation accepts a `ListRequest` and turns it into a typed
//! `ListQuery` before touching the database. Sort columns come from a
//! per-entity allow-list; caller strings are never spliced into SQL.

use serde::{Deserialize, Serialize};

use super::error::AppError;

/// Default upper bound on a page when no settings are supplied.
pub const DEFAULT_MAX_PAGE_LIMIT: i64 = 500;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a caller-supplied order, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    /// SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A sortable field of one entity type.
///
/// Implementors enumerate the permitted keys and map each one to a fixed
/// column name.
pub trait SortKey: Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Key used when the caller does not ask for one.
    const DEFAULT: Self;

    /// Parse a caller-supplied field name.
    fn parse(s: &str) -> Option<Self>;

    /// Column this key sorts on.
    fn column(&self) -> &'static str;
}

/// Validated sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<K: SortKey> {
    pub key: K,
    pub order: SortOrder,
}

impl<K: SortKey> Sort<K> {
    /// `ORDER BY` clause body, e.g. `title DESC, id ASC`.
    ///
    /// A trailing `id` keeps pages stable when the sort column has ties.
    pub fn order_by(&self) -> String {
        let column = self.key.column();
        if column == "id" {
            format!("id {}", self.order.as_sql())
        } else {
            format!("{} {}, id ASC", column, self.order.as_sql())
        }
    }
}

/// Inbound list parameters as a caller supplies them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    pub page_limit: i64,
    pub page_offset: i64,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
}

impl ListRequest {
    pub fn new(page_limit: i64, page_offset: i64) -> Self {
        Self {
            page_limit,
            page_offset,
            sort_field: None,
            sort_order: None,
        }
    }

    pub fn sorted_by(mut self, field: &str, order: &str) -> Self {
        self.sort_field = Some(field.to_string());
        self.sort_order = Some(order.to_string());
        self
    }

    /// Validate paging bounds and resolve the sort against `K`'s allow-list.
    pub fn validate<K: SortKey>(&self, max_limit: i64) -> Result<ListQuery<K>, AppError> {
        if self.page_limit <= 0 {
            return Err(AppError::Validation(
                "page_limit: must be greater than zero".into(),
            ));
        }
        if self.page_limit > max_limit {
            return Err(AppError::Validation(format!(
                "page_limit: must be at most {}",
                max_limit
            )));
        }
        if self.page_offset < 0 {
            return Err(AppError::Validation(
                "page_offset: must not be negative".into(),
            ));
        }

        let key = match self.sort_field.as_deref().map(str::trim) {
            None | Some("") => K::DEFAULT,
            Some(field) => K::parse(field).ok_or_else(|| {
                AppError::Validation(format!("sort_field: '{}' is not sortable", field))
            })?,
        };

        let order = match self.sort_order.as_deref().map(str::trim) {
            None | Some("") => SortOrder::Asc,
            Some(order) => SortOrder::parse(order).ok_or_else(|| {
                AppError::Validation(format!("sort_order: '{}' must be asc or desc", order))
            })?,
        };

        Ok(ListQuery {
            limit: self.page_limit,
            offset: self.page_offset,
            sort: Sort { key, order },
        })
    }
}

/// Validated, typed list parameters handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery<K: SortKey> {
    pub limit: i64,
    pub offset: i64,
    pub sort: Sort<K>,
}
