//! Offset pagination primitives shared by storefront list endpoints.
//!
//! A [`PageRequest`] is parsed from the `page` and `limit` query parameters
//! and translated into an `offset`/`limit` pair for the store query. The
//! matching [`Page`] envelope carries the fetched items together with the
//! total row count so clients can render page navigation.
//!
//! Counts and page fetches are independent reads, so the envelope is not a
//! snapshot: totals can drift under concurrent writes.
//!
//! # Examples
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::parse(Some("2"), Some("5")).expect("valid page");
//! assert_eq!(request.offset(), 5);
//!
//! let page = Page::new(vec!["f", "g"], 7, request);
//! assert_eq!(page.total_pages(), 2);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Page number used when the client omits `page`.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the client omits `limit`.
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size served; larger requests are clamped.
pub const MAX_LIMIT: u32 = 100;

/// Query parameter that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageField {
    /// The one-based page number.
    Page,
    /// The number of items per page.
    Limit,
}

impl PageField {
    /// Name of the query parameter as sent by clients.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Limit => "limit",
        }
    }
}

impl fmt::Display for PageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures raised while building a [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// The parameter is not a positive integer.
    #[error("{field} must be a positive integer")]
    NotPositive {
        /// Offending parameter.
        field: PageField,
        /// Raw value received from the client.
        value: String,
    },
}

impl PageRequestError {
    /// Parameter that failed validation.
    #[must_use]
    pub const fn field(&self) -> PageField {
        match self {
            Self::NotPositive { field, .. } => *field,
        }
    }

    /// Raw value that failed validation.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::NotPositive { value, .. } => value,
        }
    }
}

/// Validated one-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build a request from already-parsed numbers.
    ///
    /// `limit` values above [`MAX_LIMIT`] are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError::NotPositive`] when either value is zero.
    pub fn new(page: u32, limit: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::NotPositive {
                field: PageField::Page,
                value: page.to_string(),
            });
        }
        if limit == 0 {
            return Err(PageRequestError::NotPositive {
                field: PageField::Limit,
                value: limit.to_string(),
            });
        }
        Ok(Self {
            page,
            limit: limit.min(MAX_LIMIT),
        })
    }

    /// Parse raw query values, falling back to the defaults when absent.
    ///
    /// Blank values count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError::NotPositive`] when a value is not an
    /// integer of at least one.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::{PageField, PageRequest};
    ///
    /// let err = PageRequest::parse(Some("-3"), None).unwrap_err();
    /// assert_eq!(err.field(), PageField::Page);
    /// ```
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, PageRequestError> {
        let page = parse_field(PageField::Page, page, DEFAULT_PAGE)?;
        let limit = parse_field(PageField::Limit, limit, DEFAULT_LIMIT)?;
        Self::new(page, limit)
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Number of rows to skip before the page starts.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Number of pages needed to show `total_count` rows.
    #[must_use]
    pub fn total_pages(self, total_count: u64) -> u64 {
        total_count.div_ceil(u64::from(self.limit))
    }
}

fn parse_field(field: PageField, raw: Option<&str>, default: u32) -> Result<u32, PageRequestError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(default);
    };
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(PageRequestError::NotPositive {
            field,
            value: value.to_owned(),
        }),
    }
}

/// One page of results plus the totals needed for navigation.
///
/// Serialises as `{"items", "totalCount", "currentPage", "totalPages"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    total_count: u64,
    current_page: u32,
    total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from the fetched rows and the independent count.
    #[must_use]
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            current_page: request.page(),
            total_pages: request.total_pages(total_count),
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Total rows matching the filter across all pages.
    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    /// One-based number of this page.
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Number of pages available.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Consume the page, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Transform every item while keeping the totals.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            current_page: self.current_page,
            total_pages: self.total_pages,
        }
    }
}
