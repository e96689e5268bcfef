//! Listing queries over a user's images.

use serde::{Deserialize, Serialize};
use vitrine_error::ValidationError;

/// Largest page a single listing may return.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Visibility filter for listings.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageFilter {
    /// Every image the user owns
    #[default]
    All,
    /// Only private images
    Private,
    /// Only public images
    Public,
}

/// Timestamp a listing is sorted by.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    /// Ownership creation time
    CreatedTime,
    /// Last visibility change
    #[default]
    UpdatedTime,
}

/// Paginated listing query.
///
/// # Examples
///
/// ```
/// use vitrine_core::{ImageFilter, ListQuery, OrderBy};
///
/// let query = ListQuery::builder()
///     .filter(ImageFilter::Public)
///     .order_by(OrderBy::CreatedTime)
///     .ascending(true)
///     .limit(20)
///     .build();
///
/// assert!(query.validate().is_ok());
/// assert_eq!(query.offset(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ListQuery {
    /// Visibility filter
    #[serde(default)]
    filter: ImageFilter,
    /// Sort key
    #[serde(default)]
    order_by: OrderBy,
    /// Sort direction
    #[serde(default)]
    ascending: bool,
    /// 1-based page number
    #[serde(default = "default_page")]
    page: i64,
    /// Page size, at most [`MAX_PAGE_LIMIT`]
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: ImageFilter::default(),
            order_by: OrderBy::default(),
            ascending: false,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl ListQuery {
    /// Creates a new listing query builder.
    pub fn builder() -> ListQueryBuilder {
        ListQueryBuilder::default()
    }

    /// Checks pagination bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if `page < 1`, `limit` is outside `1..=100`, or the
    /// page starts beyond the largest representable row offset.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page < 1 {
            return Err(ValidationError::new(
                "page",
                format!("must be at least 1, got {}", self.page),
            ));
        }
        if self.limit < 1 || self.limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::new(
                "limit",
                format!("must be between 1 and {}, got {}", MAX_PAGE_LIMIT, self.limit),
            ));
        }
        if (self.page - 1).checked_mul(self.limit).is_none() {
            return Err(ValidationError::new(
                "page",
                format!("{} is too large for a limit of {}", self.page, self.limit),
            ));
        }
        Ok(())
    }

    /// Number of rows skipped before this page, saturating at `i64::MAX`.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit.max(0))
    }
}

/// Builder for `ListQuery`.
#[derive(Debug, Default)]
pub struct ListQueryBuilder {
    filter: Option<ImageFilter>,
    order_by: Option<OrderBy>,
    ascending: Option<bool>,
    page: Option<i64>,
    limit: Option<i64>,
}

impl ListQueryBuilder {
    /// Sets the visibility filter.
    pub fn filter(mut self, value: ImageFilter) -> Self {
        self.filter = Some(value);
        self
    }

    /// Sets the sort key.
    pub fn order_by(mut self, value: OrderBy) -> Self {
        self.order_by = Some(value);
        self
    }

    /// Sets the sort direction.
    pub fn ascending(mut self, value: bool) -> Self {
        self.ascending = Some(value);
        self
    }

    /// Sets the 1-based page number.
    pub fn page(mut self, value: i64) -> Self {
        self.page = Some(value);
        self
    }

    /// Sets the page size.
    pub fn limit(mut self, value: i64) -> Self {
        self.limit = Some(value);
        self
    }

    /// Builds the `ListQuery`. Bounds are checked by [`ListQuery::validate`].
    pub fn build(self) -> ListQuery {
        let defaults = ListQuery::default();
        ListQuery {
            filter: self.filter.unwrap_or(defaults.filter),
            order_by: self.order_by.unwrap_or(defaults.order_by),
            ascending: self.ascending.unwrap_or(defaults.ascending),
            page: self.page.unwrap_or(defaults.page),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}
