//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Clamps `page` to at least 1 and `per_page` to `1..=100`.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    /// Number of items to skip. Call on a [`clamped`](Self::clamped) value.
    #[must_use]
    pub fn offset(&self) -> usize {
        let skipped = u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page);
        usize::try_from(skipped).unwrap_or(usize::MAX)
    }

    /// Items per page as a `usize`.
    #[must_use]
    pub fn limit(&self) -> usize {
        usize::try_from(self.per_page).unwrap_or(usize::MAX)
    }

    /// Builds the response metadata for `total` items.
    #[must_use]
    pub fn meta(&self, total: u64) -> PaginationMeta {
        let per_page = u64::from(self.per_page.max(1));
        PaginationMeta {
            page: self.page,
            per_page: self.per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}
