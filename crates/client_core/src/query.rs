//! Filter, sort and pagination state for the product listing, and the
//! derivation of listing requests from it.

use shared::{
    domain::{CategoryId, PlatformId, SortOrder},
    error::ApiError,
    protocol::ListingRequest,
};

use crate::config::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductFilters {
    pub category_id: Option<CategoryId>,
    pub platform_id: Option<PlatformId>,
    pub name: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Price range check for the filter form; the coordinator does not call this.
    pub fn validate(&self) -> Result<(), ApiError> {
        for (label, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(ApiError::validation(format!(
                        "{label} must be a non-negative number"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ApiError::validation(
                    "min_price must not exceed max_price",
                ));
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: &FilterPatch) {
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(platform_id) = patch.platform_id {
            self.platform_id = platform_id;
        }
        if let Some(name) = &patch.name {
            // Blank clears the filter; anything else is sent verbatim.
            self.name = name.clone().filter(|name| !name.trim().is_empty());
        }
        if let Some(min_price) = patch.min_price {
            self.min_price = min_price;
        }
        if let Some(max_price) = patch.max_price {
            self.max_price = max_price;
        }
    }

    fn write_params(&self, request: &mut ListingRequest) {
        if let Some(category_id) = self.category_id {
            request.set("category_id", category_id.0);
        }
        if let Some(platform_id) = self.platform_id {
            request.set("platform_id", platform_id.0);
        }
        if let Some(name) = &self.name {
            request.set("name", name.as_str());
        }
        if let Some(min_price) = self.min_price {
            request.set("min_price", min_price);
        }
        if let Some(max_price) = self.max_price {
            request.set("max_price", max_price);
        }
    }
}

/// Partial filter update.
///
/// The outer `Option` says whether the key is touched; `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterPatch {
    pub category_id: Option<Option<CategoryId>>,
    pub platform_id: Option<Option<PlatformId>>,
    pub name: Option<Option<String>>,
    pub min_price: Option<Option<f64>>,
    pub max_price: Option<Option<f64>>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn platform(mut self, platform_id: Option<PlatformId>) -> Self {
        self.platform_id = Some(platform_id);
        self
    }

    pub fn name(mut self, name: Option<impl Into<String>>) -> Self {
        self.name = Some(name.map(Into::into));
        self
    }

    pub fn clear_name(mut self) -> Self {
        self.name = Some(None);
        self
    }

    pub fn price_range(mut self, min_price: Option<f64>, max_price: Option<f64>) -> Self {
        self.min_price = Some(min_price);
        self.max_price = Some(max_price);
        self
    }
}

/// 1-indexed page cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn skip(&self) -> u64 {
        u64::from(self.current.max(1) - 1) * u64::from(self.page_size)
    }

    pub fn page_count(&self, total: u64) -> u64 {
        let page_size = u64::from(self.page_size.max(1));
        total.div_ceil(page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaginationPatch {
    pub current: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sorter {
    pub field: Option<String>,
    pub order: Option<SortOrder>,
}

impl Sorter {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: Some(field.into()),
            order: Some(order),
        }
    }

    pub fn is_active(&self) -> bool {
        self.field.is_some() && self.order.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub filters: ProductFilters,
    pub pagination: Pagination,
    pub sorter: Sorter,
    pub request_epoch: u64,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            filters: ProductFilters::default(),
            pagination: Pagination {
                current: 1,
                page_size: page_size.max(1),
            },
            sorter: Sorter::default(),
            request_epoch: 0,
        }
    }
}

/// `skip`/`limit` from the page cursor, every set filter, the sort pair when
/// both halves are set, then `overrides` key by key.
pub fn build_listing_request(
    state: &QueryState,
    overrides: Option<&ListingRequest>,
) -> ListingRequest {
    let mut request = ListingRequest::new()
        .with("skip", state.pagination.skip())
        .with("limit", state.pagination.page_size);

    state.filters.write_params(&mut request);

    if let (Some(field), Some(order)) = (&state.sorter.field, state.sorter.order) {
        request.set("sort_field", field.as_str());
        request.set("sort_order", order.as_query_value());
    }

    if let Some(overrides) = overrides {
        request.merge(overrides);
    }

    request
}

#[cfg(test)]
mod tests {
    use shared::protocol::ParamValue;

    use super::*;

    #[test]
    fn request_contains_only_paging_and_set_filters() {
        let mut state = QueryState::default();
        state.pagination = Pagination {
            current: 2,
            page_size: 20,
        };
        state.filters.category_id = Some(CategoryId(5));

        let request = build_listing_request(&state, None);
        let expected = ListingRequest::new()
            .with("skip", 20_i64)
            .with("limit", 20_i64)
            .with("category_id", 5_i64);
        assert_eq!(request, expected);
    }

    #[test]
    fn half_set_sorter_is_not_sent() {
        let mut state = QueryState::default();
        state.sorter.field = Some("price".into());
        let request = build_listing_request(&state, None);
        assert!(!request.contains("sort_field"));
        assert!(!request.contains("sort_order"));

        state.sorter.order = Some(SortOrder::Descending);
        let request = build_listing_request(&state, None);
        assert_eq!(
            request.get("sort_field"),
            Some(&ParamValue::Text("price".into()))
        );
        assert_eq!(
            request.get("sort_order"),
            Some(&ParamValue::Text("desc".into()))
        );
    }

    #[test]
    fn overrides_win_over_derived_params() {
        let mut state = QueryState::default();
        state.filters.name = Some("lamp".into());
        let overrides = ListingRequest::new()
            .with("limit", 5_i64)
            .with("name", "desk");
        let request = build_listing_request(&state, Some(&overrides));
        assert_eq!(request.get("limit"), Some(&ParamValue::Int(5)));
        assert_eq!(request.get("name"), Some(&ParamValue::Text("desk".into())));
        assert_eq!(request.get("skip"), Some(&ParamValue::Int(0)));
    }

    #[test]
    fn patch_merges_and_clears() {
        let mut filters = ProductFilters {
            category_id: Some(CategoryId(1)),
            platform_id: Some(PlatformId(2)),
            ..ProductFilters::default()
        };

        filters.apply(&FilterPatch::new().name(Some("  cable ")).category(None));
        assert_eq!(filters.category_id, None);
        assert_eq!(filters.platform_id, Some(PlatformId(2)));
        assert_eq!(filters.name.as_deref(), Some("  cable "));

        filters.apply(&FilterPatch::new().name(Some("   ")));
        assert_eq!(filters.name, None);
    }

    #[test]
    fn validates_price_range() {
        let filters = ProductFilters {
            min_price: Some(30.0),
            max_price: Some(10.0),
            ..ProductFilters::default()
        };
        assert!(filters.validate().is_err());

        let filters = ProductFilters {
            min_price: Some(-1.0),
            ..ProductFilters::default()
        };
        assert!(filters.validate().is_err());

        let filters = ProductFilters {
            min_price: Some(10.0),
            max_price: Some(10.0),
            ..ProductFilters::default()
        };
        assert!(filters.validate().is_ok());
    }

    #[test]
    fn pages_are_one_indexed() {
        let pagination = Pagination {
            current: 1,
            page_size: 10,
        };
        assert_eq!(pagination.skip(), 0);
        assert_eq!(pagination.page_count(0), 0);
        assert_eq!(pagination.page_count(21), 3);
    }
}
