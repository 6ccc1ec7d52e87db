//! Product listing coordinator.
//!
//! Owns the query state (filters, sort, page cursor) and the visible result,
//! turns each user intent into one listing fetch, and uses a request epoch so
//! that only the most recently started fetch may change what is displayed.
//! Superseded requests are not aborted; their resolutions are dropped.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    error::ApiError,
    protocol::{ListingRequest, ListingResult, Product},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    config::{DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS},
    query::{build_listing_request, FilterPatch, PaginationPatch, QueryState, Sorter},
};

const FETCH_FAILED_MESSAGE: &str = "failed to fetch product list";

#[async_trait]
pub trait ListingEndpoint: Send + Sync {
    async fn list_products(&self, request: &ListingRequest) -> Result<ListingResult, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

/// User intents that each change the query and then fetch exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryIntent {
    ChangeFilters(FilterPatch),
    ResetFilters,
    ChangePage(u32),
    ChangePageSize(u32),
    ChangeSort(Sorter),
    Retry,
}

/// Read-only copy of the coordinator state handed to the view.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryView {
    pub state: QueryState,
    pub items: Vec<Product>,
    pub total: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: FetchPhase,
}

struct CoordinatorState {
    query: QueryState,
    items: Vec<Product>,
    total: u64,
    loading: bool,
    error: Option<String>,
    phase: FetchPhase,
}

impl CoordinatorState {
    fn new(page_size: u32) -> Self {
        Self {
            query: QueryState::with_page_size(page_size),
            items: Vec::new(),
            total: 0,
            loading: false,
            error: None,
            phase: FetchPhase::Idle,
        }
    }
}

pub struct ProductQueryCoordinator {
    endpoint: Arc<dyn ListingEndpoint>,
    timeout: Duration,
    default_page_size: u32,
    inner: Mutex<CoordinatorState>,
}

impl ProductQueryCoordinator {
    pub fn new(endpoint: Arc<dyn ListingEndpoint>) -> Arc<Self> {
        Self::with_options(
            endpoint,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            DEFAULT_PAGE_SIZE,
        )
    }

    pub fn with_options(
        endpoint: Arc<dyn ListingEndpoint>,
        timeout: Duration,
        default_page_size: u32,
    ) -> Arc<Self> {
        let default_page_size = default_page_size.max(1);
        Arc::new(Self {
            endpoint,
            timeout,
            default_page_size,
            inner: Mutex::new(CoordinatorState::new(default_page_size)),
        })
    }

    pub async fn snapshot(&self) -> QueryView {
        let guard = self.inner.lock().await;
        QueryView {
            state: guard.query.clone(),
            items: guard.items.clone(),
            total: guard.total,
            loading: guard.loading,
            error: guard.error.clone(),
            phase: guard.phase,
        }
    }

    pub async fn query_state(&self) -> QueryState {
        self.inner.lock().await.query.clone()
    }

    /// Merges `patch` into the filters and returns to the first page.
    pub async fn set_filters(&self, patch: FilterPatch) {
        let mut guard = self.inner.lock().await;
        guard.query.filters.apply(&patch);
        guard.query.pagination.current = 1;
    }

    /// Clears filters and sorter and returns to the first page.
    pub async fn reset_filters(&self) {
        let mut guard = self.inner.lock().await;
        let page_size = guard.query.pagination.page_size;
        let epoch = guard.query.request_epoch;
        guard.query = QueryState::with_page_size(page_size);
        guard.query.request_epoch = epoch;
    }

    pub async fn set_pagination(&self, patch: PaginationPatch) {
        let mut guard = self.inner.lock().await;
        if let Some(current) = patch.current {
            guard.query.pagination.current = current.max(1);
        }
        if let Some(page_size) = patch.page_size {
            guard.query.pagination.page_size = page_size.max(1);
        }
    }

    pub async fn set_page(&self, page: u32) {
        self.set_pagination(PaginationPatch {
            current: Some(page),
            page_size: None,
        })
        .await;
    }

    pub async fn set_page_size(&self, page_size: u32) {
        self.set_pagination(PaginationPatch {
            current: None,
            page_size: Some(page_size),
        })
        .await;
    }

    pub async fn set_sorter(&self, sorter: Sorter) {
        self.inner.lock().await.query.sorter = sorter;
    }

    pub async fn clear_error(&self) {
        self.inner.lock().await.error = None;
    }

    /// Applies `intent` and issues the single fetch it implies.
    pub async fn dispatch(&self, intent: QueryIntent) -> ListingResult {
        match intent {
            QueryIntent::ChangeFilters(patch) => self.set_filters(patch).await,
            QueryIntent::ResetFilters => self.reset_filters().await,
            QueryIntent::ChangePage(page) => self.set_page(page).await,
            QueryIntent::ChangePageSize(page_size) => self.set_page_size(page_size).await,
            QueryIntent::ChangeSort(sorter) => self.set_sorter(sorter).await,
            QueryIntent::Retry => {}
        }
        self.fetch_products(None).await
    }

    /// Fetches the page described by the current state, with `overrides`
    /// replacing any derived parameter of the same name.
    ///
    /// Never fails: a failed or timed-out fetch resolves to an empty result
    /// and, if still current, records the error and clears the list. While
    /// the fetch is in flight the previous page stays visible.
    pub async fn fetch_products(&self, overrides: Option<&ListingRequest>) -> ListingResult {
        let (my_epoch, request) = {
            let mut guard = self.inner.lock().await;
            guard.query.request_epoch += 1;
            guard.loading = true;
            guard.phase = FetchPhase::Loading;
            (
                guard.query.request_epoch,
                build_listing_request(&guard.query, overrides),
            )
        };

        debug!(epoch = my_epoch, params = ?request.to_query_pairs(), "products: fetch started");

        let outcome =
            match tokio::time::timeout(self.timeout, self.endpoint.list_products(&request)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ApiError::timeout(format!(
                    "request timed out after {}s",
                    self.timeout.as_secs()
                ))),
            };

        let mut guard = self.inner.lock().await;
        if guard.query.request_epoch != my_epoch {
            debug!(
                epoch = my_epoch,
                current_epoch = guard.query.request_epoch,
                "products: discarding superseded response"
            );
            return outcome.unwrap_or_default();
        }

        match outcome {
            Ok(result) => {
                debug!(
                    epoch = my_epoch,
                    items = result.items.len(),
                    total = result.total,
                    "products: fetch succeeded"
                );
                guard.items = result.items.clone();
                guard.total = result.total;
                guard.loading = false;
                guard.error = None;
                guard.phase = FetchPhase::Success;
                result
            }
            Err(err) => {
                warn!(epoch = my_epoch, code = ?err.code, "products: fetch failed: {err}");
                let message = if err.message.trim().is_empty() {
                    FETCH_FAILED_MESSAGE.to_string()
                } else {
                    err.message
                };
                guard.items.clear();
                guard.total = 0;
                guard.loading = false;
                guard.error = Some(message);
                guard.phase = FetchPhase::Failed;
                ListingResult::empty()
            }
        }
    }

    /// Restores defaults; any fetch still in flight becomes a no-op.
    pub async fn teardown(&self) {
        let mut guard = self.inner.lock().await;
        let next_epoch = guard.query.request_epoch + 1;
        *guard = CoordinatorState::new(self.default_page_size);
        guard.query.request_epoch = next_epoch;
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
