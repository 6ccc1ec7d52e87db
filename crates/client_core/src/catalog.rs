use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{CategoryId, PlatformId, ProductId},
    error::ApiError,
    protocol::{Category, CategoryInput, Platform, PlatformInput, Product, ProductInput},
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    config::ClientSettings,
    coordinator::{ListingEndpoint, ProductQueryCoordinator},
    transport::ApiClient,
};

/// Product screen state: the listing coordinator plus product mutations.
///
/// Every successful mutation is followed by one listing fetch so the visible
/// page reflects the change.
pub struct ProductCatalog {
    api: Arc<ApiClient>,
    listing: Arc<ProductQueryCoordinator>,
}

impl ProductCatalog {
    pub fn new(api: Arc<ApiClient>, default_page_size: u32) -> Self {
        let listing = ProductQueryCoordinator::with_options(
            Arc::clone(&api) as Arc<dyn ListingEndpoint>,
            api.request_timeout(),
            default_page_size,
        );
        Self { api, listing }
    }

    pub fn from_settings(api: Arc<ApiClient>, settings: &ClientSettings) -> Self {
        Self::new(api, settings.default_page_size)
    }

    pub fn listing(&self) -> &Arc<ProductQueryCoordinator> {
        &self.listing
    }

    pub async fn get(&self, id: ProductId) -> Result<Product, ApiError> {
        self.api.get_product(id).await
    }

    pub async fn create(&self, input: &ProductInput) -> Result<Product, ApiError> {
        let product = self.api.create_product(input).await?;
        info!(product_id = product.id.0, "products: created");
        self.listing.fetch_products(None).await;
        Ok(product)
    }

    pub async fn create_bulk(&self, inputs: Vec<ProductInput>) -> Result<Vec<Product>, ApiError> {
        if inputs.is_empty() {
            return Err(ApiError::validation("no products to import"));
        }
        let products = self.api.create_products_bulk(inputs).await?;
        info!(count = products.len(), "products: bulk created");
        self.listing.fetch_products(None).await;
        Ok(products)
    }

    pub async fn scrape(&self, url: &str) -> Result<Product, ApiError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ApiError::validation("product url must not be empty"));
        }
        let product = self.api.scrape_product(url).await?;
        info!(product_id = product.id.0, "products: scraped from {url}");
        self.listing.fetch_products(None).await;
        Ok(product)
    }

    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, ApiError> {
        let product = self.api.update_product(id, input).await?;
        self.listing.fetch_products(None).await;
        Ok(product)
    }

    pub async fn delete(&self, id: ProductId) -> Result<(), ApiError> {
        self.api.delete_product(id).await?;
        info!(product_id = id.0, "products: deleted");
        self.listing.fetch_products(None).await;
        Ok(())
    }
}

/// A record type served by a simple list/get/create/update/delete resource.
#[async_trait]
pub trait CatalogResource: Clone + Send + Sync + 'static {
    type Id: Copy + PartialEq + Send + Sync;
    type Input: Send + Sync;

    const LABEL: &'static str;

    fn id(&self) -> Self::Id;
    async fn list(api: &ApiClient) -> Result<Vec<Self>, ApiError>;
    async fn get(api: &ApiClient, id: Self::Id) -> Result<Self, ApiError>;
    async fn create(api: &ApiClient, input: &Self::Input) -> Result<Self, ApiError>;
    async fn update(api: &ApiClient, id: Self::Id, input: &Self::Input)
        -> Result<Self, ApiError>;
    async fn delete(api: &ApiClient, id: Self::Id) -> Result<(), ApiError>;
}

#[async_trait]
impl CatalogResource for Category {
    type Id = CategoryId;
    type Input = CategoryInput;

    const LABEL: &'static str = "categories";

    fn id(&self) -> CategoryId {
        self.id
    }

    async fn list(api: &ApiClient) -> Result<Vec<Self>, ApiError> {
        api.list_categories().await
    }

    async fn get(api: &ApiClient, id: CategoryId) -> Result<Self, ApiError> {
        api.get_category(id).await
    }

    async fn create(api: &ApiClient, input: &CategoryInput) -> Result<Self, ApiError> {
        api.create_category(input).await
    }

    async fn update(api: &ApiClient, id: CategoryId, input: &CategoryInput) -> Result<Self, ApiError> {
        api.update_category(id, input).await
    }

    async fn delete(api: &ApiClient, id: CategoryId) -> Result<(), ApiError> {
        api.delete_category(id).await
    }
}

#[async_trait]
impl CatalogResource for Platform {
    type Id = PlatformId;
    type Input = PlatformInput;

    const LABEL: &'static str = "platforms";

    fn id(&self) -> PlatformId {
        self.id
    }

    async fn list(api: &ApiClient) -> Result<Vec<Self>, ApiError> {
        api.list_platforms().await
    }

    async fn get(api: &ApiClient, id: PlatformId) -> Result<Self, ApiError> {
        api.get_platform(id).await
    }

    async fn create(api: &ApiClient, input: &PlatformInput) -> Result<Self, ApiError> {
        api.create_platform(input).await
    }

    async fn update(api: &ApiClient, id: PlatformId, input: &PlatformInput) -> Result<Self, ApiError> {
        api.update_platform(id, input).await
    }

    async fn delete(api: &ApiClient, id: PlatformId) -> Result<(), ApiError> {
        api.delete_platform(id).await
    }
}

/// Cached list of one catalog resource; mutations refresh the cache.
pub struct CatalogStore<R: CatalogResource> {
    api: Arc<ApiClient>,
    items: RwLock<Vec<R>>,
}

pub type CategoryStore = CatalogStore<Category>;
pub type PlatformStore = CatalogStore<Platform>;

impl<R: CatalogResource> CatalogStore<R> {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            items: RwLock::new(Vec::new()),
        }
    }

    pub async fn items(&self) -> Vec<R> {
        self.items.read().await.clone()
    }

    pub async fn refresh(&self) -> Result<Vec<R>, ApiError> {
        let items = R::list(&self.api).await.inspect_err(|err| {
            warn!("{}: refresh failed: {err}", R::LABEL);
        })?;
        *self.items.write().await = items.clone();
        Ok(items)
    }

    pub async fn get(&self, id: R::Id) -> Result<R, ApiError> {
        if let Some(cached) = self
            .items
            .read()
            .await
            .iter()
            .find(|item| item.id() == id)
        {
            return Ok(cached.clone());
        }
        R::get(&self.api, id).await
    }

    /// The mutation result stands even when the follow-up refresh fails;
    /// the cache then keeps its previous contents.
    pub async fn create(&self, input: &R::Input) -> Result<R, ApiError> {
        let created = R::create(&self.api, input).await?;
        self.refresh_after_mutation().await;
        Ok(created)
    }

    pub async fn update(&self, id: R::Id, input: &R::Input) -> Result<R, ApiError> {
        let updated = R::update(&self.api, id, input).await?;
        self.refresh_after_mutation().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: R::Id) -> Result<(), ApiError> {
        R::delete(&self.api, id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    async fn refresh_after_mutation(&self) {
        // `refresh` logs its own failure.
        let _ = self.refresh().await;
    }
}

/// Dropdown options for the product filter form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub categories: Vec<Category>,
    pub platforms: Vec<Platform>,
}

impl FilterOptions {
    pub async fn load(
        categories: &CategoryStore,
        platforms: &PlatformStore,
    ) -> Result<Self, ApiError> {
        let (categories, platforms) = tokio::join!(categories.refresh(), platforms.refresh());
        Ok(Self {
            categories: categories?,
            platforms: platforms?,
        })
    }

    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.name.as_str())
    }

    pub fn platform_name(&self, id: PlatformId) -> Option<&str> {
        self.platforms
            .iter()
            .find(|platform| platform.id == id)
            .map(|platform| platform.name.as_str())
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
