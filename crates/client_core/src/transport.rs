use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{CategoryId, NotificationId, PlatformId, ProductId},
    error::{ApiError, ErrorBody, ErrorCode},
    protocol::{
        BulkProductCreate, CaptchaChallenge, Category, CategoryInput, ListingRequest,
        ListingResult, LoginRequest, LoginResponse, Notification, NotificationInput, Platform,
        PlatformInput, Product, ProductInput, ScrapeProductRequest, SystemInfo, SystemStats,
        UserInfo,
    },
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    config::{normalize_base_url, ClientSettings},
    coordinator::ListingEndpoint,
    token_store::TokenStore,
    ClientEvent,
};

/// HTTP client for the catalog REST API.
///
/// Every request carries the stored bearer token. A 401 response clears the
/// token and broadcasts [`ClientEvent::SessionExpired`]; callers never retry it.
pub struct ApiClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
    tokens: Arc<dyn TokenStore>,
    events: broadcast::Sender<ClientEvent>,
}

impl ApiClient {
    pub fn new(settings: &ClientSettings, tokens: Arc<dyn TokenStore>) -> anyhow::Result<Arc<Self>> {
        let base_url = normalize_base_url(&settings.api_base_url)?;
        let request_timeout = settings.request_timeout();
        let http = Client::builder().timeout(request_timeout).build()?;
        let (events, _) = broadcast::channel(64);
        Ok(Arc::new(Self {
            http,
            base_url,
            request_timeout,
            tokens,
            events,
        }))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let builder = match self.tokens.load() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            if let Err(err) = self.tokens.clear() {
                warn!("session: failed to clear token after 401: {err:#}");
            }
            warn!("session: server rejected credentials status=401; token cleared");
            self.emit(ClientEvent::SessionExpired);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.execute(builder).await?;
        let body = response.text().await.map_err(map_transport_error)?;
        serde_json::from_str(&body)
            .map_err(|err| ApiError::decode(format!("unexpected response body: {err}")))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.execute(builder).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.http.get(self.url(path))).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.http.post(self.url(path)).json(body)).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.http.put(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send_empty(self.http.delete(self.url(path))).await
    }

    pub async fn captcha(&self) -> Result<CaptchaChallenge, ApiError> {
        self.get("/auth/captcha").await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post("/auth/login", request).await
    }

    pub async fn current_user(&self) -> Result<UserInfo, ApiError> {
        self.get("/auth/me").await
    }

    pub async fn list_products(&self, request: &ListingRequest) -> Result<ListingResult, ApiError> {
        debug!(params = ?request.to_query_pairs(), "api: GET /products");
        self.send_json(
            self.http
                .get(self.url("/products"))
                .query(&request.to_query_pairs()),
        )
        .await
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.get(&format!("/products/{id}")).await
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        self.post("/products", input).await
    }

    pub async fn create_products_bulk(
        &self,
        products: Vec<ProductInput>,
    ) -> Result<Vec<Product>, ApiError> {
        self.post("/products/bulk", &BulkProductCreate { products })
            .await
    }

    pub async fn scrape_product(&self, url: &str) -> Result<Product, ApiError> {
        self.post(
            "/products/scrape",
            &ScrapeProductRequest {
                url: url.to_string(),
            },
        )
        .await
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        self.put(&format!("/products/{id}"), input).await
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        self.delete(&format!("/products/{id}")).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get("/categories").await
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Category, ApiError> {
        self.get(&format!("/categories/{id}")).await
    }

    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, ApiError> {
        self.post("/categories", input).await
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, ApiError> {
        self.put(&format!("/categories/{id}"), input).await
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
        self.delete(&format!("/categories/{id}")).await
    }

    pub async fn list_platforms(&self) -> Result<Vec<Platform>, ApiError> {
        self.get("/platforms").await
    }

    pub async fn get_platform(&self, id: PlatformId) -> Result<Platform, ApiError> {
        self.get(&format!("/platforms/{id}")).await
    }

    pub async fn create_platform(&self, input: &PlatformInput) -> Result<Platform, ApiError> {
        self.post("/platforms", input).await
    }

    pub async fn update_platform(
        &self,
        id: PlatformId,
        input: &PlatformInput,
    ) -> Result<Platform, ApiError> {
        self.put(&format!("/platforms/{id}"), input).await
    }

    pub async fn delete_platform(&self, id: PlatformId) -> Result<(), ApiError> {
        self.delete(&format!("/platforms/{id}")).await
    }

    pub async fn list_notifications(
        &self,
        is_read: Option<bool>,
    ) -> Result<Vec<Notification>, ApiError> {
        let mut builder = self.http.get(self.url("/notifications"));
        if let Some(is_read) = is_read {
            builder = builder.query(&[("is_read", is_read)]);
        }
        self.send_json(builder).await
    }

    pub async fn get_notification(&self, id: NotificationId) -> Result<Notification, ApiError> {
        self.get(&format!("/notifications/{id}")).await
    }

    pub async fn create_notification(
        &self,
        input: &NotificationInput,
    ) -> Result<Notification, ApiError> {
        self.post("/notifications", input).await
    }

    pub async fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> Result<Notification, ApiError> {
        self.send_json(self.http.put(self.url(&format!("/notifications/{id}/read"))))
            .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
        self.send_empty(self.http.put(self.url("/notifications/read-all")))
            .await
    }

    pub async fn delete_notification(&self, id: NotificationId) -> Result<(), ApiError> {
        self.delete(&format!("/notifications/{id}")).await
    }

    pub async fn system_info(&self) -> Result<SystemInfo, ApiError> {
        self.get("/system-info").await
    }

    pub async fn system_stats(&self) -> Result<SystemStats, ApiError> {
        self.get("/system-stats").await
    }
}

#[async_trait]
impl ListingEndpoint for ApiClient {
    async fn list_products(&self, request: &ListingRequest) -> Result<ListingResult, ApiError> {
        ApiClient::list_products(self, request).await
    }
}

fn map_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::timeout(format!("request timed out: {err}"))
    } else if err.is_decode() {
        ApiError::decode(format!("unexpected response body: {err}"))
    } else {
        ApiError::network(format!("network error: {err}"))
    }
}

pub(crate) fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let code = ErrorCode::from_status(status.as_u16());
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message())
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
    ApiError::new(code, message)
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
