use std::{collections::BTreeMap, sync::Arc};

use shared::{
    error::ApiError,
    protocol::{ListingRequest, Product, SystemStats},
};

use crate::{
    coordinator::{ListingEndpoint, ProductQueryCoordinator},
    transport::ApiClient,
};

pub const TOP_PRODUCTS_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardSnapshot {
    pub stats: SystemStats,
    pub top_products: Vec<Product>,
    pub platform_ranking: Vec<(String, u64)>,
    pub category_ranking: Vec<(String, u64)>,
    /// Set when the best-seller fetch failed; `top_products` is then empty.
    pub top_products_error: Option<String>,
}

/// Overview screen: aggregate counts plus the best-selling products.
///
/// Uses its own listing coordinator so it never disturbs the product list.
pub struct Dashboard {
    api: Arc<ApiClient>,
    top_products: Arc<ProductQueryCoordinator>,
}

impl Dashboard {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let top_products = ProductQueryCoordinator::with_options(
            Arc::clone(&api) as Arc<dyn ListingEndpoint>,
            api.request_timeout(),
            TOP_PRODUCTS_LIMIT,
        );
        Self { api, top_products }
    }

    pub async fn load(&self) -> Result<DashboardSnapshot, ApiError> {
        let overrides = top_products_request();
        let (stats, top) = tokio::join!(
            self.api.system_stats(),
            self.top_products.fetch_products(Some(&overrides))
        );
        let stats = stats?;
        let top_products_error = self.top_products.snapshot().await.error;
        Ok(DashboardSnapshot {
            platform_ranking: rank(&stats.platform_distribution),
            category_ranking: rank(&stats.category_distribution),
            top_products: top.items,
            top_products_error,
            stats,
        })
    }
}

pub fn top_products_request() -> ListingRequest {
    ListingRequest::new()
        .with("limit", TOP_PRODUCTS_LIMIT)
        .with("sort_field", "sales")
        .with("sort_order", "desc")
}

/// Distribution entries by count, largest first; ties by name.
pub fn rank(distribution: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = distribution
        .iter()
        .map(|(name, count)| (name.clone(), *count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

#[cfg(test)]
mod tests {
    use shared::protocol::ParamValue;

    use super::*;

    #[test]
    fn ranks_by_count_descending() {
        let distribution = BTreeMap::from([
            ("eBay".to_string(), 4),
            ("Amazon".to_string(), 9),
            ("Etsy".to_string(), 4),
        ]);
        assert_eq!(
            rank(&distribution),
            vec![
                ("Amazon".to_string(), 9),
                ("Etsy".to_string(), 4),
                ("eBay".to_string(), 4),
            ]
        );
    }

    #[test]
    fn top_products_sorted_by_sales() {
        let request = top_products_request();
        assert_eq!(request.get("limit"), Some(&ParamValue::Int(5)));
        assert_eq!(
            request.get("sort_order"),
            Some(&ParamValue::Text("desc".into()))
        );
    }

    #[tokio::test]
    async fn failed_best_sellers_are_reported_not_hidden() {
        use axum::{http::StatusCode, routing::get, Json, Router};
        use serde_json::{json, Value};

        use crate::{config::ClientSettings, token_store::MemoryTokenStore};

        async fn handle_stats() -> Json<Value> {
            Json(json!({
                "product_count": 40,
                "category_count": 3,
                "platform_count": 2,
                "today_added": 1,
                "platform_distribution": { "Amazon": 30, "eBay": 10 },
                "category_distribution": { "Lighting": 40 }
            }))
        }

        async fn handle_products() -> (StatusCode, Json<Value>) {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "detail": "search index rebuilding" })),
            )
        }

        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = Router::new()
            .route("/api/system-stats", get(handle_stats))
            .route("/api/products", get(handle_products));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let settings = ClientSettings {
            api_base_url: format!("http://{addr}/api"),
            ..ClientSettings::default()
        };
        let api = ApiClient::new(&settings, Arc::new(MemoryTokenStore::default())).expect("client");

        let snapshot = Dashboard::new(api).load().await.expect("stats still load");
        assert_eq!(snapshot.stats.product_count, 40);
        assert_eq!(snapshot.platform_ranking[0], ("Amazon".to_string(), 30));
        assert!(snapshot.top_products.is_empty());
        assert_eq!(
            snapshot.top_products_error.as_deref(),
            Some("search index rebuilding")
        );
    }
}
