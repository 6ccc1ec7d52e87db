use std::{collections::BTreeMap, fmt};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{CategoryId, NotificationId, PlatformId, ProductId, UserId};

fn default_currency() -> String {
    "USD".to_string()
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub url: String,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub sales_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "empty_object")]
    pub specifications: serde_json::Value,
    pub category_id: CategoryId,
    pub platform_id: PlatformId,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub platform_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Create/update payload for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub url: String,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub sales_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<serde_json::Value>,
    pub category_id: CategoryId,
    pub platform_id: PlatformId,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkProductCreate {
    pub products: Vec<ProductInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeProductRequest {
    pub url: String,
}

/// One page of the product listing plus the total matching count.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListingResult {
    pub items: Vec<Product>,
    pub total: u64,
}

impl ListingResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub name: String,
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformInput {
    pub name: String,
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    pub user_id: UserId,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(default)]
    pub product_count: u64,
    #[serde(default)]
    pub category_count: u64,
    #[serde(default)]
    pub platform_count: u64,
    #[serde(default)]
    pub today_added: u64,
    #[serde(default)]
    pub platform_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub category_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub app_name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<SystemInfoUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfoUser {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaChallenge {
    pub captcha_key: String,
    /// Base64-encoded PNG, optionally prefixed with a `data:` URI header.
    pub captcha_image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub captcha_key: String,
    pub captcha_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub is_admin: bool,
    #[serde(default)]
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    pub is_admin: bool,
    #[serde(default)]
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Number(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Query parameters sent to the product listing endpoint.
///
/// Keys are unique; inserting an existing key replaces its value, which is
/// how caller overrides win over coordinator-derived parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingRequest {
    params: BTreeMap<String, ParamValue>,
}

impl ListingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Copies every key of `overrides` over `self`.
    pub fn merge(&mut self, overrides: &ListingRequest) {
        for (key, value) in &overrides.params {
            self.params.insert(key.clone(), value.clone());
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_response_without_optional_fields_decodes() {
        let raw = r#"{
            "total": 42,
            "items": [{
                "id": 1,
                "name": "Desk lamp",
                "url": "https://shop.example/lamp",
                "price": 19.5,
                "category_id": 2,
                "platform_id": 3,
                "created_at": "2024-03-01T10:00:00",
                "updated_at": "2024-03-02T11:30:00.123456"
            }]
        }"#;
        let listing: ListingResult = serde_json::from_str(raw).expect("listing");
        assert_eq!(listing.total, 42);
        let product = &listing.items[0];
        assert_eq!(product.currency, "USD");
        assert_eq!(product.sales_count, 0);
        assert!(product.specifications.is_object());
        assert_eq!(product.category_name, "");
    }

    #[test]
    fn listing_response_without_items_is_rejected() {
        let err = serde_json::from_str::<ListingResult>(r#"{"total": 3}"#).expect_err("missing items");
        assert!(err.to_string().contains("items"));
    }

    #[test]
    fn later_values_replace_earlier_keys() {
        let mut request = ListingRequest::new().with("skip", 20_i64).with("limit", 20_i64);
        request.merge(&ListingRequest::new().with("limit", 5_i64).with("sort_field", "sales"));
        assert_eq!(request.get("limit"), Some(&ParamValue::Int(5)));
        assert_eq!(request.get("skip"), Some(&ParamValue::Int(20)));
        assert_eq!(
            request.to_query_pairs(),
            vec![
                ("limit".to_string(), "5".to_string()),
                ("skip".to_string(), "20".to_string()),
                ("sort_field".to_string(), "sales".to_string()),
            ]
        );
    }
}
