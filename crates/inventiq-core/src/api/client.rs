//! API client for communicating with the InventIQ REST API.
//!
//! `ApiClient` is the single outbound channel to the backend. It reads the
//! stored credential before every request and sends it verbatim as the
//! `Authorization` header. It never retries, caches, or de-duplicates calls.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{header, Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::storage::{KeyValueStore, TOKEN_KEY};
use crate::models::{
    Acknowledgement, DemandForecast, InsightsRequest, InsightsResponse, LoginRequest,
    LoginResponse, Product, ProductDraft, ProductUpdate, RegisterRequest, RestockRecommendation,
    Role, Transaction,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Backend address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Forecast horizon used by the dashboard when none is given
pub const DEFAULT_FORECAST_DAYS: u32 = 30;

/// API client for the InventIQ backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    storage: Arc<dyn KeyValueStore>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid API URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            bail!("Invalid API URL: {}", base_url);
        }

        Ok(Self {
            client,
            base_url,
            storage,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append path segments to the base URL, percent-encoding each one.
    /// A trailing empty segment produces a trailing slash.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Build the authorization header from whatever credential is stored right now.
    /// A credential that cannot be read is treated as absent.
    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let token = self.storage.get(TOKEN_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read stored credential, sending none");
            None
        });
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let value = header::HeaderValue::from_str(&token)
                .map_err(|_| ApiError::InvalidCredential)?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, url: &Url, request: RequestBuilder) -> Result<T, ApiError> {
        let path = url.path();
        debug!(%method, path, "Sending request");

        let response = request
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(|e| {
                warn!(%method, path, error = %e, "Request failed");
                ApiError::NetworkError(e)
            })?;

        let response = Self::check_response(response).await.map_err(|e| {
            warn!(%method, path, error = %e, "Backend rejected request");
            e
        })?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, ApiError> {
        let url = self.url(path);
        let request = self.client.get(url.clone());
        self.send(Method::GET, &url, request).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &[&str],
        query: &Q,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let request = self.client.get(url.clone()).query(query);
        self.send(Method::GET, &url, request).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &[&str], body: &B) -> Result<T, ApiError> {
        let url = self.url(path);
        let request = self.client.post(url.clone()).json(body);
        self.send(Method::POST, &url, request).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &[&str], body: &B) -> Result<T, ApiError> {
        let url = self.url(path);
        let request = self.client.put(url.clone()).json(body);
        self.send(Method::PUT, &url, request).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, ApiError> {
        let url = self.url(path);
        let request = self.client.delete(url.clone());
        self.send(Method::DELETE, &url, request).await
    }

    // ===== Authentication =====

    /// Exchange credentials for a token and the user's profile.
    /// The email address goes in the backend's `username` field.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.post(&["auth", "login"], &LoginRequest { username: email, password }).await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<Acknowledgement, ApiError> {
        let body = RegisterRequest {
            username,
            email,
            password,
            role,
        };
        self.post(&["auth", "register"], &body).await
    }

    // ===== Inventory =====

    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get(&["inventory", ""]).await
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product, ApiError> {
        self.get(&["inventory", product_id]).await
    }

    pub async fn add_product(&self, product: &ProductDraft) -> Result<Product, ApiError> {
        self.post(&["inventory", ""], product).await
    }

    pub async fn update_product(&self, product_id: &str, update: &ProductUpdate) -> Result<Product, ApiError> {
        self.put(&["inventory", product_id], update).await
    }

    pub async fn delete_product(&self, product_id: &str) -> Result<Acknowledgement, ApiError> {
        self.delete(&["inventory", product_id]).await
    }

    pub async fn record_transaction(&self, transaction: &Transaction) -> Result<Acknowledgement, ApiError> {
        self.post(&["inventory", "transaction"], transaction).await
    }

    // ===== Predictions =====

    pub async fn demand_forecast(&self, product_id: &str, days: u32) -> Result<DemandForecast, ApiError> {
        self.get_with_query(&["predictions", "forecast", product_id], &[("days", days)])
            .await
    }

    pub async fn restock_recommendation(
        &self,
        product_id: &str,
        trending: bool,
    ) -> Result<RestockRecommendation, ApiError> {
        self.get_with_query(&["predictions", "restock", product_id], &[("trending", trending)])
            .await
    }

    /// Ask the assistant endpoint a free-form question, optionally about one product.
    pub async fn insights(&self, query: &str, product_id: Option<&str>) -> Result<String, ApiError> {
        let response: InsightsResponse = self
            .post(&["predictions", "insights"], &InsightsRequest { query, product_id })
            .await?;
        Ok(response.insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::MemoryStorage;

    fn client_with(storage: Arc<MemoryStorage>) -> ApiClient {
        ApiClient::new("http://localhost:5000/api/", storage).expect("client builds")
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = client_with(Arc::new(MemoryStorage::new()));
        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(client.url(&["inventory", ""]).as_str(), "http://localhost:5000/api/inventory/");
        assert_eq!(client.url(&["inventory", "7"]).as_str(), "http://localhost:5000/api/inventory/7");
    }

    #[test]
    fn test_url_encodes_ids() {
        let client = client_with(Arc::new(MemoryStorage::new()));
        assert_eq!(
            client.url(&["inventory", "a/b?c#d"]).as_str(),
            "http://localhost:5000/api/inventory/a%2Fb%3Fc%23d"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let storage = Arc::new(MemoryStorage::new());
        assert!(ApiClient::new("not a url", storage.clone()).is_err());
        assert!(ApiClient::new("mailto:ops@example.com", storage).is_err());
    }

    #[test]
    fn test_auth_headers_follow_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let client = client_with(storage.clone());
        assert!(client.auth_headers().unwrap().get(header::AUTHORIZATION).is_none());

        storage.set(TOKEN_KEY, "abc.def").unwrap();
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "abc.def");

        storage.remove(TOKEN_KEY).unwrap();
        assert!(client.auth_headers().unwrap().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_headers_reject_unsendable_token() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "bad\ntoken").unwrap();
        let client = client_with(storage);
        assert!(matches!(client.auth_headers(), Err(ApiError::InvalidCredential)));
    }
}
