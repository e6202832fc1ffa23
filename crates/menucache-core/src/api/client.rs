//! HTTP client for the restaurant menu API.
//!
//! The menu lives at `{base_url}/api/menu`: `GET` returns the collection as a
//! JSON array, `PUT` replaces it.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::{header, Client};
use tracing::debug;

use crate::error::CacheError;
use crate::models::MenuCollection;

use super::{ApiError, MenuSource};

/// Default HTTP request timeout in seconds.
/// Short enough that a dead network flips the cache to its fallback quickly.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Path of the menu resource relative to the base URL
const MENU_PATH: &str = "/api/menu";

/// Menu API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn menu_url(&self) -> String {
        format!("{}{}", self.base_url, MENU_PATH)
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

    /// Fetch the full menu.
    pub async fn fetch_menu(&self) -> Result<MenuCollection, ApiError> {
        let url = self.menu_url();
        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let body = Self::check_response(response).await?.text().await?;
        let menu = MenuCollection::from_json(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))?;

        debug!(count = menu.len(), "Menu fetched");
        Ok(menu)
    }

    /// Replace the menu on the server.
    pub async fn save_menu(&self, items: &MenuCollection) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.menu_url())
            .json(items)
            .send()
            .await?;

        Self::check_response(response).await?;
        debug!(count = items.len(), "Menu saved");
        Ok(())
    }
}

impl MenuSource for ApiClient {
    fn fetch_menu_items(&self) -> BoxFuture<'_, Result<MenuCollection, CacheError>> {
        async move { self.fetch_menu().await.map_err(CacheError::from) }.boxed()
    }

    fn save_menu_items<'a>(
        &'a self,
        items: &'a MenuCollection,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        async move { self.save_menu(items).await.map_err(CacheError::from) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_url_trims_trailing_slash() {
        let client = ApiClient::new("http://localhost:3000/").expect("build client");
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.menu_url(), "http://localhost:3000/api/menu");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_remote_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments
        let client = ApiClient::with_timeout("http://127.0.0.1:9", Duration::from_millis(500))
            .expect("build client");
        let result = client.fetch_menu_items().await;
        assert!(matches!(result, Err(CacheError::RemoteUnavailable(_))));
    }
}
