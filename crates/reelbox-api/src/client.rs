use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use reelbox_core::config::ServerConfig;
use reelbox_core::models::{ContentKind, ContentPage};

use super::error::ApiError;
use super::traits::{ContentProvider, SessionProvider};
use super::types::{DoubanResponse, ServerConfigResponse};

/// HTTP client for a catalog server.
pub struct ApiClient {
    base_url: RwLock<String>,
    auth_cookie: Option<String>,
    logged_in: AtomicBool,
    http: Client,
}

impl ApiClient {
    pub fn new(server: &ServerConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(server.request_timeout_secs))
            .build()?;
        Ok(Self {
            base_url: RwLock::new(server.api_base_url.clone()),
            auth_cookie: server.auth_cookie.clone(),
            logged_in: AtomicBool::new(false),
            http,
        })
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .read()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    pub fn set_base_url(&self, url: &str) {
        if let Ok(mut base) = self.base_url.write() {
            *base = url.to_string();
        }
    }

    /// Join `path` onto a base URL, keeping any path prefix the base carries.
    fn endpoint(base: &str, path: &str) -> Result<Url, ApiError> {
        let base = base.trim();
        if base.is_empty() {
            return Err(ApiError::ApiUrlNotSet);
        }
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        let req = self.http.get(url);
        match &self.auth_cookie {
            Some(cookie) => req.header("Cookie", cookie),
            None => req,
        }
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(&self, resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.logged_in.store(false, Ordering::Relaxed);
            return Err(ApiError::Unauthorized);
        }
        let status = status.as_u16();
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status, "Catalog server error");
        Err(ApiError::Status {
            status,
            message: body,
        })
    }

    /// Fetch the server's public configuration.
    pub async fn server_config(&self, api_base_url: &str) -> Result<ServerConfigResponse, ApiError> {
        let url = Self::endpoint(api_base_url, "api/server-config")?;
        let resp = self.get(url).send().await?;
        let resp = self.check_response(resp).await?;
        resp.json().await.map_err(|e| ApiError::Parse(e.to_string()))
    }
}

impl ContentProvider for ApiClient {
    #[tracing::instrument(name = "fetch_page", skip(self, kind), fields(kind = %kind))]
    async fn fetch_page(
        &self,
        kind: ContentKind,
        tag: &str,
        page_size: u32,
        offset: usize,
    ) -> Result<ContentPage, ApiError> {
        let mut url = Self::endpoint(&self.base_url(), "api/douban")?;
        url.query_pairs_mut()
            .append_pair("type", kind.as_str())
            .append_pair("tag", tag)
            .append_pair("pageSize", &page_size.to_string())
            .append_pair("pageStart", &offset.to_string());

        let resp = self.get(url).send().await?;
        let resp = self.check_response(resp).await?;
        let page: DoubanResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let page = page.into_page(kind);
        tracing::debug!(count = page.items.len(), fetched = page.fetched, "Fetched catalog page");
        Ok(page)
    }
}

impl SessionProvider for ApiClient {
    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::Relaxed)
    }

    async fn check_login_status(&self, api_base_url: &str) -> Result<(), ApiError> {
        if api_base_url.trim().is_empty() {
            self.logged_in.store(false, Ordering::Relaxed);
            return Ok(());
        }
        self.set_base_url(api_base_url);

        let config = match self.server_config(api_base_url).await {
            Ok(config) => config,
            Err(e) => {
                self.logged_in.store(false, Ordering::Relaxed);
                return Err(e);
            }
        };
        let logged_in = config.is_account_free() || self.auth_cookie.is_some();
        tracing::debug!(
            logged_in,
            storage = config.storage_type.as_deref().unwrap_or("unknown"),
            "Session checked"
        );
        self.logged_in.store(logged_in, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(url: &str) -> ServerConfig {
        ServerConfig {
            api_base_url: url.into(),
            auth_cookie: None,
            request_timeout_secs: 2,
        }
    }

    #[test]
    fn test_endpoint_join() {
        let url = ApiClient::endpoint("http://10.0.0.2:3000", "api/douban").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2:3000/api/douban");

        let url = ApiClient::endpoint("https://tv.example.com/moon/", "/api/douban").unwrap();
        assert_eq!(url.as_str(), "https://tv.example.com/moon/api/douban");

        let url = ApiClient::endpoint("https://tv.example.com/moon", "api/server-config").unwrap();
        assert_eq!(url.as_str(), "https://tv.example.com/moon/api/server-config");
    }

    #[test]
    fn test_endpoint_requires_base() {
        assert!(matches!(
            ApiClient::endpoint("  ", "api/douban"),
            Err(ApiError::ApiUrlNotSet)
        ));
        assert!(matches!(
            ApiClient::endpoint("not a url", "api/douban"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_without_base_url() {
        let client = ApiClient::new(&server("")).unwrap();
        let result = client.fetch_page(ContentKind::Movie, "热门", 20, 0).await;
        assert!(matches!(result, Err(ApiError::ApiUrlNotSet)));
    }

    #[tokio::test]
    async fn test_malformed_base_url_is_config_error() {
        let client = ApiClient::new(&server("10.0.0.2:3000/moon")).unwrap();
        let result = client.fetch_page(ContentKind::Movie, "热门", 20, 0).await;
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[tokio::test]
    async fn test_empty_base_url_logs_out() {
        let client = ApiClient::new(&server("")).unwrap();
        client.logged_in.store(true, Ordering::Relaxed);
        client.check_login_status("").await.unwrap();
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = ApiClient::new(&server("http://127.0.0.1:1")).unwrap();
        let result = client.fetch_page(ContentKind::Tv, "综艺", 20, 0).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
