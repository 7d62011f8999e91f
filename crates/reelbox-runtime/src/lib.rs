mod db;
pub mod error;
pub mod store;

use std::path::Path;
use std::sync::Arc;

use reelbox_api::ApiClient;
use reelbox_core::config::AppConfig;

pub use db::HistoryHandle;
pub use error::{LoadError, RuntimeError};
pub use store::{CategoryStore, StoreState};

/// The store as wired against the live catalog server and local history.
pub type AppStore = CategoryStore<Arc<ApiClient>, Arc<ApiClient>, HistoryHandle>;

/// Owns the collaborators behind a [`CategoryStore`].
pub struct Runtime {
    config: AppConfig,
    client: Arc<ApiClient>,
    history: HistoryHandle,
    store: AppStore,
}

impl Runtime {
    /// Load the user config and open the history database in the data dir.
    pub fn new() -> Result<Self, RuntimeError> {
        let config = AppConfig::load().map_err(|e| RuntimeError::Config(e.to_string()))?;
        let db_path =
            AppConfig::ensure_db_path().map_err(|e| RuntimeError::Config(e.to_string()))?;
        Self::open(config, &db_path)
    }

    pub fn open(config: AppConfig, db_path: &Path) -> Result<Self, RuntimeError> {
        let history =
            HistoryHandle::open(db_path).map_err(|e| RuntimeError::Database(e.to_string()))?;
        Self::with_history(config, history)
    }

    pub fn with_history(config: AppConfig, history: HistoryHandle) -> Result<Self, RuntimeError> {
        let client = Arc::new(
            ApiClient::new(&config.server).map_err(|e| RuntimeError::Api(e.to_string()))?,
        );
        let store = CategoryStore::new(&config, client.clone(), client.clone(), history.clone());
        tracing::debug!(
            categories = config.categories.len(),
            server = %config.server.api_base_url,
            "Runtime ready"
        );
        Ok(Self {
            config,
            client,
            history,
            store,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryHandle {
        &self.history
    }

    /// Point both the client and the store at a different server.
    pub fn set_api_base_url(&mut self, url: &str) {
        self.config.server.api_base_url = url.to_string();
        self.client.set_base_url(url);
        self.store.set_api_base_url(url);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use reelbox_core::models::{Category, ContentKind, PlayRecord};

    use super::*;
    use crate::error::message;

    fn runtime() -> Runtime {
        let history = HistoryHandle::open_memory().unwrap();
        Runtime::with_history(AppConfig::default(), history).unwrap()
    }

    #[tokio::test]
    async fn test_unconfigured_server_reports_missing_url() {
        let rt = runtime();
        rt.store()
            .select_category(Category::new("综艺", ContentKind::Tv).with_tag("综艺"))
            .await;

        let state = rt.store().state();
        assert_eq!(state.error.as_deref(), Some(message::API_URL_NOT_SET));
        assert!(!state.loading);
        assert!(state.content.is_empty());
    }

    #[tokio::test]
    async fn test_history_hidden_without_session() {
        let rt = runtime();
        rt.history()
            .save(
                "lzzy+1",
                PlayRecord {
                    title: "一".into(),
                    source_name: "量子资源".into(),
                    cover: String::new(),
                    index: 1,
                    total_episodes: 1,
                    play_time: 1,
                    total_time: 2,
                    save_time: Utc::now(),
                },
            )
            .await
            .unwrap();

        rt.store().refresh_play_records().await;
        let state = rt.store().state();
        assert!(!state.categories.iter().any(Category::is_record));
        assert_eq!(state.error.as_deref(), Some(message::API_URL_NOT_SET));
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let rt = Runtime::open(AppConfig::default(), &dir.path().join("reelbox.db")).unwrap();
        assert_eq!(rt.config().categories.len(), 6);
    }

    #[test]
    fn test_set_api_base_url() {
        let mut rt = runtime();
        rt.set_api_base_url("http://10.0.0.2:3000");
        assert_eq!(rt.client.base_url(), "http://10.0.0.2:3000");
        assert_eq!(rt.config().server.api_base_url, "http://10.0.0.2:3000");
    }
}
