use serde::Deserialize;

use reelbox_core::models::{CatalogItem, ContentItem, ContentKind, ContentPage};

/// Source label attached to catalog rows.
pub const CATALOG_SOURCE: &str = "douban";

/// Response from `/api/douban`.
#[derive(Debug, Deserialize)]
pub struct DoubanResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub list: Vec<DoubanItem>,
}

impl DoubanResponse {
    /// Validate every row. The page still reports how many rows were served.
    pub fn into_page(self, kind: ContentKind) -> ContentPage {
        let fetched = self.list.len();
        let items: Vec<ContentItem> = self
            .list
            .into_iter()
            .filter_map(|item| item.into_content_item(kind))
            .collect();
        if items.len() < fetched {
            tracing::debug!(rejected = fetched - items.len(), "Dropped untitled catalog rows");
        }
        ContentPage { items, fetched }
    }
}

#[derive(Debug, Deserialize)]
pub struct DoubanItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub rate: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl DoubanItem {
    /// Validate and convert. Rows without a title are dropped; a missing id
    /// falls back to the title.
    pub fn into_content_item(self, kind: ContentKind) -> Option<ContentItem> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        Some(ContentItem::catalog(
            kind,
            CatalogItem {
                id: self
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| title.clone()),
                source: CATALOG_SOURCE.to_string(),
                title,
                poster: self.poster.unwrap_or_default(),
                year: self.year.filter(|y| !y.is_empty()),
                rate: self.rate.filter(|r| !r.is_empty()),
            },
        ))
    }
}

/// Response from `/api/server-config`.
#[derive(Debug, Deserialize)]
pub struct ServerConfigResponse {
    #[serde(rename = "SiteName", default)]
    pub site_name: Option<String>,
    #[serde(rename = "StorageType", default)]
    pub storage_type: Option<String>,
}

impl ServerConfigResponse {
    /// Servers on browser-local storage have no accounts to log into.
    pub fn is_account_free(&self) -> bool {
        self.storage_type.as_deref() == Some("localstorage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_douban_response() {
        let json = r#"{
            "code": 200,
            "message": "获取成功",
            "list": [
                {
                    "id": "35267208",
                    "title": "繁花",
                    "poster": "https://img2.doubanio.com/view/photo/m_ratio_poster/public/p2903426495.jpg",
                    "rate": "8.7",
                    "year": "2023"
                },
                { "title": "", "poster": "x" },
                { "title": "漫长的季节", "rate": "" }
            ]
        }"#;

        let resp: DoubanResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.code, Some(200));
        assert_eq!(resp.list.len(), 3);

        let page = resp.into_page(ContentKind::Tv);
        assert_eq!(page.fetched, 3);
        let items = page.items;
        assert_eq!(items.len(), 2);

        let ContentItem::Series(first) = &items[0] else {
            panic!("expected a series row");
        };
        assert_eq!(first.id, "35267208");
        assert_eq!(first.source, "douban");
        assert_eq!(first.rate.as_deref(), Some("8.7"));
        assert_eq!(first.year.as_deref(), Some("2023"));

        let ContentItem::Series(second) = &items[1] else {
            panic!("expected a series row");
        };
        assert_eq!(second.id, "漫长的季节");
        assert!(second.poster.is_empty());
        assert!(second.rate.is_none());
    }

    #[test]
    fn test_page_of_untitled_rows_is_not_exhausted() {
        let resp: DoubanResponse =
            serde_json::from_str(r#"{"list":[{"title":""},{"title":"  "},{"poster":"p"}]}"#)
                .unwrap();
        let page = resp.into_page(ContentKind::Movie);
        assert!(page.items.is_empty());
        assert_eq!(page.fetched, 3);
        assert!(!page.is_exhausted());
    }

    #[test]
    fn test_deserialize_empty_page() {
        let resp: DoubanResponse = serde_json::from_str(r#"{"code":200,"list":[]}"#).unwrap();
        assert!(resp.list.is_empty());
        assert!(resp.message.is_none());
    }

    #[test]
    fn test_server_config_storage_type() {
        let local: ServerConfigResponse =
            serde_json::from_str(r#"{"SiteName":"MoonTV","StorageType":"localstorage"}"#).unwrap();
        assert!(local.is_account_free());

        let redis: ServerConfigResponse =
            serde_json::from_str(r#"{"SiteName":"MoonTV","StorageType":"redis"}"#).unwrap();
        assert!(!redis.is_account_free());
        assert_eq!(redis.site_name.as_deref(), Some("MoonTV"));
    }
}
