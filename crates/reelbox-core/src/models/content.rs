use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::ContentKind;
use super::play_record::PlayRecord;

/// A displayable row in a content list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    Movie(CatalogItem),
    Series(CatalogItem),
    History(HistoryItem),
}

/// A catalog entry from the remote provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub source: String,
    pub title: String,
    pub poster: String,
    pub year: Option<String>,
    pub rate: Option<String>,
}

/// A play-history entry with playback progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub source: String,
    pub title: String,
    pub poster: String,
    pub source_name: String,
    /// Fraction of the current episode played, 0.0–1.0.
    pub progress: f64,
    pub play_time_seconds: u64,
    pub last_played_at: DateTime<Utc>,
    pub episode_index: u32,
    pub total_episodes: u32,
}

/// One page from a paginated catalog.
///
/// `fetched` counts the rows the provider served, including rows rejected
/// during validation, so the next page starts at `offset + fetched`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPage {
    pub items: Vec<ContentItem>,
    pub fetched: usize,
}

impl ContentPage {
    /// The provider served no rows at all.
    pub fn is_exhausted(&self) -> bool {
        self.fetched == 0
    }
}

impl ContentItem {
    /// Wrap a catalog entry in the variant matching its category kind.
    pub fn catalog(kind: ContentKind, item: CatalogItem) -> Self {
        match kind {
            ContentKind::Movie => Self::Movie(item),
            ContentKind::Tv | ContentKind::Record => Self::Series(item),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Movie(c) | Self::Series(c) => &c.id,
            Self::History(h) => &h.id,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Movie(c) | Self::Series(c) => &c.source,
            Self::History(h) => &h.source,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Movie(c) | Self::Series(c) => &c.title,
            Self::History(h) => &h.title,
        }
    }

    pub fn poster(&self) -> &str {
        match self {
            Self::Movie(c) | Self::Series(c) => &c.poster,
            Self::History(h) => &h.poster,
        }
    }

    pub fn as_history(&self) -> Option<&HistoryItem> {
        match self {
            Self::History(h) => Some(h),
            _ => None,
        }
    }
}

impl HistoryItem {
    /// Build from a stored record keyed `"<source>+<id>"`.
    ///
    /// A key without `+` yields an empty source and the whole key as id.
    pub fn from_record(key: &str, record: &PlayRecord) -> Self {
        let (source, id) = key.split_once('+').unwrap_or(("", key));
        Self {
            id: id.to_string(),
            source: source.to_string(),
            title: record.title.clone(),
            poster: record.cover.clone(),
            source_name: record.source_name.clone(),
            progress: record.progress(),
            play_time_seconds: record.play_time,
            last_played_at: record.save_time,
            episode_index: record.index,
            total_episodes: record.total_episodes,
        }
    }
}
