//! Local play-history seam.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::ReelboxError;
use crate::models::{ContentItem, HistoryItem, PlayRecord};

/// Read access to the local play history.
pub trait HistoryProvider: Send + Sync {
    /// Every stored record, keyed by `"<source>+<id>"`.
    fn get_all(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, PlayRecord>, ReelboxError>> + Send;
}

impl<T: HistoryProvider + ?Sized> HistoryProvider for Arc<T> {
    fn get_all(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, PlayRecord>, ReelboxError>> + Send {
        (**self).get_all()
    }
}

/// Map history records to content rows, most recently played first.
pub fn recent_items(records: &HashMap<String, PlayRecord>) -> Vec<ContentItem> {
    let mut items: Vec<HistoryItem> = records
        .iter()
        .map(|(key, record)| HistoryItem::from_record(key, record))
        .collect();
    items.sort_by(|a, b| b.last_played_at.cmp(&a.last_played_at));
    items.into_iter().map(ContentItem::History).collect()
}
