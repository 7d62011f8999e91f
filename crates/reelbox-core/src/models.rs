pub mod category;
pub mod content;
pub mod play_record;

pub use category::{Category, ContentKind};
pub use content::{CatalogItem, ContentItem, ContentPage, HistoryItem};
pub use play_record::PlayRecord;
