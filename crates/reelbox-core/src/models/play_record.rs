use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A locally stored playback position for one title.
///
/// Records are keyed externally by `"<source>+<id>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub title: String,
    pub source_name: String,
    pub cover: String,
    /// Episode currently being watched (1-based).
    pub index: u32,
    pub total_episodes: u32,
    /// Seconds played into the current episode.
    pub play_time: u64,
    /// Length of the current episode in seconds.
    pub total_time: u64,
    pub save_time: DateTime<Utc>,
}

impl PlayRecord {
    /// Played fraction of the current episode. Zero when the length is unknown.
    pub fn progress(&self) -> f64 {
        if self.total_time == 0 {
            0.0
        } else {
            self.play_time as f64 / self.total_time as f64
        }
    }
}
