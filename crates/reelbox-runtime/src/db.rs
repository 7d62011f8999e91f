use std::collections::HashMap;
use std::path::Path;

use tokio::sync::{mpsc, oneshot};

use reelbox_core::error::ReelboxError;
use reelbox_core::history::HistoryProvider;
use reelbox_core::models::PlayRecord;
use reelbox_core::storage::PlayRecordStore;

/// Async handle to the play-history database.
///
/// The SQLite connection lives on a dedicated thread; calls are forwarded
/// over a channel and answered through oneshot replies.
#[derive(Clone)]
pub struct HistoryHandle {
    tx: mpsc::UnboundedSender<DbCommand>,
}

type Reply<T> = oneshot::Sender<Result<T, ReelboxError>>;

enum DbCommand {
    GetAll {
        reply: Reply<HashMap<String, PlayRecord>>,
    },
    Save {
        key: String,
        record: Box<PlayRecord>,
        reply: Reply<()>,
    },
    Remove {
        key: String,
        reply: Reply<()>,
    },
    Clear {
        reply: Reply<()>,
    },
}

impl HistoryHandle {
    pub fn open(path: &Path) -> Result<Self, ReelboxError> {
        Self::spawn(PlayRecordStore::open(path)?)
    }

    pub fn open_memory() -> Result<Self, ReelboxError> {
        Self::spawn(PlayRecordStore::open_memory()?)
    }

    fn spawn(store: PlayRecordStore) -> Result<Self, ReelboxError> {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("history-db".into())
            .spawn(move || actor_loop(store, rx))?;
        Ok(Self { tx })
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> DbCommand,
    ) -> Result<T, ReelboxError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(make(reply));
        rx.await
            .unwrap_or_else(|_| Err(ReelboxError::Config("history DB actor closed".into())))
    }

    pub async fn save(&self, key: &str, record: PlayRecord) -> Result<(), ReelboxError> {
        let key = key.to_string();
        self.request(|reply| DbCommand::Save {
            key,
            record: Box::new(record),
            reply,
        })
        .await
    }

    pub async fn remove(&self, key: &str) -> Result<(), ReelboxError> {
        let key = key.to_string();
        self.request(|reply| DbCommand::Remove { key, reply }).await
    }

    pub async fn clear(&self) -> Result<(), ReelboxError> {
        self.request(|reply| DbCommand::Clear { reply }).await
    }
}

impl HistoryProvider for HistoryHandle {
    async fn get_all(&self) -> Result<HashMap<String, PlayRecord>, ReelboxError> {
        self.request(|reply| DbCommand::GetAll { reply }).await
    }
}

fn actor_loop(store: PlayRecordStore, mut rx: mpsc::UnboundedReceiver<DbCommand>) {
    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            DbCommand::GetAll { reply } => {
                let _ = reply.send(store.get_all());
            }
            DbCommand::Save { key, record, reply } => {
                let _ = reply.send(store.save(&key, &record));
            }
            DbCommand::Remove { key, reply } => {
                let _ = reply.send(store.remove(&key));
            }
            DbCommand::Clear { reply } => {
                let _ = reply.send(store.clear());
            }
        }
    }
    tracing::debug!("History DB actor stopped");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn record(title: &str) -> PlayRecord {
        PlayRecord {
            title: title.into(),
            source_name: "量子资源".into(),
            cover: String::new(),
            index: 1,
            total_episodes: 10,
            play_time: 60,
            total_time: 600,
            save_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_handle_roundtrip() {
        let handle = HistoryHandle::open_memory().unwrap();
        handle.save("lzzy+1", record("一")).await.unwrap();
        handle.save("lzzy+2", record("二")).await.unwrap();

        let all = handle.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["lzzy+2"].title, "二");

        handle.remove("lzzy+1").await.unwrap();
        assert_eq!(handle.get_all().await.unwrap().len(), 1);

        handle.clear().await.unwrap();
        assert!(handle.get_all().await.unwrap().is_empty());
    }
}
