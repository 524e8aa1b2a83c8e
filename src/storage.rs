use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;
use tokio::sync::{mpsc, oneshot};

pub const BAG_STORAGE_KEY: &str = "bag-storage";
pub const ORDER_STORAGE_KEY: &str = "order-storage";
pub const AUTH_STORAGE_KEY: &str = "auth-storage";

/// String-keyed store of JSON blobs, one blob per store.
pub trait KvStore: Send + Sync + 'static {
    type Error: std::fmt::Display + Send;

    fn get_item(&self, key: &str) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;
    fn set_item(&self, key: &str, value: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
    fn remove_item(&self, key: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[derive(Clone)]
pub struct SqliteKv {
    db: SqlitePool,
}

impl SqliteKv {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

impl KvStore for SqliteKv {
    type Error = sqlx::Error;

    async fn get_item(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// In-process store used by tests.
#[derive(Clone, Default)]
pub struct MemoryKv {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }
}

impl KvStore for MemoryKv {
    type Error = std::convert::Infallible;

    async fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.snapshot(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), Self::Error> {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
        Ok(())
    }
}

enum Write {
    Set { key: &'static str, value: String },
    Flush(oneshot::Sender<()>),
}

/// Write-through queue in front of a [`KvStore`].
///
/// Stores enqueue a full snapshot after every mutation and return without
/// waiting. A single writer task applies the queue in order, so the last
/// snapshot enqueued is the one left on disk.
#[derive(Clone)]
pub struct Persister {
    tx: mpsc::UnboundedSender<Write>,
}

impl Persister {
    /// Must be called from within a tokio runtime.
    pub fn spawn<K: KvStore>(kv: K) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Write>();

        tokio::spawn(async move {
            while let Some(write) = rx.recv().await {
                match write {
                    Write::Set { key, value } => {
                        if let Err(e) = kv.set_item(key, &value).await {
                            tracing::error!("Failed to persist {key}: {e}");
                        }
                    }
                    Write::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("persister queue closed");
        });

        Self { tx }
    }

    pub fn set(&self, key: &'static str, value: String) {
        if self.tx.send(Write::Set { key, value }).is_err() {
            tracing::warn!("persister stopped, dropping write to {key}");
        }
    }

    /// Wait until every write queued before this call has been applied.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Write::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

/// Read and decode a persisted blob. A missing or unreadable blob yields
/// the default state.
pub async fn hydrate<K, T>(kv: &K, key: &str) -> Result<T, K::Error>
where
    K: KvStore,
    T: serde::de::DeserializeOwned + Default,
{
    let Some(raw) = kv.get_item(key).await? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(state) => Ok(state),
        Err(e) => {
            tracing::warn!("Discarding unreadable {key} blob: {e}");
            Ok(T::default())
        }
    }
}
