use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::clock::SharedClock;
use crate::storage::KvStore;

pub const LEASE_KEY: &str = "writer-lease";

/// A lease whose heartbeat is older than this is considered abandoned.
pub const LEASE_TTL_SECS: i64 = 30;

fn lease_ttl() -> Duration {
    Duration::seconds(LEASE_TTL_SECS)
}

pub const HEARTBEAT_EVERY: std::time::Duration = std::time::Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaseRecord {
    holder: String,
    heartbeat_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum LeaseError<E> {
    /// Another live process owns the stores.
    Held {
        holder: String,
        heartbeat_at: DateTime<Utc>,
    },
    Store(E),
}

impl<E: fmt::Display> fmt::Display for LeaseError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeaseError::Held { holder, heartbeat_at } => write!(
                f,
                "stores are in use by {holder} (last heartbeat {}); stop it and retry",
                heartbeat_at.to_rfc3339()
            ),
            LeaseError::Store(e) => write!(f, "lease storage error: {e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for LeaseError<E> {}

/// Exclusive right to load and write the store blobs.
///
/// Every store keeps its state in memory and writes whole blobs, so two
/// processes loaded from the same `KvStore` would overwrite each other.
/// The server holds the lease for its lifetime and renews it on a timer;
/// the CLI takes it for the length of one command.
pub struct WriterLease<K: KvStore> {
    kv: K,
    holder: String,
    clock: SharedClock,
}

impl<K: KvStore> WriterLease<K> {
    pub async fn acquire(kv: K, holder: impl Into<String>, clock: SharedClock) -> Result<Self, LeaseError<K::Error>> {
        let holder = holder.into();
        let now = clock.now();

        if let Some(current) = read_record(&kv).await.map_err(LeaseError::Store)? {
            let live = now - current.heartbeat_at < lease_ttl();
            if live && current.holder != holder {
                tracing::warn!(holder = %current.holder, "writer lease held by another process");
                return Err(LeaseError::Held {
                    holder: current.holder,
                    heartbeat_at: current.heartbeat_at,
                });
            }
            if !live {
                tracing::info!(stale = %current.holder, "taking over abandoned writer lease");
            }
        }

        let lease = Self { kv, holder, clock };
        lease.renew().await.map_err(LeaseError::Store)?;
        tracing::info!(holder = %lease.holder, "writer lease acquired");
        Ok(lease)
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub async fn renew(&self) -> Result<(), K::Error> {
        let record = LeaseRecord {
            holder: self.holder.clone(),
            heartbeat_at: self.clock.now(),
        };
        match serde_json::to_string(&record) {
            Ok(json) => self.kv.set_item(LEASE_KEY, &json).await,
            Err(e) => {
                tracing::error!("Failed to serialize writer lease: {e}");
                Ok(())
            }
        }
    }

    /// Drop the lease if it is still ours.
    pub async fn release(self) -> Result<(), K::Error> {
        let current = read_record(&self.kv).await?;
        if current.is_some_and(|r| r.holder == self.holder) {
            self.kv.remove_item(LEASE_KEY).await?;
            tracing::info!(holder = %self.holder, "writer lease released");
        }
        Ok(())
    }
}

impl<K: KvStore + Clone> WriterLease<K> {
    /// Renew the lease every [`HEARTBEAT_EVERY`] until the handle is aborted.
    pub fn spawn_heartbeat(&self) -> JoinHandle<()> {
        let lease = WriterLease {
            kv: self.kv.clone(),
            holder: self.holder.clone(),
            clock: self.clock.clone(),
        };
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HEARTBEAT_EVERY);
            loop {
                ticker.tick().await;
                if let Err(e) = lease.renew().await {
                    tracing::error!("Failed to renew writer lease: {e}");
                }
            }
        })
    }
}

async fn read_record<K: KvStore>(kv: &K) -> Result<Option<LeaseRecord>, K::Error> {
    let Some(raw) = kv.get_item(LEASE_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable writer lease: {e}");
            Ok(None)
        }
    }
}
