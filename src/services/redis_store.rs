use std::{collections::HashSet, time::Duration};

use redis::{aio::MultiplexedConnection, ErrorKind, RedisError, RedisResult};
use tokio::{sync::mpsc, time::timeout};
use tracing::{debug, warn};

use super::{
    dismissals::{DismissalStore, StoreError},
    metrics::STORE_ERRORS_COUNTER,
};

const REDIS_TIMEOUT: Duration = Duration::from_secs(2);

/// One `SADD` queued for the background writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DismissalWrite {
    pub key: String,
    pub id: String,
}

pub type WriteQueue = mpsc::UnboundedSender<DismissalWrite>;

/// Spawns the task that applies queued dismissals to Redis, one `SADD` at a time.
/// Failures and timeouts are logged and counted; nothing waits on them.
pub fn spawn_writer(conn: MultiplexedConnection) -> WriteQueue {
    let (tx, mut rx) = mpsc::unbounded_channel::<DismissalWrite>();

    tokio::spawn(async move {
        while let Some(write) = rx.recv().await {
            let mut conn = conn.clone();
            let mut cmd = redis::cmd("SADD");
            cmd.arg(&write.key).arg(&write.id);
            let sadd = async {
                let added: RedisResult<i64> = cmd.query_async(&mut conn).await;
                added
            };

            match timeout(REDIS_TIMEOUT, sadd).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    warn!("Failed to persist dismissal of '{}' to {}: {}", write.id, write.key, e);
                    STORE_ERRORS_COUNTER.with_label_values(&["write"]).inc();
                }
                Err(_) => {
                    warn!("Timed out persisting dismissal of '{}' to {}", write.id, write.key);
                    STORE_ERRORS_COUNTER.with_label_values(&["write"]).inc();
                }
            }
        }
        debug!("Redis dismissal writer stopped");
    });

    tx
}

/// Redis set per client, cached in memory for the lifetime of the session.
///
/// Reads are served from the cache loaded at session start. Writes update the
/// cache and are queued for the background writer.
pub struct RedisDismissalStore {
    key: String,
    cached: HashSet<String>,
    writes: WriteQueue,
}

impl RedisDismissalStore {
    pub fn key_for(client: &str) -> String {
        format!("announcements:dismissed:{client}")
    }

    pub fn new(client: &str, cached: HashSet<String>, writes: WriteQueue) -> Self {
        Self {
            key: Self::key_for(client),
            cached,
            writes,
        }
    }

    /// Loads the client's set with `SMEMBERS`. A failed or slow read starts from an empty set.
    pub async fn load(mut conn: MultiplexedConnection, writes: WriteQueue, client: &str) -> Self {
        let key = Self::key_for(client);
        let smembers = async {
            let members: RedisResult<HashSet<String>> =
                redis::cmd("SMEMBERS").arg(&key).query_async(&mut conn).await;
            members
        };
        let members = timeout(REDIS_TIMEOUT, smembers)
            .await
            .unwrap_or_else(|_| Err(RedisError::from((ErrorKind::IoError, "SMEMBERS timed out"))));

        Self::new(client, seed_from(&key, members), writes)
    }
}

fn seed_from(key: &str, members: RedisResult<HashSet<String>>) -> HashSet<String> {
    match members {
        Ok(ids) => {
            debug!("Loaded {} dismissed announcement(s) from {}", ids.len(), key);
            ids
        }
        Err(e) => {
            warn!("Failed to load dismissals for {}: {}", key, e);
            STORE_ERRORS_COUNTER.with_label_values(&["read"]).inc();
            HashSet::new()
        }
    }
}

impl DismissalStore for RedisDismissalStore {
    fn read_dismissed(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.cached.clone())
    }

    fn write_dismissed(&mut self, id: &str) -> Result<(), StoreError> {
        self.cached.insert(id.to_owned());
        // SADD is idempotent, so repeats are queued as well
        self.writes
            .send(DismissalWrite {
                key: self.key.clone(),
                id: id.to_owned(),
            })
            .map_err(|_| StoreError::WriterClosed)
    }
}
