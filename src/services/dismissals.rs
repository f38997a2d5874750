use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::warn;

use super::metrics::STORE_ERRORS_COUNTER;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt dismissal record {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Dismissal writer has shut down")]
    WriterClosed,

    #[error("Invalid client id '{0}'")]
    InvalidClient(String),
}

/// Persistence collaborator for the ids a client has already dismissed.
///
/// Writes are idempotent: adding an id that is already present is a no-op.
pub trait DismissalStore {
    fn read_dismissed(&self) -> Result<HashSet<String>, StoreError>;
    fn write_dismissed(&mut self, id: &str) -> Result<(), StoreError>;
}

impl<S: DismissalStore + ?Sized> DismissalStore for Box<S> {
    fn read_dismissed(&self) -> Result<HashSet<String>, StoreError> {
        (**self).read_dismissed()
    }

    fn write_dismissed(&mut self, id: &str) -> Result<(), StoreError> {
        (**self).write_dismissed(id)
    }
}

/// Client ids end up in file names and Redis keys: 1-64 ASCII letters, digits, `-` or `_`.
pub fn is_valid_client_id(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 64
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDismissalStore {
    ids: HashSet<String>,
}

impl MemoryDismissalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DismissalStore for MemoryDismissalStore {
    fn read_dismissed(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.ids.clone())
    }

    fn write_dismissed(&mut self, id: &str) -> Result<(), StoreError> {
        self.ids.insert(id.to_owned());
        Ok(())
    }
}

/// On-disk dismissal record of one client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DismissalRecord {
    pub client: String,
    /// Announcement id -> time it was first dismissed.
    pub items: BTreeMap<String, DateTime<Utc>>,
}

/// One JSON document per client under a directory, `<dir>/<client>.json`.
///
/// The record is read once when the store is opened and kept in memory.
/// Inside a tokio runtime each new dismissal is written back by a spawned
/// `tokio::fs` task; outside one (the CLI) the write happens in place.
#[derive(Debug)]
pub struct FileDismissalStore {
    path: PathBuf,
    record: Arc<Mutex<DismissalRecord>>,
    write_lock: Arc<tokio::sync::Mutex<()>>,
    pending: Option<JoinHandle<()>>,
}

impl FileDismissalStore {
    /// Opens the record with blocking I/O. A missing file is an empty record.
    pub fn open(dir: impl AsRef<Path>, client: &str) -> Result<Self, StoreError> {
        let path = record_path(dir.as_ref(), client)?;
        let raw = match std::fs::read(&path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let record = parse_record(&path, client, raw)?;
        Ok(Self::with_record(path, record))
    }

    /// Opens the record through `tokio::fs`.
    pub async fn load(dir: impl AsRef<Path>, client: &str) -> Result<Self, StoreError> {
        let path = record_path(dir.as_ref(), client)?;
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let record = parse_record(&path, client, raw)?;
        Ok(Self::with_record(path, record))
    }

    fn with_record(path: PathBuf, record: DismissalRecord) -> Self {
        Self {
            path,
            record: Arc::new(Mutex::new(record)),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
            pending: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> DismissalRecord {
        self.record.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Waits for the last spawned write to land on disk.
    pub async fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.await;
        }
    }
}

fn record_path(dir: &Path, client: &str) -> Result<PathBuf, StoreError> {
    if !is_valid_client_id(client) {
        return Err(StoreError::InvalidClient(client.to_owned()));
    }
    Ok(dir.join(format!("{client}.json")))
}

fn parse_record(path: &Path, client: &str, raw: Option<Vec<u8>>) -> Result<DismissalRecord, StoreError> {
    let Some(raw) = raw else {
        return Ok(DismissalRecord {
            client: client.to_owned(),
            items: BTreeMap::new(),
        });
    };
    serde_json::from_slice(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn encode_record(path: &Path, record: &Mutex<DismissalRecord>) -> Result<Vec<u8>, StoreError> {
    let record = record.lock().unwrap_or_else(PoisonError::into_inner);
    serde_json::to_vec_pretty(&*record).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// Both writers go through a temp file + rename so a crash never leaves a truncated record.

fn save_blocking(path: &Path, record: &Mutex<DismissalRecord>) -> Result<(), StoreError> {
    let body = encode_record(path, record)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_error(path))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body).map_err(io_error(path))?;
    std::fs::rename(&tmp, path).map_err(io_error(path))
}

async fn save(path: &Path, record: &Mutex<DismissalRecord>) -> Result<(), StoreError> {
    // Encoded at write time, so a late task still writes every id inserted so far
    let body = encode_record(path, record)?;
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(io_error(path))?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await.map_err(io_error(path))?;
    tokio::fs::rename(&tmp, path).await.map_err(io_error(path))
}

impl DismissalStore for FileDismissalStore {
    fn read_dismissed(&self) -> Result<HashSet<String>, StoreError> {
        let record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(record.items.keys().cloned().collect())
    }

    fn write_dismissed(&mut self, id: &str) -> Result<(), StoreError> {
        {
            let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
            if record.items.contains_key(id) {
                return Ok(());
            }
            record.items.insert(id.to_owned(), Utc::now());
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return save_blocking(&self.path, &self.record);
        };

        let path = self.path.clone();
        let record = self.record.clone();
        let write_lock = self.write_lock.clone();
        self.pending = Some(handle.spawn(async move {
            let _guard = write_lock.lock().await;
            if let Err(e) = save(&path, &record).await {
                warn!("Failed to persist dismissal record: {}", e);
                STORE_ERRORS_COUNTER.with_label_values(&["write"]).inc();
            }
        }));
        Ok(())
    }
}
