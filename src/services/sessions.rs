use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use redis::aio::MultiplexedConnection;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::models::announcement::Announcement;

use super::{
    dismissals::{DismissalStore, FileDismissalStore, MemoryDismissalStore},
    metrics::SESSIONS_GAUGE,
    redis_store::{spawn_writer, RedisDismissalStore, WriteQueue},
    selector::AnnouncementSelector,
};

pub type DynStore = Box<dyn DismissalStore + Send>;
pub type Session = Arc<Mutex<AnnouncementSelector<DynStore>>>;

/// Where per-client dismissal records live.
#[derive(Clone)]
pub enum DismissalBackend {
    Memory,
    File(PathBuf),
    Redis {
        conn: MultiplexedConnection,
        writes: WriteQueue,
    },
}

impl DismissalBackend {
    /// Redis backend with its background writer. Must be called inside a tokio runtime.
    pub fn redis(conn: MultiplexedConnection) -> Self {
        let writes = spawn_writer(conn.clone());
        DismissalBackend::Redis { conn, writes }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DismissalBackend::Memory => "memory",
            DismissalBackend::File(_) => "file",
            DismissalBackend::Redis { .. } => "redis",
        }
    }
}

/// Bounds on the live session table.
///
/// Evicted sessions are rebuilt from their store on the next request, so
/// with the `memory` backend an evicted client starts over, as after a restart.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_ttl: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 10_000,
            idle_ttl: Duration::from_secs(30 * 60),
        }
    }
}

struct Slot {
    session: Session,
    last_seen: Instant,
}

struct Inner {
    announcements: Option<Vec<Announcement>>,
    sessions: HashMap<String, Slot>,
}

/// One announcement selector per client id, created on first use.
///
/// The table lock is only held for lookups and inserts. Each selector has its
/// own lock, so events for one client are applied one at a time without
/// blocking other clients. Store loading happens before either lock is taken.
pub struct SessionRegistry {
    backend: DismissalBackend,
    limits: SessionLimits,
    inner: Mutex<Inner>,
    reconfigure: Mutex<()>,
}

impl SessionRegistry {
    pub fn new(backend: DismissalBackend, announcements: Option<Vec<Announcement>>) -> Self {
        Self::with_limits(backend, announcements, SessionLimits::default())
    }

    pub fn with_limits(
        backend: DismissalBackend,
        announcements: Option<Vec<Announcement>>,
        limits: SessionLimits,
    ) -> Self {
        Self {
            backend,
            limits,
            inner: Mutex::new(Inner {
                announcements,
                sessions: HashMap::new(),
            }),
            reconfigure: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &DismissalBackend {
        &self.backend
    }

    pub async fn current(&self, client: &str) -> Option<Announcement> {
        let session = self.session(client).await;
        let selector = lock(&session);
        selector.current().cloned()
    }

    pub async fn dismiss(&self, client: &str) -> Option<Announcement> {
        let session = self.session(client).await;
        let mut selector = lock(&session);
        selector.on_dismiss().cloned()
    }

    pub fn announcements(&self) -> Vec<Announcement> {
        self.table().announcements.clone().unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.table().sessions.len()
    }

    /// Replaces the configured list and reselects for every live session.
    /// Returns the number of sessions updated.
    pub fn set_announcements(&self, announcements: Option<Vec<Announcement>>) -> usize {
        let _reconfigure = lock(&self.reconfigure);
        let announcements = announcements.filter(|list| !list.is_empty());

        let sessions: Vec<Session> = {
            let mut inner = self.table();
            inner.announcements = announcements.clone();
            inner.sessions.values().map(|slot| slot.session.clone()).collect()
        };

        for session in &sessions {
            lock(session).on_configuration_changed(announcements.clone());
        }
        info!(
            "Announcements updated ({} configured), {} session(s) reselected",
            announcements.as_ref().map_or(0, Vec::len),
            sessions.len()
        );
        sessions.len()
    }

    /// Drops sessions idle for longer than the configured TTL. Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let mut inner = self.table();
        let evicted = evict_idle(&mut inner, Instant::now(), self.limits.idle_ttl);
        SESSIONS_GAUGE.set(inner.sessions.len() as i64);
        evicted
    }

    async fn session(&self, client: &str) -> Session {
        if let Some(session) = self.touch(client) {
            return session;
        }

        let store = self.open_store(client).await;

        let mut inner = self.table();
        let now = Instant::now();
        if let Some(slot) = inner.sessions.get_mut(client) {
            // another request opened it while the store was loading
            slot.last_seen = now;
            return slot.session.clone();
        }

        evict_idle(&mut inner, now, self.limits.idle_ttl);
        while inner.sessions.len() >= self.limits.max_sessions.max(1) {
            let Some(oldest) = inner
                .sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_seen)
                .map(|(client, _)| client.clone())
            else {
                break;
            };
            debug!("Evicting least recently used session {}", oldest);
            inner.sessions.remove(&oldest);
        }

        let selector = AnnouncementSelector::with_announcements(store, inner.announcements.clone());
        let session = Arc::new(Mutex::new(selector));
        inner.sessions.insert(
            client.to_owned(),
            Slot {
                session: session.clone(),
                last_seen: now,
            },
        );
        SESSIONS_GAUGE.set(inner.sessions.len() as i64);
        session
    }

    fn touch(&self, client: &str) -> Option<Session> {
        let mut inner = self.table();
        let slot = inner.sessions.get_mut(client)?;
        slot.last_seen = Instant::now();
        Some(slot.session.clone())
    }

    async fn open_store(&self, client: &str) -> DynStore {
        match &self.backend {
            DismissalBackend::Memory => Box::new(MemoryDismissalStore::new()),
            DismissalBackend::File(dir) => match FileDismissalStore::load(dir, client).await {
                Ok(store) => Box::new(store),
                Err(e) => {
                    warn!("Falling back to in-memory dismissals for {}: {}", client, e);
                    Box::new(MemoryDismissalStore::new())
                }
            },
            DismissalBackend::Redis { conn, writes } => Box::new(
                RedisDismissalStore::load(conn.clone(), writes.clone(), client).await,
            ),
        }
    }

    fn table(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn evict_idle(inner: &mut Inner, now: Instant, idle_ttl: Duration) -> usize {
    let before = inner.sessions.len();
    inner
        .sessions
        .retain(|_, slot| now.duration_since(slot.last_seen) < idle_ttl);
    before - inner.sessions.len()
}

/// Spawns a loop that evicts idle sessions every `every`. Stops once the registry is dropped.
pub fn spawn_sweeper(registry: &Arc<SessionRegistry>, every: Duration) {
    let registry: Weak<SessionRegistry> = Arc::downgrade(registry);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(every).await;
            let Some(registry) = registry.upgrade() else {
                break;
            };
            let evicted = registry.evict_idle();
            if evicted > 0 {
                info!("Evicted {} idle session(s)", evicted);
            }
        }
    });
}
