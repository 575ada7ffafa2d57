//! Session registry
//!
//! Maps session ids to live [`Session`]s. The map itself sits behind a
//! short-lived `std::sync::Mutex` that is never held across an await; each
//! session carries its own async mutex that serialises turns on it.

use crate::error::{KimiError, Result};
use crate::storage::{validate_session_id, TranscriptBackend, TranscriptStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, MutexGuard as AsyncMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Registry tuning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionRegistryConfig {
    /// Maximum live sessions held in memory; `None` is unbounded
    pub max_sessions: Option<usize>,
}

impl From<&crate::config::SessionsConfig> for SessionRegistryConfig {
    fn from(config: &crate::config::SessionsConfig) -> Self {
        Self {
            max_sessions: config.max_sessions,
        }
    }
}

/// A live session: one transcript plus the lock that guards it
#[derive(Debug)]
pub struct Session {
    id: String,
    store: tokio::sync::Mutex<TranscriptStore>,
    closed: AtomicBool,
}

impl Session {
    fn new(store: TranscriptStore) -> Self {
        Self {
            id: store.session_id().to_string(),
            store: tokio::sync::Mutex::new(store),
            closed: AtomicBool::new(false),
        }
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the session has been deleted
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Acquire exclusive access to the transcript
    ///
    /// Waits for any turn already running on this session.
    ///
    /// # Errors
    ///
    /// Returns `KimiError::SessionClosed` if the session was deleted while
    /// this handle was held
    pub async fn lock(&self) -> Result<AsyncMutexGuard<'_, TranscriptStore>> {
        let guard = self.store.lock().await;
        if self.is_closed() {
            return Err(KimiError::SessionClosed(self.id.clone()).into());
        }
        Ok(guard)
    }
}

enum Slot {
    Live {
        session: Arc<Session>,
        last_access: u64,
    },
    /// A delete is erasing a transcript that had no live session; the
    /// sender side is dropped once the erase is over
    Erasing(watch::Receiver<()>),
}

enum Lookup {
    Live(Arc<Session>),
    Erasing(watch::Receiver<()>),
    Missing,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, Slot>,
    clock: u64,
    /// Bumped whenever a delete starts; loads that straddle one are discarded
    deletions: u64,
}

impl Entries {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn lookup(&mut self, session_id: &str) -> Lookup {
        let clock = self.tick();
        let lookup = match self.map.get_mut(session_id) {
            Some(Slot::Live {
                session,
                last_access,
            }) => {
                if session.is_closed() {
                    Lookup::Missing
                } else {
                    *last_access = clock;
                    Lookup::Live(Arc::clone(session))
                }
            }
            Some(Slot::Erasing(done)) => Lookup::Erasing(done.clone()),
            None => return Lookup::Missing,
        };

        // A closed session has already had its transcript cleared
        if matches!(lookup, Lookup::Missing) {
            self.map.remove(session_id);
        }
        lookup
    }

    fn live_count(&self) -> usize {
        self.map
            .values()
            .filter(|slot| matches!(slot, Slot::Live { session, .. } if !session.is_closed()))
            .count()
    }

    /// Least recently used entry that nobody outside the registry holds
    fn eviction_candidate(&self, keep: &str) -> Option<String> {
        self.map
            .iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Live {
                    session,
                    last_access,
                } if id.as_str() != keep && Arc::strong_count(session) == 1 => {
                    Some((id, *last_access))
                }
                _ => None,
            })
            .min_by_key(|(_, last_access)| *last_access)
            .map(|(id, _)| id.clone())
    }
}

fn lock_entries(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    // A panic while holding the map lock cannot leave the map half-updated
    entries.lock().unwrap_or_else(|e| e.into_inner())
}

/// Keeps the erasing marker for a session in place until dropped
struct ErasingMarker<'a> {
    entries: &'a Mutex<Entries>,
    session_id: &'a str,
    _done: watch::Sender<()>,
}

impl Drop for ErasingMarker<'_> {
    fn drop(&mut self) {
        let mut entries = lock_entries(self.entries);
        if matches!(entries.map.get(self.session_id), Some(Slot::Erasing(_))) {
            entries.map.remove(self.session_id);
        }
    }
}

enum DeleteTarget {
    Live(Arc<Session>),
    Wait(watch::Receiver<()>),
    Persisted(watch::Sender<()>),
}

/// Owner of all live sessions
///
/// # Examples
///
/// ```
/// use kimi_agent::agent::{SessionRegistry, SessionRegistryConfig};
/// use kimi_agent::storage::InMemoryBackend;
/// use std::sync::Arc;
///
/// # async fn example() -> kimi_agent::error::Result<()> {
/// let registry = SessionRegistry::new(Arc::new(InMemoryBackend), SessionRegistryConfig::default());
/// let session = registry.get("demo").await?;
/// assert_eq!(session.id(), "demo");
/// assert!(registry.contains("demo"));
/// # Ok(())
/// # }
/// ```
pub struct SessionRegistry {
    backend: Arc<dyn TranscriptBackend>,
    config: SessionRegistryConfig,
    entries: Mutex<Entries>,
}

impl SessionRegistry {
    /// Create an empty registry over `backend`
    pub fn new(backend: Arc<dyn TranscriptBackend>, config: SessionRegistryConfig) -> Self {
        Self {
            backend,
            config,
            entries: Mutex::new(Entries::default()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        lock_entries(&self.entries)
    }

    /// Backend the sessions persist to
    pub fn backend(&self) -> &Arc<dyn TranscriptBackend> {
        &self.backend
    }

    /// Return the live session for `session_id`, loading or creating it
    ///
    /// Two callers racing on the first access may both load from the
    /// backend; only one session is kept and both receive it. A load that
    /// overlaps a delete is thrown away and retried, so a deleted
    /// transcript never comes back.
    ///
    /// # Errors
    ///
    /// Returns error if the id is invalid or the backend load fails
    pub async fn get(&self, session_id: &str) -> Result<Arc<Session>> {
        validate_session_id(session_id)?;

        loop {
            let observed = {
                let mut entries = self.entries();
                match entries.lookup(session_id) {
                    Lookup::Live(session) => return Ok(session),
                    Lookup::Erasing(done) => Err(done),
                    Lookup::Missing => Ok(entries.deletions),
                }
            };
            let epoch = match observed {
                Ok(epoch) => epoch,
                Err(mut done) => {
                    debug!(session_id, "Waiting for delete to finish");
                    // Resolves with an error once the deleting side is gone
                    let _ = done.changed().await;
                    continue;
                }
            };

            let store = TranscriptStore::open(session_id, Arc::clone(&self.backend)).await?;
            let loaded = store.count();

            let mut entries = self.entries();
            if entries.deletions != epoch {
                debug!(session_id, "Delete overlapped load, reloading");
                continue;
            }

            let existing = match entries.map.get(session_id) {
                Some(Slot::Live { session, .. }) if !session.is_closed() => {
                    Some(Arc::clone(session))
                }
                _ => None,
            };
            if let Some(session) = existing {
                return Ok(session);
            }

            let session = Arc::new(Session::new(store));
            let last_access = entries.tick();
            entries.map.insert(
                session_id.to_string(),
                Slot::Live {
                    session: Arc::clone(&session),
                    last_access,
                },
            );
            info!(session_id, messages = loaded, "Session opened");
            self.evict_over_capacity(&mut entries, session_id);

            return Ok(session);
        }
    }

    fn evict_over_capacity(&self, entries: &mut Entries, keep: &str) {
        let Some(max) = self.config.max_sessions else {
            return;
        };

        while entries.live_count() > max {
            let Some(victim) = entries.eviction_candidate(keep) else {
                debug!(
                    live = entries.live_count(),
                    max, "All sessions busy, deferring eviction"
                );
                break;
            };
            entries.map.remove(&victim);
            if self.backend.is_durable() {
                debug!(session_id = %victim, "Evicted idle session from memory");
            } else {
                warn!(
                    session_id = %victim,
                    "Evicted idle session; its history is not persisted and is lost"
                );
            }
        }
    }

    /// Delete a session and its persisted transcript
    ///
    /// Returns `true` if a live session or a persisted transcript existed.
    /// Handles still held elsewhere are closed and refuse further turns.
    /// A live session stays registered until its transcript is cleared, so
    /// concurrent `get` calls never reload the old history.
    ///
    /// # Errors
    ///
    /// Returns error if the id is invalid or the backend erase fails
    pub async fn delete(&self, session_id: &str) -> Result<bool> {
        validate_session_id(session_id)?;

        let existed = loop {
            let target = {
                let mut entries = self.entries();
                entries.deletions += 1;
                let target = match entries.map.get(session_id) {
                    Some(Slot::Live { session, .. }) => {
                        Some(DeleteTarget::Live(Arc::clone(session)))
                    }
                    Some(Slot::Erasing(done)) => Some(DeleteTarget::Wait(done.clone())),
                    None => None,
                };
                target.unwrap_or_else(|| {
                    let (done, waiting) = watch::channel(());
                    entries
                        .map
                        .insert(session_id.to_string(), Slot::Erasing(waiting));
                    DeleteTarget::Persisted(done)
                })
            };

            match target {
                DeleteTarget::Live(session) => break self.close_live(session_id, session).await?,
                DeleteTarget::Wait(mut done) => {
                    let _ = done.changed().await;
                }
                DeleteTarget::Persisted(done) => {
                    let _marker = ErasingMarker {
                        entries: &self.entries,
                        session_id,
                        _done: done,
                    };
                    break self.backend.erase(session_id).await?;
                }
            }
        };

        if existed {
            info!(session_id, "Session deleted");
        } else {
            debug!(session_id, "Delete requested for unknown session");
        }
        Ok(existed)
    }

    async fn close_live(&self, session_id: &str, session: Arc<Session>) -> Result<bool> {
        let existed = {
            let mut store = session.store.lock().await;
            if session.is_closed() {
                false
            } else {
                store.clear().await?;
                session.closed.store(true, Ordering::Release);
                true
            }
        };

        let mut entries = self.entries();
        let current = matches!(
            entries.map.get(session_id),
            Some(Slot::Live { session: live, .. }) if Arc::ptr_eq(live, &session)
        );
        if current {
            entries.map.remove(session_id);
        }
        Ok(existed)
    }

    /// Generate a fresh session id
    pub fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.entries().live_count()
    }

    /// Whether no session is live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `session_id` is live
    pub fn contains(&self, session_id: &str) -> bool {
        matches!(
            self.entries().map.get(session_id),
            Some(Slot::Live { session, .. }) if !session.is_closed()
        )
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("backend", &self.backend.describe())
            .field("config", &self.config)
            .field("live", &self.len())
            .finish()
    }
}
