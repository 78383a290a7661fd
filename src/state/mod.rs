//! Session state layer
//!
//! Each session sits behind its own async mutex, so turns within a session
//! are serialized while different sessions proceed independently.
//! Currently in-memory only.

use crate::disambiguation::SessionState;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub id: String,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: SessionState::Idle,
            created_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

pub type SessionHandle = Arc<Mutex<ConversationSession>>;

/// Trait for session storage
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a fresh session, replacing any previous one with the same id.
    async fn open(&self, session_id: &str) -> Result<SessionHandle>;
    async fn get(&self, session_id: &str) -> Result<Option<SessionHandle>>;
    /// Returns whether a session was removed.
    async fn close(&self, session_id: &str) -> Result<bool>;
    /// Removes sessions idle for longer than `max_idle`; returns their ids.
    async fn evict_idle(&self, max_idle: Duration) -> Result<Vec<String>>;
    async fn len(&self) -> usize;

    async fn get_or_open(&self, session_id: &str) -> Result<SessionHandle> {
        match self.get(session_id).await? {
            Some(handle) => Ok(handle),
            None => self.open(session_id).await,
        }
    }

    /// Locks the live session for `session_id`, opening one if needed, and
    /// marks it active. A session removed between lookup and locking is
    /// looked up again, so the caller never writes into a discarded handle.
    async fn acquire(&self, session_id: &str) -> Result<OwnedMutexGuard<ConversationSession>> {
        loop {
            let handle = self.get_or_open(session_id).await?;
            let mut session = handle.clone().lock_owned().await;

            match self.get(session_id).await? {
                Some(current) if Arc::ptr_eq(&current, &handle) => {
                    session.touch();
                    return Ok(session);
                }
                _ => debug!(session_id, "Session removed before it was locked, retrying"),
            }
        }
    }
}

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn open(&self, session_id: &str) -> Result<SessionHandle> {
        let handle = Arc::new(Mutex::new(ConversationSession::new(session_id)));
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), handle.clone());
        Ok(handle)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionHandle>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned())
    }

    async fn close(&self, session_id: &str) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(session_id).is_some())
    }

    async fn evict_idle(&self, max_idle: Duration) -> Result<Vec<String>> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let mut evicted = Vec::new();

        for (id, handle) in sessions.iter() {
            // A locked session is mid-turn, so it is not idle.
            if let Ok(session) = handle.try_lock() {
                let idle = (now - session.last_active).to_std().unwrap_or_default();
                if idle > max_idle {
                    evicted.push(id.clone());
                }
            }
        }

        for id in &evicted {
            sessions.remove(id);
        }

        if !evicted.is_empty() {
            info!(count = evicted.len(), "Evicted idle sessions");
        }
        Ok(evicted)
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
