use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::DestinationDetails;

use super::{ApplicationState, Matcher, PreferenceCollector};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("Session {0} not found. Please start a new session.")]
    NotFound(Uuid),

    #[error("No active matcher in this session. Please restart the session.")]
    MissingMatcher,
}

/// Everything owned by one user's session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub state: ApplicationState,
    pub matcher: Option<Matcher>,
    pub collector: PreferenceCollector,
    pub details: Option<DestinationDetails>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_active: now,
            state: ApplicationState::new(),
            matcher: None,
            collector: PreferenceCollector::new(),
            details: None,
        }
    }

    /// Discards all flow data but keeps the session identity
    pub fn reset(&mut self) {
        self.state.reset();
        self.matcher = None;
        self.collector.restart();
        self.details = None;
    }

    pub fn matcher(&self) -> Result<&Matcher, SessionError> {
        self.matcher.as_ref().ok_or(SessionError::MissingMatcher)
    }

    pub fn matcher_mut(&mut self) -> Result<&mut Matcher, SessionError> {
        self.matcher.as_mut().ok_or(SessionError::MissingMatcher)
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to one session; the mutex keeps one step in flight at a time
pub type SessionHandle = Arc<Mutex<Session>>;

/// In-memory registry of live sessions
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh session and returns a snapshot of it
    pub async fn create(&self) -> Session {
        let session = Session::new();
        let snapshot = session.clone();

        self.sessions
            .write()
            .await
            .insert(session.id, Arc::new(Mutex::new(session)));

        tracing::info!(session_id = %snapshot.id, "Session created");
        snapshot
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drops sessions idle for longer than `max_idle`
    ///
    /// Sessions with a step in flight are busy by definition and are kept.
    pub async fn purge_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.last_active >= cutoff,
            Err(_) => true,
        });

        let purged = before - sessions.len();
        if purged > 0 {
            tracing::info!(purged, remaining = sessions.len(), "Purged idle sessions");
        }
        purged
    }
}
