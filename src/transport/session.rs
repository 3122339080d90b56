// src/transport/session.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::mcp::protocol::Request;

/// Which transport generation minted a session. The two id-spaces never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Modern,
    Legacy,
}

impl Generation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Generation::Modern => "modern",
            Generation::Legacy => "legacy",
        }
    }
}

/// One logical client connection.
#[derive(Debug)]
pub struct Session<T> {
    pub id: String,
    pub generation: Generation,
    pub created_at: DateTime<Utc>,
    /// Cancelled exactly once, when the session is closed for any reason.
    pub cancel: CancellationToken,
    pub handle: T,
}

impl<T> Session<T> {
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Live state of a modern (streamable HTTP) session.
#[derive(Debug, Default)]
pub struct ModernHandle {
    /// Serializes dispatch so a session's requests are handled in arrival order.
    /// Tokio's mutex is fair, so waiters are woken FIFO.
    pub dispatch: Mutex<()>,
}

/// Live state of a legacy (HTTP+SSE) session.
#[derive(Debug)]
pub struct LegacyHandle {
    /// Envelopes accepted by `POST /message`, drained in order by the stream's worker.
    pub inbox: mpsc::UnboundedSender<Request>,
}

/// A concurrent map from session id to session for one generation.
#[derive(Debug)]
pub struct SessionMap<T> {
    generation: Generation,
    sessions: DashMap<String, Arc<Session<T>>>,
}

impl<T> SessionMap<T> {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            sessions: DashMap::new(),
        }
    }

    /// Mints a fresh id and registers the session under it in one step.
    pub fn create(&self, make: impl FnOnce(&str) -> T) -> Arc<Session<T>> {
        loop {
            let id = Uuid::new_v4().to_string();
            // A v4 collision is practically impossible but ids must never be reused.
            if let Entry::Vacant(slot) = self.sessions.entry(id.clone()) {
                let session = Arc::new(Session {
                    handle: make(&id),
                    id,
                    generation: self.generation,
                    created_at: Utc::now(),
                    cancel: CancellationToken::new(),
                });
                slot.insert(session.clone());
                debug!(generation = self.generation.as_str(), session_id = %session.id, "session registered");
                return session;
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session<T>>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Removes the entry and cancels its token. Returns `None` if it was already gone.
    pub fn remove(&self, id: &str) -> Option<Arc<Session<T>>> {
        let (_, session) = self.sessions.remove(id)?;
        session.cancel.cancel();
        debug!(
            generation = self.generation.as_str(),
            session_id = id,
            age_ms = (Utc::now() - session.created_at).num_milliseconds(),
            "session removed"
        );
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Closes every session. Returns how many were open.
    pub fn close_all(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.iter().filter(|id| self.remove(id).is_some()).count()
    }
}

/// Both session id-spaces, shared by the front door and the adapters.
#[derive(Debug)]
pub struct SessionRegistry {
    pub modern: SessionMap<ModernHandle>,
    pub legacy: SessionMap<LegacyHandle>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            modern: SessionMap::new(Generation::Modern),
            legacy: SessionMap::new(Generation::Legacy),
        }
    }

    pub fn modern_count(&self) -> usize {
        self.modern.len()
    }

    pub fn legacy_count(&self) -> usize {
        self.legacy.len()
    }

    pub fn total(&self) -> usize {
        self.modern_count() + self.legacy_count()
    }

    pub fn close_all(&self) -> usize {
        self.modern.close_all() + self.legacy.close_all()
    }
}
