//! In-memory session registry
//!
//! Reference implementation of [`SessionDirectory`]. The host's connection
//! layer inserts a record and control handle when a connection is accepted
//! and removes them when it ends; readers only ever hold the lock long
//! enough to clone `Arc`s out.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::SessionDirectory;
use crate::session::{SessionControl, SessionId, SessionRecord};

struct Slot {
    record: Arc<SessionRecord>,
    control: Arc<dyn SessionControl>,
}

/// Thread-safe in-memory session directory
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Slot>>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and its control handle
    pub fn insert(&self, record: Arc<SessionRecord>, control: Arc<dyn SessionControl>) {
        let id = record.id();
        self.sessions.write().insert(id, Slot { record, control });

        tracing::debug!(session_id = id, "session registered");
    }

    /// Remove a session, returning its record if it was present
    pub fn remove(&self, id: SessionId) -> Option<Arc<SessionRecord>> {
        let slot = self.sessions.write().remove(&id);
        if slot.is_some() {
            tracing::debug!(session_id = id, "session removed");
        }
        slot.map(|slot| slot.record)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Check whether no sessions are live
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionDirectory for SessionRegistry {
    fn sessions(&self) -> Vec<Arc<SessionRecord>> {
        self.sessions
            .read()
            .values()
            .map(|slot| Arc::clone(&slot.record))
            .collect()
    }

    fn session(&self, id: SessionId) -> Option<Arc<SessionRecord>> {
        self.sessions
            .read()
            .get(&id)
            .map(|slot| Arc::clone(&slot.record))
    }

    fn publisher_id(&self, stream_path: &str) -> Option<SessionId> {
        self.sessions
            .read()
            .values()
            .find(|slot| {
                slot.record.is_publishing()
                    && slot.record.publish_path().as_deref() == Some(stream_path)
            })
            .map(|slot| slot.record.id())
    }

    fn control(&self, id: SessionId) -> Option<Arc<dyn SessionControl>> {
        self.sessions
            .read()
            .get(&id)
            .map(|slot| Arc::clone(&slot.control))
    }
}
