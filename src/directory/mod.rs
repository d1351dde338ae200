//! Live session directory
//!
//! The directory is the registry of every currently connected session.
//! Channel membership is never stored: the aggregator and stats computer
//! derive it on each query by scanning a point-in-time snapshot of the
//! directory, so there is no per-channel table to drift out of sync.
//!
//! [`SessionDirectory`] is the read/control interface the overlay consumes;
//! [`SessionRegistry`] is the in-memory implementation a host plugs its
//! connection layer into.

pub mod registry;

use std::sync::Arc;

use crate::session::{SessionControl, SessionId, SessionRecord};

pub use registry::SessionRegistry;

/// Read and control access to the live session set
///
/// Implementations are mutated continuously by the connection layer.
/// `sessions` must be a suspend-free, point-in-time iteration: a session
/// ending concurrently may or may not appear in a given snapshot, and no
/// cross-session atomicity is promised.
pub trait SessionDirectory: Send + Sync {
    /// Snapshot of all live sessions
    fn sessions(&self) -> Vec<Arc<SessionRecord>>;

    /// Look up a session by ID
    fn session(&self, id: SessionId) -> Option<Arc<SessionRecord>>;

    /// ID of the session currently publishing to `stream_path`, if any
    fn publisher_id(&self, stream_path: &str) -> Option<SessionId>;

    /// Control handle for a session
    fn control(&self, id: SessionId) -> Option<Arc<dyn SessionControl>>;
}
