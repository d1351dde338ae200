//! Session control surface
//!
//! The transport layer exposes one control handle per session. The overlay
//! uses it to terminate sessions: `reject` for attempts turned away by the
//! gate, `stop` then `close` for the watchdog's two-phase shutdown.

use thiserror::Error;

/// Failure while stopping or closing a session's transport
///
/// These are logged and swallowed by callers that are tearing the session
/// down anyway; they never propagate.
#[derive(Debug, Clone, Error)]
pub enum ControlError {
    /// The underlying transport refused the operation
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Control handle for one live session
///
/// Implementations must make `stop` idempotent: the peer's own shutdown
/// path and the watchdog may both invoke it, and the second call has to be
/// a harmless no-op.
pub trait SessionControl: Send + Sync {
    /// Abort a session that has not fully started yet
    fn reject(&self);

    /// End an active session gracefully
    ///
    /// This must release the session's entry in the directory; closing the
    /// raw transport alone would leak it.
    fn stop(&self) -> Result<(), ControlError>;

    /// Tear down the raw transport
    fn close(&self) -> Result<(), ControlError>;
}
