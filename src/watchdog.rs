//! Connection liveness watchdog
//!
//! A raw RTMP socket gives no indication that its peer has silently gone
//! away, so every RTMP session gets a watchdog armed at connect time. When
//! the transport has been silent past the idle threshold the watchdog asks
//! the session to stop through its control handle, then forces the raw
//! transport closed. Both steps run even if the first fails; failures are
//! logged and swallowed since the session is being torn down regardless.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::session::{SessionControl, SessionRecord};

/// Default idle threshold before a session is considered dead
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(20);

/// Idle-timeout enforcement for transports without native keepalive
#[derive(Debug, Clone)]
pub struct IdleWatchdog {
    timeout: Duration,
}

impl IdleWatchdog {
    /// Create a watchdog with the default 20 second threshold
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    /// Create a watchdog with a custom threshold
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The configured idle threshold
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Arm the watchdog for one session
    ///
    /// Spawns a timer task that fires at most once, after the record's
    /// last-activity instant falls behind by the threshold. Dropping the
    /// returned guard disarms the timer.
    pub fn attach(
        &self,
        record: Arc<SessionRecord>,
        control: Arc<dyn SessionControl>,
    ) -> WatchdogGuard {
        let timeout = self.timeout;

        let handle = tokio::spawn(async move {
            loop {
                let idle = record.idle_for();
                if idle >= timeout {
                    fire(&record, &control, idle);
                    break;
                }
                // Sleep out the remainder; traffic in the meantime pushes
                // the deadline further on the next lap.
                tokio::time::sleep(timeout - idle).await;
            }
        });

        WatchdogGuard { handle }
    }
}

impl Default for IdleWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

/// Stop the session gracefully, then close the raw transport
fn fire(record: &SessionRecord, control: &Arc<dyn SessionControl>, idle: Duration) {
    tracing::warn!(
        session_id = record.id(),
        peer = %record.remote_addr(),
        idle_secs = idle.as_secs(),
        "session idle timeout"
    );

    if let Err(e) = control.stop() {
        tracing::warn!(session_id = record.id(), error = %e, "stop on idle timeout failed");
    }
    if let Err(e) = control.close() {
        tracing::warn!(session_id = record.id(), error = %e, "close on idle timeout failed");
    }
}

/// Handle that keeps a session's watchdog armed
///
/// Dropped (or explicitly disarmed) when the session ends on its own.
#[derive(Debug)]
pub struct WatchdogGuard {
    handle: JoinHandle<()>,
}

impl WatchdogGuard {
    /// Disarm the watchdog
    pub fn disarm(self) {
        self.handle.abort();
    }
}

impl Drop for WatchdogGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
